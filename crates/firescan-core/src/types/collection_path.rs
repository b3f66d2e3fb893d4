//! Collection path type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, InvalidInputError};

/// Maximum length of a single path segment, in bytes.
const MAX_SEGMENT_BYTES: usize = 1500;

/// A validated collection path.
///
/// A top-level collection is a single segment (`users`). Subcollections are
/// addressed through their parent document: `users/alice/posts`. A valid
/// path therefore always has an odd number of segments.
///
/// # Example
///
/// ```
/// use firescan_core::CollectionPath;
///
/// let path = CollectionPath::new("users/alice/posts").unwrap();
/// assert_eq!(path.collection_id(), "posts");
/// assert_eq!(path.parent_document(), Some("users/alice"));
///
/// assert!(CollectionPath::new("users/alice").is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CollectionPath(String);

impl CollectionPath {
    /// Create a new collection path from a string, validating the format.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is empty, points at a document, or has
    /// a segment the backend would refuse.
    pub fn new(s: impl AsRef<str>) -> Result<Self, Error> {
        let s = s.as_ref();
        Self::validate(s)?;
        Ok(Self(s.to_string()))
    }

    /// Returns the path as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the path segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    /// Returns the final segment, the collection ID proper.
    pub fn collection_id(&self) -> &str {
        match self.0.rsplit_once('/') {
            Some((_, id)) => id,
            None => &self.0,
        }
    }

    /// Returns the path of the parent document for subcollections.
    pub fn parent_document(&self) -> Option<&str> {
        self.0.rsplit_once('/').map(|(parent, _)| parent)
    }

    fn validate(s: &str) -> Result<(), Error> {
        let invalid = |reason: &str| -> Error {
            InvalidInputError::CollectionPath {
                value: s.to_string(),
                reason: reason.to_string(),
            }
            .into()
        };

        if s.is_empty() {
            return Err(invalid("must not be empty"));
        }

        let mut count = 0usize;
        for segment in s.split('/') {
            count += 1;
            if segment.is_empty() {
                return Err(invalid("segments must not be empty"));
            }
            if segment == "." || segment == ".." {
                return Err(invalid("segments must not be '.' or '..'"));
            }
            if segment.len() >= 4 && segment.starts_with("__") && segment.ends_with("__") {
                return Err(invalid("segments of the form __name__ are reserved"));
            }
            if segment.len() > MAX_SEGMENT_BYTES {
                return Err(invalid("segment exceeds 1500 bytes"));
            }
        }

        if count % 2 == 0 {
            return Err(invalid("must name a collection, not a document"));
        }

        Ok(())
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CollectionPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for CollectionPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for CollectionPath {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for CollectionPath {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        CollectionPath::new(&s).map_err(serde::de::Error::custom)
    }
}
