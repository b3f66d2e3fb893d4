//! Document and collection records handed from stores to the viewer.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Count reported for a collection whose count query failed.
pub const UNKNOWN_COUNT: i64 = -1;

/// A document as returned by a store, with its fields decoded to plain JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// The document ID (last segment of its path).
    pub id: String,

    /// The document fields.
    pub fields: Map<String, Value>,

    /// The `timestamp` field, when it holds a timestamp.
    pub timestamp: Option<DateTime<Utc>>,
}

impl Document {
    /// Create a document without a timestamp.
    pub fn new(id: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            fields,
            timestamp: None,
        }
    }

    /// Attach the timestamp used for ordering and display.
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Render the fields as pretty-printed JSON with sorted keys.
    pub fn pretty_json(&self) -> String {
        serde_json::to_string_pretty(&self.fields).unwrap_or_else(|e| format!("<error: {}>", e))
    }
}

/// A document prepared for display.
///
/// This is also the shape of each entry in the batch payload embedded in
/// the collection page: `{"id": ..., "json": ..., "timestamp": ...}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Source document ID.
    pub id: String,

    /// Pretty-printed JSON body.
    pub json: String,

    /// ISO-8601 timestamp in UTC, or empty when the document has none.
    pub timestamp: String,
}

impl From<Document> for DocumentRecord {
    fn from(doc: Document) -> Self {
        let json = doc.pretty_json();
        let timestamp = doc
            .timestamp
            .map(|ts| ts.to_rfc3339_opts(SecondsFormat::Secs, true))
            .unwrap_or_default();

        Self {
            id: doc.id,
            json,
            timestamp,
        }
    }
}

/// A configured collection and its document count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionSummary {
    /// Collection name as configured.
    pub name: String,

    /// Number of documents, or [`UNKNOWN_COUNT`].
    pub count: i64,
}

impl CollectionSummary {
    /// A summary with a known count.
    pub fn new(name: impl Into<String>, count: i64) -> Self {
        Self {
            name: name.into(),
            count,
        }
    }

    /// A summary whose count could not be determined.
    pub fn unknown(name: impl Into<String>) -> Self {
        Self::new(name, UNKNOWN_COUNT)
    }

    /// Returns true if the count is known.
    pub fn is_known(&self) -> bool {
        self.count >= 0
    }
}
