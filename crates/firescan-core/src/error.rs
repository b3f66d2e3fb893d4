//! Error types for FireScan document stores.
//!
//! A single error type covers every way a count or fetch can fail, with
//! explicit variants for transport, authentication, backend rejections,
//! undecodable responses and invalid input.

use std::fmt;
use thiserror::Error;

/// The unified error type for document store operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Network or filesystem transport errors.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Authentication errors (unreadable key file, rejected token exchange).
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// The backend rejected the query.
    #[error("query error: {0}")]
    Query(#[from] QueryError),

    /// Input validation errors (invalid collection path).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),

    /// The backend answered with something we could not interpret.
    #[error("decode error: {message}")]
    Decode { message: String },
}

impl Error {
    /// Create a decode error from any displayable message.
    pub fn decode(message: impl fmt::Display) -> Self {
        Error::Decode {
            message: message.to_string(),
        }
    }
}

/// Transport-level errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out")]
    Timeout,

    /// Generic HTTP error.
    #[error("HTTP error: {message}")]
    Http { message: String },

    /// Local IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Authentication-related errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The credentials file could not be read or understood.
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    /// The token endpoint refused to issue an access token.
    #[error("token request failed with HTTP {status}: {message}")]
    TokenRejected { status: u16, message: String },
}

/// A query rejected by the backend.
#[derive(Debug)]
pub struct QueryError {
    /// HTTP status code.
    pub status: u16,
    /// Backend status code (e.g. `NOT_FOUND`), if present.
    pub code: Option<String>,
    /// Error message from the backend.
    pub message: Option<String>,
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.status)?;
        if let Some(ref code) = self.code {
            write!(f, " [{}]", code)?;
        }
        if let Some(ref message) = self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

impl std::error::Error for QueryError {}

impl QueryError {
    /// Create a new query error.
    pub fn new(status: u16, code: Option<String>, message: Option<String>) -> Self {
        Self {
            status,
            code,
            message,
        }
    }

    /// Create a not-found error for a collection.
    pub fn not_found(what: impl fmt::Display) -> Self {
        Self::new(
            404,
            Some("NOT_FOUND".to_string()),
            Some(format!("{} not found", what)),
        )
    }

    /// Check if the backend refused the caller's credentials.
    pub fn is_auth_error(&self) -> bool {
        self.status == 401
            || self.status == 403
            || self.code.as_deref() == Some("UNAUTHENTICATED")
            || self.code.as_deref() == Some("PERMISSION_DENIED")
    }
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// Invalid collection path.
    #[error("invalid collection path '{value}': {reason}")]
    CollectionPath { value: String, reason: String },

    /// Generic invalid input.
    #[error("invalid input: {message}")]
    Other { message: String },
}
