//! firescan-core - Core types and traits for the FireScan document viewer.

pub mod document;
pub mod error;
pub mod paging;
pub mod traits;
pub mod types;

pub use document::{CollectionSummary, Document, DocumentRecord};
pub use error::Error;
pub use paging::{BatchWindow, PageView};
pub use traits::DocumentStore;
pub use types::CollectionPath;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
