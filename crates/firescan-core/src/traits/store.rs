//! Document store trait.

use async_trait::async_trait;

use crate::Result;
use crate::document::{Document, DocumentRecord};
use crate::types::CollectionPath;

/// A read-only source of documents grouped into collections.
///
/// Implementations are shared across concurrent requests and must be safe
/// to call from many tasks at once.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short human-readable description of where documents come from.
    fn describe(&self) -> String;

    /// Count the documents in a collection.
    async fn count(&self, collection: &CollectionPath) -> Result<u64>;

    /// Fetch up to `limit` documents ordered by `timestamp` descending,
    /// skipping the first `offset`.
    async fn fetch(
        &self,
        collection: &CollectionPath,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Document>>;

    /// Fetch a slice of documents prepared for display.
    async fn fetch_records(
        &self,
        collection: &CollectionPath,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<DocumentRecord>> {
        let docs = self.fetch(collection, offset, limit).await?;
        Ok(docs.into_iter().map(DocumentRecord::from).collect())
    }
}
