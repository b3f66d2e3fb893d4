//! Filesystem storage for the file-backed document store.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use firescan_core::error::{Error, QueryError, TransportError};
use firescan_core::{CollectionPath, Document, DocumentStore, Result};

/// Field used to order documents.
const TIMESTAMP_FIELD: &str = "timestamp";

fn map_io(err: std::io::Error) -> Error {
    Error::Transport(TransportError::Io(err))
}

/// Filesystem-backed document store rooted at a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Create a new file store at the given root directory.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Get the root directory path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the directory holding a collection's documents.
    fn collection_dir(&self, collection: &CollectionPath) -> PathBuf {
        collection
            .segments()
            .fold(self.root.clone(), |dir, segment| dir.join(segment))
    }

    /// List the document files of a collection, sorted by file name.
    async fn document_files(&self, collection: &CollectionPath) -> Result<Vec<PathBuf>> {
        let dir = self.collection_dir(collection);

        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(QueryError::not_found(format!("collection '{}'", collection)).into());
            }
            Err(e) => return Err(map_io(e)),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(map_io)? {
            let path = entry.path();
            let is_json = path.extension().is_some_and(|ext| ext == "json");
            if is_json && entry.file_type().await.map_err(map_io)?.is_file() {
                files.push(path);
            }
        }

        files.sort();
        Ok(files)
    }

    /// Read and parse one document file.
    async fn read_document(&self, path: &Path) -> Result<Document> {
        let id = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();

        let content = tokio::fs::read_to_string(path).await.map_err(map_io)?;
        let fields: Map<String, Value> = match serde_json::from_str(&content) {
            Ok(Value::Object(map)) => map,
            Ok(_) => {
                return Err(Error::decode(format!(
                    "{}: document is not a JSON object",
                    path.display()
                )));
            }
            Err(e) => return Err(Error::decode(format!("{}: {}", path.display(), e))),
        };

        let timestamp = fields
            .get(TIMESTAMP_FIELD)
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|ts| ts.with_timezone(&Utc));

        let doc = Document::new(id, fields);
        Ok(match timestamp {
            Some(ts) => doc.with_timestamp(ts),
            None => doc,
        })
    }
}

/// Newest first; documents whose `timestamp` is not a timestamp sort last.
fn by_timestamp_desc(a: &Document, b: &Document) -> Ordering {
    match (&a.timestamp, &b.timestamp) {
        (Some(x), Some(y)) => y.cmp(x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.id.cmp(&b.id))
}

#[async_trait]
impl DocumentStore for FileStore {
    fn describe(&self) -> String {
        format!("local directory {}", self.root.display())
    }

    #[instrument(skip(self), fields(root = %self.root.display()))]
    async fn count(&self, collection: &CollectionPath) -> Result<u64> {
        let files = self.document_files(collection).await?;
        debug!(count = files.len(), "Counted local documents");
        Ok(files.len() as u64)
    }

    #[instrument(skip(self), fields(root = %self.root.display()))]
    async fn fetch(
        &self,
        collection: &CollectionPath,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Document>> {
        let files = self.document_files(collection).await?;

        let mut docs = Vec::with_capacity(files.len());
        for path in &files {
            let doc = self.read_document(path).await?;
            // Like an ordered query, skip documents without the field.
            if doc.fields.contains_key(TIMESTAMP_FIELD) {
                docs.push(doc);
            }
        }

        docs.sort_by(by_timestamp_desc);

        let page: Vec<Document> = docs.into_iter().skip(offset).take(limit).collect();
        debug!(returned = page.len(), "Fetched local documents");
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write_doc(root: &Path, collection: &str, id: &str, value: Value) {
        let dir = root.join(collection);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(format!("{}.json", id)), value.to_string()).unwrap();
    }

    fn seed(root: &Path) {
        write_doc(root, "logs", "a", json!({"timestamp": "2024-01-01T00:00:00Z", "n": 1}));
        write_doc(root, "logs", "b", json!({"timestamp": "2024-03-01T00:00:00Z", "n": 2}));
        write_doc(root, "logs", "c", json!({"timestamp": "2024-02-01T00:00:00Z", "n": 3}));
        write_doc(root, "logs", "d", json!({"n": 4}));
        write_doc(root, "logs", "e", json!({"timestamp": 17, "n": 5}));
    }

    #[tokio::test]
    async fn count_includes_every_document() {
        let temp = tempfile::tempdir().unwrap();
        seed(temp.path());
        let store = FileStore::new(temp.path());

        let logs = CollectionPath::new("logs").unwrap();
        assert_eq!(store.count(&logs).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn fetch_orders_newest_first() {
        let temp = tempfile::tempdir().unwrap();
        seed(temp.path());
        let store = FileStore::new(temp.path());
        let logs = CollectionPath::new("logs").unwrap();

        let docs = store.fetch(&logs, 0, 10).await.unwrap();
        let ids: Vec<_> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a", "e"]);
        assert!(docs[3].timestamp.is_none());
    }

    #[tokio::test]
    async fn fetch_applies_offset_and_limit() {
        let temp = tempfile::tempdir().unwrap();
        seed(temp.path());
        let store = FileStore::new(temp.path());
        let logs = CollectionPath::new("logs").unwrap();

        let docs = store.fetch(&logs, 1, 2).await.unwrap();
        let ids: Vec<_> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a"]);

        assert!(store.fetch(&logs, 10, 2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn fetch_records_formats_timestamps() {
        let temp = tempfile::tempdir().unwrap();
        seed(temp.path());
        let store = FileStore::new(temp.path());
        let logs = CollectionPath::new("logs").unwrap();

        let records = store.fetch_records(&logs, 0, 1).await.unwrap();
        assert_eq!(records[0].id, "b");
        assert_eq!(records[0].timestamp, "2024-03-01T00:00:00Z");
        assert!(records[0].json.contains("\"n\": 2"));
    }

    #[tokio::test]
    async fn subcollections_follow_the_path() {
        let temp = tempfile::tempdir().unwrap();
        write_doc(
            temp.path(),
            "users/alice/posts",
            "p1",
            json!({"timestamp": "2024-01-01T00:00:00Z"}),
        );
        let store = FileStore::new(temp.path());
        let posts = CollectionPath::new("users/alice/posts").unwrap();

        assert_eq!(store.count(&posts).await.unwrap(), 1);
        assert_eq!(store.fetch(&posts, 0, 5).await.unwrap()[0].id, "p1");
    }

    #[tokio::test]
    async fn missing_collection_is_not_found() {
        let temp = tempfile::tempdir().unwrap();
        let store = FileStore::new(temp.path());
        let missing = CollectionPath::new("nope").unwrap();

        let err = store.count(&missing).await.unwrap_err();
        match err {
            Error::Query(q) => assert_eq!(q.status, 404),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn malformed_document_fails_fetch() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("broken");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("x.json"), "{not json").unwrap();
        let store = FileStore::new(temp.path());
        let broken = CollectionPath::new("broken").unwrap();

        assert!(matches!(
            store.fetch(&broken, 0, 5).await,
            Err(Error::Decode { .. })
        ));
    }
}
