//! Firestore-backed document store.

use async_trait::async_trait;
use tracing::{debug, instrument};

use firescan_core::error::{Error, InvalidInputError};
use firescan_core::{CollectionPath, Document, DocumentStore, Result};

use crate::auth::{Credentials, METADATA_HOST, TokenProvider};
use crate::client::{FirestoreClient, http_client};
use crate::endpoints::*;
use crate::value::fields_to_json;

/// Production Firestore endpoint.
const FIRESTORE_ENDPOINT: &str = "https://firestore.googleapis.com";

/// Name of the database every project starts with.
pub const DEFAULT_DATABASE: &str = "(default)";

/// A document store backed by the Firestore REST API.
#[derive(Debug)]
pub struct FirestoreStore {
    client: FirestoreClient,
}

impl FirestoreStore {
    /// Start configuring a store for `project_id`.
    pub fn builder(project_id: impl Into<String>) -> FirestoreStoreBuilder {
        FirestoreStoreBuilder::new(project_id)
    }

    fn bounded(name: &str, value: usize) -> Result<i32> {
        i32::try_from(value).map_err(|_| {
            Error::InvalidInput(InvalidInputError::Other {
                message: format!("{} {} exceeds the query limit", name, value),
            })
        })
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    fn describe(&self) -> String {
        format!(
            "Firestore {} at {}",
            self.client.database_name(),
            self.client.endpoint()
        )
    }

    #[instrument(skip(self))]
    async fn count(&self, collection: &CollectionPath) -> Result<u64> {
        debug!("Counting documents via Firestore");

        let request = RunAggregationQueryRequest {
            structured_aggregation_query: StructuredAggregationQuery {
                structured_query: StructuredQuery::collection(collection.collection_id()),
                aggregations: vec![Aggregation {
                    alias: COUNT_ALIAS,
                    count: CountAggregation {},
                }],
            },
        };

        let url = self
            .client
            .method_url(collection.parent_document(), RUN_AGGREGATION_QUERY);
        let items: Vec<RunAggregationQueryResponseItem> = self.client.post(url, &request).await?;

        let value = items
            .iter()
            .filter_map(|item| item.result.as_ref())
            .find_map(|result| result.aggregate_fields.get(COUNT_ALIAS))
            .ok_or_else(|| Error::decode("count field missing from aggregation result"))?;

        let count = value
            .as_integer()
            .ok_or_else(|| Error::decode(format!("unexpected type for count: {:?}", value)))?;

        u64::try_from(count).map_err(|_| Error::decode(format!("negative count: {}", count)))
    }

    #[instrument(skip(self))]
    async fn fetch(
        &self,
        collection: &CollectionPath,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Document>> {
        debug!("Fetching documents via Firestore");

        let mut query = StructuredQuery::collection(collection.collection_id());
        query.order_by.push(Order {
            field: FieldReference {
                field_path: TIMESTAMP_FIELD,
            },
            direction: Direction::Descending,
        });
        query.offset = Some(Self::bounded("offset", offset)?);
        query.limit = Some(Self::bounded("limit", limit)?);

        let request = RunQueryRequest {
            structured_query: query,
        };

        let url = self
            .client
            .method_url(collection.parent_document(), RUN_QUERY);
        let items: Vec<RunQueryResponseItem> = self.client.post(url, &request).await?;

        let docs = items
            .into_iter()
            .filter_map(|item| item.document)
            .map(|resource| -> Result<Document> {
                let fields = fields_to_json(&resource.fields)?;
                let doc = Document::new(resource.id(), fields);
                Ok(
                    match resource
                        .fields
                        .get(TIMESTAMP_FIELD)
                        .and_then(|v| v.as_timestamp())
                    {
                        Some(ts) => doc.with_timestamp(ts),
                        None => doc,
                    },
                )
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(returned = docs.len(), "Fetched documents");
        Ok(docs)
    }
}

/// Builder for [`FirestoreStore`].
///
/// With no further configuration the store authenticates through the GCE
/// metadata server against the production endpoint.
#[derive(Debug)]
pub struct FirestoreStoreBuilder {
    project_id: String,
    database_id: String,
    endpoint: Option<String>,
    credentials: Option<Credentials>,
    metadata_host: Option<String>,
    anonymous: bool,
}

impl FirestoreStoreBuilder {
    fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            database_id: DEFAULT_DATABASE.to_string(),
            endpoint: None,
            credentials: None,
            metadata_host: None,
            anonymous: false,
        }
    }

    /// Select a named database instead of `(default)`.
    pub fn database(mut self, database_id: impl Into<String>) -> Self {
        self.database_id = database_id.into();
        self
    }

    /// Override the API endpoint (scheme, host and port).
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Talk to a local emulator at `host:port` without authentication.
    pub fn emulator(self, host: &str) -> Self {
        self.endpoint(format!("http://{}", host)).anonymous()
    }

    /// Send no authorization header.
    pub fn anonymous(mut self) -> Self {
        self.anonymous = true;
        self
    }

    /// Authenticate with a parsed credentials file.
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Override the metadata server host.
    pub fn metadata_host(mut self, host: impl Into<String>) -> Self {
        self.metadata_host = Some(host.into());
        self
    }

    /// Build the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created, the endpoint
    /// is not a URL, or a service account key cannot be parsed.
    pub fn build(self) -> Result<FirestoreStore> {
        let http = http_client()?;

        let tokens = if self.anonymous {
            TokenProvider::anonymous(http.clone())
        } else if let Some(credentials) = self.credentials {
            TokenProvider::from_credentials(credentials, http.clone())?
        } else {
            let host = self.metadata_host.as_deref().unwrap_or(METADATA_HOST);
            TokenProvider::metadata_server(host, http.clone())
        };

        let endpoint = self.endpoint.as_deref().unwrap_or(FIRESTORE_ENDPOINT);
        let client = FirestoreClient::new(http, endpoint, self.project_id, self.database_id, tokens)?;

        Ok(FirestoreStore { client })
    }
}
