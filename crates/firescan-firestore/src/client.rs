//! Firestore REST HTTP client.

use reqwest::header::AUTHORIZATION;
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, instrument, trace};
use url::Url;

use firescan_core::Result;
use firescan_core::error::{Error, InvalidInputError, QueryError, TransportError};

use crate::auth::TokenProvider;
use crate::endpoints::ErrorResponse;

/// Map a reqwest error onto the store error taxonomy.
pub(crate) fn map_reqwest(err: reqwest::Error) -> Error {
    if err.is_decode() {
        Error::decode(err)
    } else if err.is_timeout() {
        Error::Transport(TransportError::Timeout)
    } else if err.is_connect() {
        Error::Transport(TransportError::Connection {
            message: err.to_string(),
        })
    } else {
        Error::Transport(TransportError::Http {
            message: err.to_string(),
        })
    }
}

/// Build the shared HTTP client.
pub(crate) fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("firescan/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(map_reqwest)
}

/// HTTP client for one Firestore database.
#[derive(Debug)]
pub struct FirestoreClient {
    http: reqwest::Client,
    endpoint: Url,
    project_id: String,
    database_id: String,
    tokens: TokenProvider,
}

impl FirestoreClient {
    /// Create a client for `projects/<project_id>/databases/<database_id>`
    /// served at `endpoint`.
    pub fn new(
        http: reqwest::Client,
        endpoint: &str,
        project_id: impl Into<String>,
        database_id: impl Into<String>,
        tokens: TokenProvider,
    ) -> Result<Self> {
        let endpoint = Url::parse(endpoint).map_err(|e| InvalidInputError::Other {
            message: format!("invalid Firestore endpoint '{}': {}", endpoint, e),
        })?;

        if endpoint.cannot_be_a_base() {
            return Err(InvalidInputError::Other {
                message: format!("Firestore endpoint '{}' must be an absolute URL", endpoint),
            }
            .into());
        }

        Ok(Self {
            http,
            endpoint,
            project_id: project_id.into(),
            database_id: database_id.into(),
            tokens,
        })
    }

    /// Returns the endpoint this client talks to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Returns the database resource name.
    pub fn database_name(&self) -> String {
        format!("projects/{}/databases/{}", self.project_id, self.database_id)
    }

    /// URL of `method` invoked on a parent resource.
    ///
    /// `parent_document` is `None` for top-level collections, otherwise the
    /// document path that owns the subcollection.
    pub fn method_url(&self, parent_document: Option<&str>, method: &str) -> Url {
        let mut segments: Vec<&str> = vec![
            "v1",
            "projects",
            self.project_id.as_str(),
            "databases",
            self.database_id.as_str(),
        ];
        let mut parent: Vec<&str> = vec!["documents"];
        if let Some(doc) = parent_document {
            parent.extend(doc.split('/'));
        }
        let last = parent.pop().unwrap_or("documents");
        segments.extend(parent);
        let last = format!("{}:{}", last, method);

        let mut url = self.endpoint.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            path.extend(segments);
            path.push(&last);
        }
        url
    }

    /// POST a JSON body and decode the JSON response.
    #[instrument(skip(self, body), fields(url = %url))]
    pub async fn post<B, R>(&self, url: Url, body: &B) -> Result<R>
    where
        B: Serialize + std::fmt::Debug,
        R: DeserializeOwned,
    {
        debug!("Firestore request");
        trace!(?body, "request body");

        let mut request = self.http.post(url).json(body);
        if let Some(token) = self.tokens.token().await? {
            request = request.header(AUTHORIZATION, format!("Bearer {}", token.as_str()));
        }

        let response = request.send().await.map_err(map_reqwest)?;
        self.handle_response(response).await
    }

    /// Handle a response, parsing the body or error.
    async fn handle_response<R: DeserializeOwned>(&self, response: reqwest::Response) -> Result<R> {
        let status = response.status();
        trace!(status = %status, "Firestore response");

        if status.is_success() {
            response.json::<R>().await.map_err(map_reqwest)
        } else {
            Err(Error::Query(self.parse_error_response(response).await))
        }
    }

    /// Parse a Google API error response.
    async fn parse_error_response(&self, response: reqwest::Response) -> QueryError {
        let status = response.status().as_u16();

        match response.json::<ErrorResponse>().await {
            Ok(body) => QueryError::new(status, body.error.status, body.error.message),
            Err(_) => QueryError::new(status, None, None),
        }
    }
}
