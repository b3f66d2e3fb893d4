//! HTTP handlers for the index and collection pages.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::{debug, error, warn};

use firescan_core::{BatchWindow, CollectionPath, CollectionSummary, Error, PageView};

use crate::render::{COLLECTION_TEMPLATE, INDEX_TEMPLATE, TEMPLATE_FAILURE_BODY, script_safe_json};
use crate::state::AppState;

/// Version string shown in page footers.
pub const VERSION: &str = env!("FIRESCAN_VERSION");

#[derive(Debug, Serialize)]
struct IndexPage<'a> {
    project_id: &'a str,
    source: String,
    version: &'static str,
    collections: Vec<CollectionSummary>,
}

#[derive(Debug, Serialize)]
struct CollectionPage<'a> {
    project_id: &'a str,
    source: String,
    version: &'static str,
    batch_size: usize,
    #[serde(flatten)]
    view: &'a PageView,
    /// The batch as script-safe JSON.
    docs_json: String,
}

/// Query string of the collection page.
#[derive(Debug, Default)]
pub struct PageQuery {
    page: Option<String>,
}

impl PageQuery {
    /// Build from decoded query pairs. Only the first `page` counts.
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        Self {
            page: pairs
                .iter()
                .find(|(key, _)| key == "page")
                .map(|(_, value)| value.clone()),
        }
    }

    /// The requested record number; anything but a positive integer means 1.
    pub fn record(&self) -> usize {
        self.page
            .as_deref()
            .and_then(|p| p.trim().parse::<usize>().ok())
            .filter(|&n| n > 0)
            .unwrap_or(1)
    }
}

/// `GET /`: configured collections with their document counts.
pub async fn index(State(state): State<Arc<AppState>>) -> Response {
    let mut collections = Vec::with_capacity(state.config.collections.len());

    for collection in &state.config.collections {
        let summary = match state.store.count(collection).await {
            Ok(count) => CollectionSummary::new(collection.as_str(), count_as_i64(count)),
            Err(e) => {
                warn!(collection = %collection, error = %e, "Count failed");
                CollectionSummary::unknown(collection.as_str())
            }
        };
        collections.push(summary);
    }

    debug!(
        collections = collections.len(),
        unknown = collections.iter().filter(|c| !c.is_known()).count(),
        "Index page"
    );

    let page = IndexPage {
        project_id: &state.config.project_id,
        source: state.store.describe(),
        version: VERSION,
        collections,
    };
    state.renderer.page(INDEX_TEMPLATE, &page)
}

/// `GET /collection/{*name}`: one record of a collection plus its batch.
pub async fn collection(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let name = name.trim_matches('/');
    if name.is_empty() {
        return to_index().await;
    }

    let collection = match CollectionPath::new(name) {
        Ok(collection) => collection,
        Err(e) => {
            debug!(error = %e, "Rejected collection path");
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    };

    let record = PageQuery::from_pairs(&pairs).record();

    let total = match state.store.count(&collection).await {
        Ok(total) => total,
        Err(e) => {
            if credentials_rejected(&e) {
                warn!(collection = %collection, error = %e, "Count refused, check the configured credentials");
            } else {
                warn!(collection = %collection, error = %e, "Count failed, assuming empty");
            }
            0
        }
    };

    let window = BatchWindow::for_record(record, state.config.batch_size);
    let docs = match state
        .store
        .fetch_records(&collection, window.offset, window.limit)
        .await
    {
        Ok(docs) => docs,
        Err(e) => {
            if credentials_rejected(&e) {
                error!(collection = %collection, error = %e, "Fetch refused, check the configured credentials");
            } else {
                error!(collection = %collection, error = %e, "Fetch failed");
            }
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("error fetching documents: {}", e),
            )
                .into_response();
        }
    };

    let view = PageView::new(collection.as_str(), record, total, window, docs);
    debug!(
        record,
        total,
        offset = window.offset,
        fetched = view.docs.len(),
        found = view.current.is_some(),
        "Collection page"
    );

    let docs_json = match script_safe_json(&view.docs) {
        Ok(json) => json,
        Err(e) => {
            error!(error = %e, "Encoding batch failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, TEMPLATE_FAILURE_BODY).into_response();
        }
    };

    let page = CollectionPage {
        project_id: &state.config.project_id,
        source: state.store.describe(),
        version: VERSION,
        batch_size: state.config.batch_size,
        view: &view,
        docs_json,
    };
    state.renderer.page(COLLECTION_TEMPLATE, &page)
}

/// `/collection` without a name: 302 back to the index.
pub async fn to_index() -> Response {
    (StatusCode::FOUND, [(header::LOCATION, "/")]).into_response()
}

/// Anything unrouted.
pub async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "404 page not found")
}

fn credentials_rejected(e: &Error) -> bool {
    matches!(e, Error::Query(q) if q.is_auth_error())
}

fn count_as_i64(count: u64) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}
