//! Router construction.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the viewer's router over shared state.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/collection", get(handlers::to_index))
        .route("/collection/", get(handlers::to_index))
        .route("/collection/{*name}", get(handlers::collection))
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
