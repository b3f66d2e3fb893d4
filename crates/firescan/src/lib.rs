//! firescan - read-only web viewer for Firestore collections.
//!
//! The index page lists configured collections with their document counts.
//! A collection page shows one document at a time, newest first, with the
//! surrounding batch embedded so the browser can step through it locally.

pub mod cli;
pub mod config;
pub mod handlers;
pub mod render;
pub mod routes;
pub mod state;

pub use config::{Config, ConfigError};
pub use render::{Renderer, TemplateError};
pub use routes::build_router;
pub use state::{AppState, StoreEnv, open_store};
