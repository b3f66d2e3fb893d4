//! Shared application state and document store selection.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use firescan_core::{DocumentStore, Result};
use firescan_file::FileStore;
use firescan_firestore::{Credentials, FirestoreStore};

use crate::config::Config;
use crate::render::Renderer;

/// State injected into every handler.
pub struct AppState {
    pub config: Config,
    pub renderer: Renderer,
    pub store: Arc<dyn DocumentStore>,
}

impl AppState {
    pub fn new(config: Config, renderer: Renderer, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            config,
            renderer,
            store,
        }
    }
}

/// Google environment variables that influence how Firestore is reached.
#[derive(Debug, Clone, Default)]
pub struct StoreEnv {
    /// `FIRESTORE_EMULATOR_HOST`
    pub emulator_host: Option<String>,
    /// `GOOGLE_APPLICATION_CREDENTIALS`
    pub application_credentials: Option<PathBuf>,
    /// `GCE_METADATA_HOST`
    pub metadata_host: Option<String>,
}

impl StoreEnv {
    /// Read the variables from the process environment. Empty values count
    /// as unset.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self {
            emulator_host: var("FIRESTORE_EMULATOR_HOST"),
            application_credentials: var("GOOGLE_APPLICATION_CREDENTIALS").map(PathBuf::from),
            metadata_host: var("GCE_METADATA_HOST"),
        }
    }
}

/// Open the document store the configuration asks for.
///
/// A `local_data_dir` wins over Firestore. For Firestore the emulator wins
/// over credentials; the config's `credentials_file` wins over
/// `GOOGLE_APPLICATION_CREDENTIALS`; with neither the metadata server is used.
pub fn open_store(config: &Config, env: &StoreEnv) -> Result<Arc<dyn DocumentStore>> {
    if let Some(dir) = &config.local_data_dir {
        let store = FileStore::new(dir);
        info!(root = %store.root().display(), "Using local document files");
        return Ok(Arc::new(store));
    }

    let mut builder = FirestoreStore::builder(&config.project_id).database(&config.database_id);

    if let Some(host) = &env.emulator_host {
        info!(%host, "Using Firestore emulator");
        builder = builder.emulator(host);
    } else if let Some(path) = config
        .credentials_file
        .as_ref()
        .or(env.application_credentials.as_ref())
    {
        info!(path = %path.display(), "Using credentials file");
        builder = builder.credentials(Credentials::from_file(path)?);
    } else {
        info!("Using metadata server credentials");
        if let Some(host) = &env.metadata_host {
            builder = builder.metadata_host(host);
        }
    }

    Ok(Arc::new(builder.build()?))
}
