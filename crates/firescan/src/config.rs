//! YAML configuration file.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use firescan_core::CollectionPath;
use firescan_firestore::DEFAULT_DATABASE;

/// Config file read when neither `--config` nor `CONFIG_FILE` is given.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// Documents per batch when the file gives none or a non-positive value.
pub const DEFAULT_BATCH_SIZE: usize = 25;

/// Listen port when the file gives none or a non-positive value.
pub const DEFAULT_PORT: u16 = 8080;

/// Errors loading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// The file as written, before defaults are applied.
#[derive(Debug, Deserialize)]
struct RawConfig {
    project_id: String,
    #[serde(default)]
    credentials_file: Option<PathBuf>,
    #[serde(default)]
    database_id: Option<String>,
    #[serde(default)]
    local_data_dir: Option<PathBuf>,
    #[serde(default)]
    batch_size: Option<i64>,
    #[serde(default)]
    port: Option<i64>,
    #[serde(default)]
    collections: Vec<String>,
}

/// Viewer configuration. Immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub project_id: String,
    /// Service account or authorized user JSON file.
    pub credentials_file: Option<PathBuf>,
    pub database_id: String,
    /// Browse JSON files under this directory instead of Firestore.
    pub local_data_dir: Option<PathBuf>,
    pub batch_size: usize,
    pub port: u16,
    /// Collections listed on the index page, in file order.
    pub collections: Vec<CollectionPath>,
}

impl Config {
    /// Read and validate a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    /// Parse and validate YAML text.
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_yaml::from_str(text)?;
        raw.try_into()
    }
}

impl TryFrom<RawConfig> for Config {
    type Error = ConfigError;

    fn try_from(raw: RawConfig) -> Result<Self, Self::Error> {
        // A null key reads like an absent one.
        let batch_size = match raw.batch_size {
            Some(n) if n > 0 => usize::try_from(n)
                .map_err(|_| ConfigError::Invalid(format!("batch_size {} too large", n)))?,
            _ => DEFAULT_BATCH_SIZE,
        };

        let port = match raw.port {
            Some(n) if n > 0 => u16::try_from(n)
                .map_err(|_| ConfigError::Invalid(format!("port {} out of range", n)))?,
            _ => DEFAULT_PORT,
        };

        let collections = raw
            .collections
            .iter()
            .map(|name| {
                CollectionPath::new(name).map_err(|e| ConfigError::Invalid(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let database_id = match raw.database_id {
            Some(id) if !id.trim().is_empty() => id,
            _ => DEFAULT_DATABASE.to_string(),
        };

        Ok(Self {
            project_id: raw.project_id,
            credentials_file: non_blank(raw.credentials_file),
            database_id,
            local_data_dir: non_blank(raw.local_data_dir),
            batch_size,
            port,
            collections,
        })
    }
}

/// An empty or whitespace-only path means the key was left unset.
fn non_blank(path: Option<PathBuf>) -> Option<PathBuf> {
    path.filter(|p| !p.as_os_str().to_string_lossy().trim().is_empty())
}
