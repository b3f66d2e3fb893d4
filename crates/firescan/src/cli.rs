//! CLI argument definitions.

use std::path::{Path, PathBuf};

use clap::Parser;

use crate::config::DEFAULT_CONFIG_FILE;

/// Directory name searched for templates when none is given.
const TEMPLATES_DIR: &str = "templates";

/// Read-only web viewer for Firestore collections.
#[derive(Parser, Debug)]
#[command(name = "firescan")]
#[command(author, version = env!("FIRESCAN_VERSION"), about, long_about = None)]
pub struct Cli {
    /// YAML config file
    #[arg(short, long, env = "CONFIG_FILE", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Directory holding index.html and collection.html
    #[arg(long, env = "FIRESCAN_TEMPLATES")]
    pub templates: Option<PathBuf>,

    /// Listen port, overriding the config file
    #[arg(short, long, env = "FIRESCAN_PORT")]
    pub port: Option<u16>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long)]
    pub json_logs: bool,
}

impl Cli {
    /// The template directory: `--templates`, else `templates/` beside the
    /// executable if it exists, else `./templates`.
    pub fn templates_dir(&self) -> PathBuf {
        if let Some(dir) = &self.templates {
            return dir.clone();
        }

        let beside_exe = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join(TEMPLATES_DIR)));

        resolve_templates_dir(beside_exe.as_deref())
    }
}

fn resolve_templates_dir(beside_exe: Option<&Path>) -> PathBuf {
    match beside_exe {
        Some(dir) if dir.is_dir() => dir.to_path_buf(),
        _ => PathBuf::from(TEMPLATES_DIR),
    }
}
