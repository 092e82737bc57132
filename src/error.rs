use std::path::PathBuf;
use thiserror::Error;

/// Failure to read or write one of the JSON files under the config dir.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no config directory available on this system")]
    NoConfigDir,
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed json in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("persistence rejected the write: {0}")]
    Rejected(String),
}

/// Failure to open a single launch target.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("'{0}' has no launch target")]
    NotLaunchable(String),
    #[error("path does not exist: {0}")]
    Missing(String),
    #[error("failed to open {target}: {reason}")]
    Spawn { target: String, reason: String },
}
