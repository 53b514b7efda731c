//! Error types for game data loading

use std::path::PathBuf;
use thiserror::Error;

/// Errors while loading the character catalog or the narrative graph
#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to read {path}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse TOML in {path}")]
    ParseToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid definition in {path}: {reason}")]
    InvalidDefinition { path: PathBuf, reason: String },
}
