//! Error types for config loading and validation.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors returned while loading or validating a vault config.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A config file could not be read.
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// A config source is not valid JSON5.
    #[error("failed to parse {origin} as JSON5: {source}")]
    Parse {
        origin: String,
        #[source]
        source: json5::Error,
    },
    /// The merged document did not decode into `VaultConfig`.
    #[error("failed to decode config: {0}")]
    Decode(#[from] serde_json::Error),
    /// A field has the wrong shape or is not part of the schema.
    #[error("invalid config at {path}: {message}")]
    InvalidField { path: String, message: String },
    /// Decoded values violate a cross-field rule.
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub(crate) fn read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ConfigError::Read {
            path: path.into(),
            source,
        }
    }
}
