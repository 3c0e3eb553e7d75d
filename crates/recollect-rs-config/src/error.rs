//! Config failures.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {}: {source}", path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid JSON5.
    #[error("config is not valid JSON5: {0}")]
    ParseFailed(#[from] json5::Error),
    /// Schema-valid JSON that still does not fit `RecollectConfig`.
    #[error("config does not match the expected shape: {0}")]
    DecodeFailed(#[from] serde_json::Error),
    #[error("invalid config at {path}: {message}")]
    InvalidField { path: String, message: String },
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub(crate) fn read_failed(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::ReadFailed {
            path: path.to_path_buf(),
            source,
        }
    }
}
