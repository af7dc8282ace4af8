//! Error types for sqldrift

use std::path::PathBuf;

use thiserror::Error;

/// Result type for sqldrift operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for sqldrift
///
/// Extraction and comparison never fail on SQL content; only reading a file or loading a
/// configuration can.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to read SQL file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Convert Serde JSON errors to sqldrift errors
impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::ConfigError(error.to_string())
    }
}
