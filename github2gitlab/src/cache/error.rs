//! Response cache error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading or writing cached responses.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Failed to read or write a cache file.
    #[error("Cache I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A cache file does not hold the expected JSON.
    #[error("Corrupt cache file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
