//! On-disk cache of API listings.
//!
//! Entries are JSON files named after the SHA-256 of the request URL and
//! expire after a fixed time to live.

mod error;

pub use error::CacheError;

use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::debug;

/// Default time to live of a cached listing.
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Directory of cached responses keyed by request URL.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    dir: PathBuf,
    ttl: Duration,
}

impl ResponseCache {
    /// Creates a cache in `dir` with the [`DEFAULT_TTL`].
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ttl: DEFAULT_TTL,
        }
    }

    /// Sets a custom time to live.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Path of the entry for `url`.
    pub fn path_for(&self, url: &str) -> PathBuf {
        let digest = Sha256::digest(url.as_bytes());
        self.dir.join(format!("{}.json", hex::encode(digest)))
    }

    /// Returns the cached value for `url`, or `None` when there is no entry
    /// or it expired.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if a fresh entry cannot be read or parsed.
    pub fn load<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>, CacheError> {
        let path = self.path_for(url);
        let Ok(metadata) = std::fs::metadata(&path) else {
            return Ok(None);
        };

        let age = metadata
            .modified()
            .ok()
            .and_then(|modified| SystemTime::now().duration_since(modified).ok())
            .unwrap_or_default();
        if age >= self.ttl {
            debug!(url, path = %path.display(), "Cache entry expired");
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        let value = serde_json::from_str(&contents).map_err(|e| CacheError::Json {
            path: path.clone(),
            source: e,
        })?;
        debug!(url, path = %path.display(), "Cache hit");
        Ok(Some(value))
    }

    /// Stores `value` as the entry for `url`.
    ///
    /// Writes to `<path>.tmp` then renames, so readers never see a partial
    /// entry.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the entry cannot be written.
    pub fn store<T: Serialize>(&self, url: &str, value: &T) -> Result<(), CacheError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| io_err(&self.dir, e))?;

        let path = self.path_for(url);
        let json = serde_json::to_string(value).map_err(|e| CacheError::Json {
            path: path.clone(),
            source: e,
        })?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| io_err(&tmp, e))?;
        std::fs::rename(&tmp, &path).map_err(|e| io_err(&path, e))?;
        debug!(url, path = %path.display(), "Cached response");
        Ok(())
    }
}

fn io_err(path: &Path, source: std::io::Error) -> CacheError {
    CacheError::Io {
        path: path.to_path_buf(),
        source,
    }
}
