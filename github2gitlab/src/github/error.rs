//! GitHub error types.

use crate::cache::CacheError;
use thiserror::Error;

/// Errors that can occur while listing pull requests.
#[derive(Debug, Error)]
pub enum GitHubError {
    /// GitHub API error, including malformed payloads.
    #[error("GitHub API error: {0}")]
    Api(#[from] octocrab::Error),

    /// A pagination link could not be parsed.
    #[error("Invalid pagination link '{link}': {source}")]
    InvalidLink {
        link: String,
        #[source]
        source: url::ParseError,
    },

    /// Reading or writing the listing cache failed.
    #[error(transparent)]
    Cache(#[from] CacheError),
}
