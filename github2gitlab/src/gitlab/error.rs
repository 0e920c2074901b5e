//! GitLab error types.

use thiserror::Error;

/// Errors that can occur while talking to the GitLab API.
#[derive(Debug, Error)]
pub enum GitLabError {
    /// The HTTP client could not be built.
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    /// The request could not be sent or its body could not be read.
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// GitLab answered with a status the operation does not accept.
    #[error("{url} answered {status}: {body}")]
    UnexpectedStatus {
        url: String,
        status: u16,
        body: String,
    },

    /// The response body is not the expected JSON.
    #[error("Malformed response from {url}: {source}")]
    Json {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}
