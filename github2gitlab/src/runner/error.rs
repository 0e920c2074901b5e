//! Runner error types.

/// Errors that can occur during a run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// Configuration errors.
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    /// Mirror clone errors.
    #[error(transparent)]
    Git(#[from] crate::git::GitError),

    /// GitHub listing errors.
    #[error(transparent)]
    GitHub(#[from] crate::github::GitHubError),

    /// GitLab provisioning and listing errors.
    #[error(transparent)]
    GitLab(#[from] crate::gitlab::GitLabError),

    /// Errors of the merge request sync pass.
    #[error(transparent)]
    Sync(#[from] crate::sync::SyncError),

    /// Failed to remove the mirror clone.
    #[error("Failed to remove '{path}': {source}")]
    Clean {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
