//! Sync error types.

use crate::git::GitError;
use crate::gitlab::GitLabError;
use thiserror::Error;

/// Errors that abort a sync pass.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Reading the mirror clone failed.
    #[error(transparent)]
    Git(#[from] GitError),

    /// A GitLab call failed.
    #[error(transparent)]
    GitLab(#[from] GitLabError),

    /// GitLab stored something other than what was requested.
    #[error("{url}: field {field} is '{actual}' instead of the expected '{expected}'")]
    Verification {
        url: String,
        field: &'static str,
        expected: String,
        actual: String,
    },
}
