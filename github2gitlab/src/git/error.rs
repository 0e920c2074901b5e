//! Git plumbing error types.

use thiserror::Error;

/// Errors that can occur while driving the `git` binary.
#[derive(Debug, Error)]
pub enum GitError {
    /// The `git` process could not be started or waited on.
    #[error("Failed to execute git {args}: {source}")]
    Spawn {
        args: String,
        #[source]
        source: std::io::Error,
    },

    /// A git command exited unsuccessfully.
    #[error("git {args} failed: {stderr}")]
    CommandFailed { args: String, stderr: String },

    /// Git printed something this crate cannot parse.
    #[error("Unexpected output from git {args}: {output}")]
    UnexpectedOutput { args: String, output: String },
}
