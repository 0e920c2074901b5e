//! Local mirror clone driven through the `git` binary.
//!
//! [`GitRepository`] wraps a bare clone of the GitHub repository and
//! provides both the [`RefStore`] used by the reconciliation and the
//! clone/fetch/push plumbing used by [`mirror_repository`].

mod error;
mod mirror;
mod store;

pub use error::GitError;
pub use mirror::{mirror_repository, MirrorPlan, GITLAB_REMOTE};
pub use store::RefStore;

use crate::model::{Commit, Ref, RefLookup};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// A bare clone on the local filesystem.
#[derive(Debug, Clone)]
pub struct GitRepository {
    path: PathBuf,
}

impl GitRepository {
    /// Opens the repository at `path`; nothing is checked until a command runs.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the repository path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates a bare clone of `source_url` at `path` unless it already exists.
    pub async fn clone_bare(source_url: &str, path: &Path) -> Result<Self, GitError> {
        if path.exists() {
            debug!(path = %path.display(), "Mirror clone already exists");
            return Ok(Self::new(path));
        }

        let target = path.to_string_lossy();
        run_git(Path::new("."), &["clone", "--bare", source_url, &target], None).await?;
        Ok(Self::new(path))
    }

    /// Points the remote `name` at `url`, adding it if needed.
    ///
    /// An existing remote with another URL (e.g. an embedded token that was
    /// rotated) is updated.
    pub async fn ensure_remote(&self, name: &str, url: &str) -> Result<(), GitError> {
        let remotes = self.run(&["remote"]).await?;
        if !remotes.lines().any(|line| line.trim() == name) {
            debug!(remote = name, "Adding remote");
            self.run(&["remote", "add", name, url]).await?;
            return Ok(());
        }

        let current = self.run(&["remote", "get-url", name]).await?;
        if current.trim() != url {
            debug!(remote = name, "Updating remote URL");
            self.run(&["remote", "set-url", name, url]).await?;
        }
        Ok(())
    }

    /// Force-fetches `refspecs` from `remote`.
    pub async fn fetch(&self, remote: &str, refspecs: &[String]) -> Result<(), GitError> {
        let mut args = vec!["fetch", "--force", remote];
        args.extend(refspecs.iter().map(String::as_str));
        self.run(&args).await?;
        Ok(())
    }

    /// Force-pushes `refspecs` to `remote`, pruning refs deleted locally.
    pub async fn push(&self, remote: &str, refspecs: &[String]) -> Result<(), GitError> {
        let mut args = vec!["push", "--prune", "--force", remote];
        args.extend(refspecs.iter().map(String::as_str));
        self.run(&args).await?;
        Ok(())
    }

    async fn run(&self, args: &[&str]) -> Result<String, GitError> {
        run_git(&self.path, args, None).await
    }
}

#[async_trait]
impl RefStore for GitRepository {
    async fn list_refs(&self, prefix: &str) -> Result<Vec<Ref>, GitError> {
        let pattern = prefix.trim_end_matches('/');
        let args = [
            "for-each-ref",
            "--format=%(objectname) %(refname)",
            pattern,
        ];
        let output = self.run(&args).await?;

        output
            .lines()
            .filter(|line| !line.is_empty())
            .map(|line| match line.split_once(' ') {
                Some((target, name)) => Ok(Ref::new(name, target)),
                None => Err(GitError::UnexpectedOutput {
                    args: args.join(" "),
                    output: line.to_string(),
                }),
            })
            .collect()
    }

    async fn read_commit(&self, revision: &str) -> Result<Commit, GitError> {
        let args = ["rev-list", "--parents", "-n", "1", revision];
        let output = self.run(&args).await?;
        let mut hashes = output.split_whitespace().map(str::to_string);

        let hash = hashes.next().ok_or_else(|| GitError::UnexpectedOutput {
            args: args.join(" "),
            output: output.clone(),
        })?;
        Ok(Commit {
            hash,
            parents: hashes.collect(),
        })
    }

    async fn resolve(&self, revision: &str) -> Result<RefLookup, GitError> {
        let spec = format!("{revision}^{{commit}}");
        match self.run(&["rev-parse", "--verify", "--quiet", &spec]).await {
            Ok(output) => Ok(RefLookup::Found(output.trim().to_string())),
            Err(GitError::CommandFailed { .. }) => Ok(RefLookup::Missing),
            Err(e) => Err(e),
        }
    }

    async fn write_refs(&self, refs: &[Ref]) -> Result<(), GitError> {
        // update-ref --stdin applies every line or none of them.
        let script: String = refs
            .iter()
            .map(|r| format!("update {} {}\n", r.name, r.target))
            .collect();
        run_git(&self.path, &["update-ref", "--stdin"], Some(&script)).await?;
        Ok(())
    }
}

/// Runs a git command in `dir` and returns its stdout.
async fn run_git(dir: &Path, args: &[&str], stdin: Option<&str>) -> Result<String, GitError> {
    debug!(dir = %dir.display(), args = %args.join(" "), "Running git");

    let spawn_error = |e: std::io::Error| GitError::Spawn {
        args: args.join(" "),
        source: e,
    };

    let mut child = Command::new("git")
        .args(args)
        .current_dir(dir)
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(spawn_error)?;

    if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
        pipe.write_all(input.as_bytes())
            .await
            .map_err(spawn_error)?;
        // Dropping the pipe closes stdin so git sees end of input.
        drop(pipe);
    }

    let output = child.wait_with_output().await.map_err(spawn_error)?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(GitError::CommandFailed {
            args: args.join(" "),
            stderr: stderr.trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
