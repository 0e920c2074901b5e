//! Run configuration.
//!
//! [`SyncConfig`] carries every setting of a run. It is usually assembled
//! from [`ConfigLayer`]s: an optional TOML file overridden by the command
//! line.

mod error;
mod layer;

pub use error::ConfigError;
pub use layer::ConfigLayer;

use bstr::ByteSlice;
use std::path::{Path, PathBuf};
use url::Url;

/// GitHub REST API used unless overridden.
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// GitHub git host used unless overridden.
pub const DEFAULT_GITHUB_GIT_URL: &str = "https://github.com";

/// SSH public key registered with GitLab unless overridden.
pub const DEFAULT_SSH_PUBLIC_KEY: &str = "~/.ssh/id_rsa.pub";

/// Settings of a mirroring run.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// GitLab instance, e.g. `https://gitlab.example.com`.
    gitlab_url: String,
    /// GitLab private token.
    gitlab_token: String,
    /// GitLab project (`namespace/name`); defaults to the GitHub repository.
    gitlab_repo: Option<String>,
    /// GitHub repository (`owner/name`).
    github_repo: String,
    /// GitHub token, for private repositories and higher rate limits.
    github_token: Option<String>,
    github_api_url: String,
    github_git_url: String,
    /// SSH public key registered with GitLab for pushing.
    ssh_public_key: PathBuf,
    /// Branches to mirror; all of them when `None`.
    branches: Option<Vec<String>>,
    /// Drop pull requests closed without being merged.
    ignore_closed: bool,
    /// Mirror the repository only, leave merge requests alone.
    skip_pull_requests: bool,
    /// Cache the pull request listing.
    cache: bool,
    cache_dir: PathBuf,
    /// Remove the mirror clone after the run.
    clean: bool,
    /// Directory holding the mirror clone.
    work_dir: PathBuf,
}

impl SyncConfig {
    /// Creates a configuration with defaults for every optional setting.
    pub fn new(gitlab_url: String, gitlab_token: String, github_repo: String) -> Self {
        Self {
            gitlab_url,
            gitlab_token,
            gitlab_repo: None,
            github_repo,
            github_token: None,
            github_api_url: DEFAULT_GITHUB_API_URL.to_string(),
            github_git_url: DEFAULT_GITHUB_GIT_URL.to_string(),
            ssh_public_key: expand_home(Path::new(DEFAULT_SSH_PUBLIC_KEY)),
            branches: None,
            ignore_closed: false,
            skip_pull_requests: false,
            cache: false,
            cache_dir: std::env::temp_dir().join("github2gitlab"),
            clean: false,
            work_dir: PathBuf::from("."),
        }
    }

    /// Sets the GitLab project, when it differs from the GitHub repository.
    pub fn with_gitlab_repo(mut self, repo: String) -> Self {
        self.gitlab_repo = Some(repo);
        self
    }

    /// Sets the GitHub token.
    pub fn with_github_token(mut self, token: String) -> Self {
        self.github_token = Some(token);
        self
    }

    /// Sets the GitHub REST API base URL.
    pub fn with_github_api_url(mut self, url: String) -> Self {
        self.github_api_url = url;
        self
    }

    /// Sets the GitHub git host the mirror is cloned from.
    pub fn with_github_git_url(mut self, url: String) -> Self {
        self.github_git_url = url;
        self
    }

    /// Sets the SSH public key path; a leading `~` is expanded.
    pub fn with_ssh_public_key(mut self, path: PathBuf) -> Self {
        self.ssh_public_key = expand_home(&path);
        self
    }

    /// Restricts mirroring to `branches`.
    pub fn with_branches(mut self, branches: Vec<String>) -> Self {
        self.branches = Some(branches);
        self
    }

    pub fn with_ignore_closed(mut self, ignore_closed: bool) -> Self {
        self.ignore_closed = ignore_closed;
        self
    }

    pub fn with_skip_pull_requests(mut self, skip: bool) -> Self {
        self.skip_pull_requests = skip;
        self
    }

    pub fn with_cache(mut self, cache: bool) -> Self {
        self.cache = cache;
        self
    }

    /// Sets where cached responses are kept; a leading `~` is expanded.
    pub fn with_cache_dir(mut self, dir: PathBuf) -> Self {
        self.cache_dir = expand_home(&dir);
        self
    }

    pub fn with_clean(mut self, clean: bool) -> Self {
        self.clean = clean;
        self
    }

    /// Sets the directory holding the mirror clone; a leading `~` is
    /// expanded.
    pub fn with_work_dir(mut self, dir: PathBuf) -> Self {
        self.work_dir = expand_home(&dir);
        self
    }

    /// Returns the GitLab instance URL.
    pub fn gitlab_url(&self) -> &str {
        &self.gitlab_url
    }

    /// Returns the GitLab token.
    pub fn gitlab_token(&self) -> &str {
        &self.gitlab_token
    }

    /// Returns the GitLab project, `namespace/name`.
    pub fn gitlab_repo(&self) -> &str {
        self.gitlab_repo.as_deref().unwrap_or(&self.github_repo)
    }

    /// Returns the GitHub repository, `owner/name`.
    pub fn github_repo(&self) -> &str {
        &self.github_repo
    }

    pub fn github_token(&self) -> Option<&str> {
        self.github_token.as_deref()
    }

    pub fn github_api_url(&self) -> &str {
        &self.github_api_url
    }

    /// Returns the URL the mirror is cloned from.
    pub fn github_clone_url(&self) -> String {
        format!(
            "{}/{}.git",
            self.github_git_url.trim_end_matches('/'),
            self.github_repo
        )
    }

    pub fn ssh_public_key(&self) -> &Path {
        &self.ssh_public_key
    }

    pub fn branches(&self) -> Option<&[String]> {
        self.branches.as_deref()
    }

    pub fn ignore_closed(&self) -> bool {
        self.ignore_closed
    }

    pub fn skip_pull_requests(&self) -> bool {
        self.skip_pull_requests
    }

    pub fn cache(&self) -> bool {
        self.cache
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn clean(&self) -> bool {
        self.clean
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Returns the mirror clone directory: the GitLab project name inside
    /// the working directory.
    pub fn mirror_dir(&self) -> PathBuf {
        let repo = self.gitlab_repo();
        let name = repo.rsplit_once('/').map_or(repo, |(_, name)| name);
        self.work_dir.join(name)
    }

    /// Checks that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] naming the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_repo("github-repo", &self.github_repo)?;
        validate_repo("gitlab-repo", self.gitlab_repo())?;
        validate_http_url("gitlab-url", &self.gitlab_url)?;
        validate_http_url("github-api-url", &self.github_api_url)?;
        validate_http_url("github-git-url", &self.github_git_url)?;

        if self.gitlab_token.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                field: "gitlab-token".to_string(),
                message: "cannot be empty".to_string(),
            });
        }

        for branch in self.branches.iter().flatten() {
            validate_branch(branch)?;
        }

        Ok(())
    }
}

fn validate_repo(field: &str, repo: &str) -> Result<(), ConfigError> {
    let valid = repo.split_once('/').is_some_and(|(namespace, name)| {
        !namespace.is_empty() && !name.is_empty() && !name.contains('/')
    });
    if valid {
        return Ok(());
    }
    Err(ConfigError::ValidationError {
        field: field.to_string(),
        message: format!("'{repo}' is not of the form namespace/name"),
    })
}

fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value).map_err(|e| ConfigError::ValidationError {
        field: field.to_string(),
        message: format!("'{value}' is not a URL: {e}"),
    })?;
    if matches!(url.scheme(), "http" | "https") {
        return Ok(());
    }
    Err(ConfigError::ValidationError {
        field: field.to_string(),
        message: format!("'{value}' is not an http or https URL"),
    })
}

fn validate_branch(branch: &str) -> Result<(), ConfigError> {
    gix_validate::reference::name_partial(branch.as_bytes().as_bstr())
        .map(|_| ())
        .map_err(|e| ConfigError::ValidationError {
            field: "branches".to_string(),
            message: format!("'{branch}' is not a valid branch name: {e}"),
        })
}

/// Expands a leading `~` to the home directory.
///
/// The path is returned unchanged when `HOME` is not set.
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(rest),
        None => path.to_path_buf(),
    }
}
