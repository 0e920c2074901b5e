//! Partial configuration read from a file or the command line.

use super::{ConfigError, SyncConfig};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One source of settings; every value is optional.
///
/// Layers are stacked with [`ConfigLayer::merge`], then turned into a
/// [`SyncConfig`] with [`ConfigLayer::into_config`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ConfigLayer {
    pub gitlab_url: Option<String>,
    pub gitlab_token: Option<String>,
    pub gitlab_repo: Option<String>,
    pub github_repo: Option<String>,
    pub github_token: Option<String>,
    pub github_api_url: Option<String>,
    pub github_git_url: Option<String>,
    pub ssh_public_key: Option<PathBuf>,
    pub branches: Option<Vec<String>>,
    pub ignore_closed: Option<bool>,
    pub skip_pull_requests: Option<bool>,
    pub cache: Option<bool>,
    pub cache_dir: Option<PathBuf>,
    pub clean: Option<bool>,
    pub work_dir: Option<PathBuf>,
}

impl ConfigLayer {
    /// Loads a layer from a TOML file with kebab-case keys.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        debug!(path = %path.display(), "Loading config file");

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::TomlError {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// Stacks `overrides` on top of `self`; values set in `overrides` win.
    #[must_use]
    pub fn merge(self, overrides: ConfigLayer) -> Self {
        Self {
            gitlab_url: overrides.gitlab_url.or(self.gitlab_url),
            gitlab_token: overrides.gitlab_token.or(self.gitlab_token),
            gitlab_repo: overrides.gitlab_repo.or(self.gitlab_repo),
            github_repo: overrides.github_repo.or(self.github_repo),
            github_token: overrides.github_token.or(self.github_token),
            github_api_url: overrides.github_api_url.or(self.github_api_url),
            github_git_url: overrides.github_git_url.or(self.github_git_url),
            ssh_public_key: overrides.ssh_public_key.or(self.ssh_public_key),
            branches: overrides.branches.or(self.branches),
            ignore_closed: overrides.ignore_closed.or(self.ignore_closed),
            skip_pull_requests: overrides.skip_pull_requests.or(self.skip_pull_requests),
            cache: overrides.cache.or(self.cache),
            cache_dir: overrides.cache_dir.or(self.cache_dir),
            clean: overrides.clean.or(self.clean),
            work_dir: overrides.work_dir.or(self.work_dir),
        }
    }

    /// Builds and validates the final configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingValue`] when the GitLab URL, GitLab
    /// token or GitHub repository is absent, or the error of
    /// [`SyncConfig::validate`].
    pub fn into_config(self) -> Result<SyncConfig, ConfigError> {
        let gitlab_url = self.gitlab_url.ok_or(ConfigError::MissingValue { name: "gitlab-url" })?;
        let gitlab_token = self
            .gitlab_token
            .ok_or(ConfigError::MissingValue { name: "gitlab-token" })?;
        let github_repo = self
            .github_repo
            .ok_or(ConfigError::MissingValue { name: "github-repo" })?;

        let mut config = SyncConfig::new(gitlab_url, gitlab_token, github_repo)
            .with_ignore_closed(self.ignore_closed.unwrap_or(false))
            .with_skip_pull_requests(self.skip_pull_requests.unwrap_or(false))
            .with_cache(self.cache.unwrap_or(false))
            .with_clean(self.clean.unwrap_or(false));

        if let Some(repo) = self.gitlab_repo {
            config = config.with_gitlab_repo(repo);
        }
        if let Some(token) = self.github_token {
            config = config.with_github_token(token);
        }
        if let Some(url) = self.github_api_url {
            config = config.with_github_api_url(url);
        }
        if let Some(url) = self.github_git_url {
            config = config.with_github_git_url(url);
        }
        if let Some(path) = self.ssh_public_key {
            config = config.with_ssh_public_key(path);
        }
        if let Some(branches) = self.branches {
            config = config.with_branches(branches);
        }
        if let Some(dir) = self.cache_dir {
            config = config.with_cache_dir(dir);
        }
        if let Some(dir) = self.work_dir {
            config = config.with_work_dir(dir);
        }

        config.validate()?;
        Ok(config)
    }
}
