//! Orchestrates a complete mirroring run.

mod error;

pub use error::RunnerError;

use crate::cache::ResponseCache;
use crate::config::SyncConfig;
use crate::git::{mirror_repository, GitRepository, MirrorPlan};
use crate::github::{GitHubClient, ProposalSource};
use crate::gitlab::{push_url, GitLabClient, RecordTarget};
use crate::identity::IdentityMap;
use crate::summary::RunSummary;
use crate::sync::SyncDriver;
use tracing::{info, info_span, Instrument};

/// Mirrors one GitHub repository and its pull requests into GitLab.
pub struct Runner {
    config: SyncConfig,
    github: GitHubClient,
    gitlab: GitLabClient,
}

impl Runner {
    /// Builds a runner from the provided configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError`] if an API client cannot be built.
    pub fn new(config: SyncConfig) -> Result<Self, RunnerError> {
        let mut github = GitHubClient::new(
            config.github_api_url(),
            config.github_repo(),
            config.github_token(),
        )?
        .with_ignore_closed(config.ignore_closed());
        if config.cache() {
            github = github.with_cache(ResponseCache::new(config.cache_dir()));
        }

        let gitlab = GitLabClient::new(
            config.gitlab_url(),
            config.gitlab_repo(),
            config.gitlab_token(),
        )?;

        Ok(Self {
            config,
            github,
            gitlab,
        })
    }

    /// Executes the full flow: provision the GitLab project, mirror the
    /// repository, then sync pull requests into merge requests.
    ///
    /// # Errors
    ///
    /// Returns the first [`RunnerError`]; nothing is retried.
    pub async fn run(&self) -> Result<RunSummary, RunnerError> {
        let span = info_span!(
            "run",
            github = %self.config.github_repo(),
            gitlab = %self.config.gitlab_repo()
        );

        async {
            let mut summary = RunSummary::new(self.config.skip_pull_requests());

            self.gitlab.add_ssh_key(self.config.ssh_public_key()).await?;
            if self.gitlab.ensure_project().await? {
                summary.project_created = true;
                summary.branches_unprotected = self.gitlab.unprotect_branches().await?;
            }

            let mirror_dir = self.config.mirror_dir();
            info!(path = %mirror_dir.display(), "Updating mirror clone");
            let repository =
                GitRepository::clone_bare(&self.config.github_clone_url(), &mirror_dir).await?;
            let plan = MirrorPlan {
                target_url: push_url(
                    self.config.gitlab_url(),
                    self.config.gitlab_repo(),
                    self.config.gitlab_token(),
                ),
                branches: self.config.branches().map(<[String]>::to_vec),
            };
            let promotions = mirror_repository(&repository, &plan).await?;
            summary.record_promotions(&promotions);

            if self.config.skip_pull_requests() {
                info!("Skipping pull request sync");
            } else {
                self.sync_pull_requests(&repository, &mut summary).await?;
            }

            if self.config.clean() {
                info!(path = %mirror_dir.display(), "Removing mirror clone");
                tokio::fs::remove_dir_all(&mirror_dir)
                    .await
                    .map_err(|e| RunnerError::Clean {
                        path: mirror_dir.display().to_string(),
                        source: e,
                    })?;
            }

            Ok(summary)
        }
        .instrument(span)
        .await
    }

    async fn sync_pull_requests(
        &self,
        repository: &GitRepository,
        summary: &mut RunSummary,
    ) -> Result<(), RunnerError> {
        let proposals = self.github.list_proposals().await?;
        let records = self.gitlab.list_records().await?;
        let identity = IdentityMap::build(&proposals, &records);
        info!(
            pull_requests = proposals.len(),
            merge_requests = records.len(),
            mirrored = identity.len(),
            "Syncing pull requests"
        );
        summary.proposals_seen = proposals.len();

        let actions = SyncDriver::new(repository, &self.gitlab)
            .run(&proposals, &identity)
            .await?;
        for action in &actions {
            summary.record_action(action);
        }
        Ok(())
    }
}
