//! One mirroring pass: GitHub -> local bare clone -> GitLab.

use super::{GitError, GitRepository};
use crate::promotion::{promote_merge_refs, Promotion, FETCHED_PULL_PREFIX, MIRRORED_PULL_PREFIX};
use tracing::{info, info_span, Instrument};

/// Name of the remote pointing at the GitLab project.
pub const GITLAB_REMOTE: &str = "gitlab";

/// Name of the remote pointing at the GitHub repository.
const SOURCE_REMOTE: &str = "origin";

/// What to mirror and where.
#[derive(Debug, Clone)]
pub struct MirrorPlan {
    /// Push URL of the GitLab project.
    pub target_url: String,

    /// Branches to mirror; every branch when `None`.
    pub branches: Option<Vec<String>>,
}

impl MirrorPlan {
    /// Refspecs selecting the mirrored branches.
    pub fn branch_refspecs(&self) -> Vec<String> {
        match &self.branches {
            Some(branches) => branches
                .iter()
                .map(|b| format!("+refs/heads/{b}:refs/heads/{b}"))
                .collect(),
            None => vec!["+refs/heads/*:refs/heads/*".to_string()],
        }
    }
}

/// Fetches branches, tags and pull request refs from GitHub, promotes the
/// pull request refs that are safe to publish, then pushes everything to
/// GitLab.
///
/// # Returns
///
/// The pull request refs promoted during this pass.
///
/// # Errors
///
/// Returns [`GitError`] if any git command fails.
pub async fn mirror_repository(
    repository: &GitRepository,
    plan: &MirrorPlan,
) -> Result<Vec<Promotion>, GitError> {
    let span = info_span!("mirror", path = %repository.path().display());

    async {
        repository
            .ensure_remote(GITLAB_REMOTE, &plan.target_url)
            .await?;

        let branches = plan.branch_refspecs();
        let tags = "+refs/tags/*:refs/tags/*".to_string();

        let mut fetch = branches.clone();
        fetch.push(tags.clone());
        repository.fetch(SOURCE_REMOTE, &fetch).await?;

        let pulls = format!("+refs/pull/*:{FETCHED_PULL_PREFIX}*");
        repository.fetch(SOURCE_REMOTE, &[pulls]).await?;

        let promotions = promote_merge_refs(repository).await?;
        info!(count = promotions.len(), "Promoted pull request refs");

        let mut push = branches;
        push.push(format!("+{MIRRORED_PULL_PREFIX}*:{MIRRORED_PULL_PREFIX}*"));
        push.push(tags);
        repository.push(GITLAB_REMOTE, &push).await?;

        Ok(promotions)
    }
    .instrument(span)
    .await
}
