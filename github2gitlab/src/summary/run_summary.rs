//! Counters of a complete run.

use crate::promotion::Promotion;
use crate::sync::{SyncAction, UpdateKind};

/// Summary of a complete run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Whether the GitLab project was created by this run.
    pub project_created: bool,

    /// Number of protected branches unprotected.
    pub branches_unprotected: usize,

    /// Number of pull requests whose refs were promoted into the mirror.
    pub refs_promoted: usize,

    /// Number of pull requests listed on GitHub.
    pub proposals_seen: usize,

    /// Number of merge requests created.
    pub records_created: usize,

    /// Number of merge requests updated, including merge fallbacks.
    pub records_updated: usize,

    /// Number of merge requests already in sync.
    pub records_unchanged: usize,

    /// Number of pull requests left without a merge request.
    pub proposals_skipped: usize,

    /// Number of merge requests closed with the marker because GitLab
    /// refused to merge them.
    pub merge_fallbacks: usize,

    /// Whether pull request sync was skipped.
    pub pull_requests_skipped: bool,
}

impl RunSummary {
    /// Creates a new empty summary.
    #[must_use]
    pub fn new(pull_requests_skipped: bool) -> Self {
        Self {
            pull_requests_skipped,
            ..Default::default()
        }
    }

    /// Counts promoted pull request refs.
    pub fn record_promotions(&mut self, promotions: &[Promotion]) {
        self.refs_promoted += promotions.len();
    }

    /// Updates the summary with one sync step.
    pub fn record_action(&mut self, action: &SyncAction) {
        match action {
            SyncAction::Skipped { .. } => self.proposals_skipped += 1,
            SyncAction::Created { .. } => self.records_created += 1,
            SyncAction::Updated { kind, .. } => {
                self.records_updated += 1;
                if *kind == UpdateKind::ClosedWithMarker {
                    self.merge_fallbacks += 1;
                }
            }
            SyncAction::Unchanged { .. } => self.records_unchanged += 1,
        }
    }

    /// Returns true if the run wrote nothing to GitLab merge requests.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.records_created == 0 && self.records_updated == 0
    }
}
