//! Association between pull requests and the merge requests mirroring them.
//!
//! Nothing is persisted: a merge request mirrors pull request `N` when its
//! source branch is `pull/<N>/head`. The map is rebuilt on every run from
//! the current listings.

use crate::model::{MirroredRecord, Proposal};
use std::collections::BTreeMap;
use tracing::debug;

/// Source branch of the merge request mirroring pull request `number`.
#[must_use]
pub fn source_branch_for(number: &str) -> String {
    format!("pull/{number}/head")
}

/// Extracts `N` from a `pull/<N>/head` source branch.
///
/// Returns `None` for any other branch, e.g. a merge request opened by
/// hand on GitLab.
#[must_use]
pub fn parse_source_branch(branch: &str) -> Option<&str> {
    let number = branch.strip_prefix("pull/")?.strip_suffix("/head")?;
    if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(number)
}

/// Snapshot of the pull request <-> merge request association.
#[derive(Debug, Clone, Default)]
pub struct IdentityMap {
    by_proposal: BTreeMap<String, MirroredRecord>,
    by_record: BTreeMap<u64, Proposal>,
}

impl IdentityMap {
    /// Builds the map from pull requests keyed by number and merge requests
    /// keyed by id.
    ///
    /// Merge requests whose source branch does not follow the naming
    /// convention, or names an unknown pull request, are ignored. When
    /// several merge requests claim the same pull request, the one with the
    /// highest id wins.
    #[must_use]
    pub fn build(
        proposals: &BTreeMap<String, Proposal>,
        records: &BTreeMap<u64, MirroredRecord>,
    ) -> Self {
        let mut by_proposal: BTreeMap<String, MirroredRecord> = BTreeMap::new();

        for record in records.values() {
            let Some(number) = parse_source_branch(&record.source_branch) else {
                continue;
            };
            if !proposals.contains_key(number) {
                continue;
            }
            if let Some(previous) = by_proposal.insert(number.to_string(), record.clone()) {
                debug!(
                    number,
                    replaced = previous.id,
                    record = record.id,
                    "Several merge requests mirror the same pull request"
                );
            }
        }

        let by_record = by_proposal
            .iter()
            .filter_map(|(number, record)| {
                proposals
                    .get(number)
                    .map(|proposal| (record.id, proposal.clone()))
            })
            .collect();

        Self {
            by_proposal,
            by_record,
        }
    }

    /// Merge request mirroring pull request `number`.
    #[must_use]
    pub fn record_for(&self, number: &str) -> Option<&MirroredRecord> {
        self.by_proposal.get(number)
    }

    /// Pull request mirrored by the merge request with id `record_id`.
    #[must_use]
    pub fn proposal_for(&self, record_id: u64) -> Option<&Proposal> {
        self.by_record.get(&record_id)
    }

    /// Number of mapped pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_proposal.len()
    }

    /// Returns true when no merge request mirrors a known pull request.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_proposal.is_empty()
    }
}
