//! Field-by-field reconciliation of a pull request and its merge request.
//!
//! [`reconcile`] compares every [`Field`] and compiles the differences into a
//! single [`RecordUpdate`]. [`creation_request`] builds the merge request for
//! a pull request that has none yet.

mod field;
mod update;

pub use field::{state_equal, text_equal, Field, FieldKind};
pub use update::{Expectation, NewRecord, RecordUpdate};

use crate::identity::source_branch_for;
use crate::model::{truncate_description, MirroredRecord, Proposal};

/// Computes the update bringing `record` in line with `proposal`.
///
/// The update is empty when every field already matches.
#[must_use]
pub fn reconcile(proposal: &Proposal, record: &MirroredRecord) -> RecordUpdate {
    let mut update = RecordUpdate::default();
    for field in Field::ALL {
        if !field.is_equal(proposal, record) {
            field.apply(proposal, &mut update);
        }
    }
    update
}

/// Builds the merge request mirroring `proposal`.
///
/// The caller checks that both branches exist in the mirror first.
#[must_use]
pub fn creation_request(proposal: &Proposal) -> NewRecord {
    let description = proposal
        .body
        .as_deref()
        .filter(|body| !body.is_empty())
        .map(truncate_description);

    NewRecord {
        title: proposal.title.clone(),
        source_branch: source_branch_for(&proposal.key()),
        target_branch: proposal.base.name.clone(),
        description,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        with_marker, BranchRef, ProposalState, RecordState, StateEvent, DESCRIPTION_MAX,
    };

    fn proposal(state: ProposalState, merged_at: Option<&str>) -> Proposal {
        Proposal {
            number: 7,
            state,
            merged_at: merged_at.map(str::to_string),
            title: "TITLE é".to_string(),
            body: Some("DESCRIPTION è".to_string()),
            base: BranchRef {
                name: "main".to_string(),
            },
            head: BranchRef {
                name: "feature".to_string(),
            },
        }
    }

    fn record(state: RecordState) -> MirroredRecord {
        MirroredRecord {
            id: 100,
            iid: 1,
            state,
            title: "TITLE é".to_string(),
            description: Some("DESCRIPTION è".to_string()),
            source_branch: "pull/7/head".to_string(),
            target_branch: "main".to_string(),
        }
    }

    #[test]
    fn in_sync_record_needs_no_update() {
        let update = reconcile(&proposal(ProposalState::Open, None), &record(RecordState::Opened));
        assert!(update.is_empty());
    }

    #[test]
    fn merged_pull_request_requests_merge_and_title() {
        let mut proposal = proposal(ProposalState::Closed, Some("today"));
        proposal.title = "OTHER_TITLE".to_string();

        let update = reconcile(&proposal, &record(RecordState::Opened));

        assert_eq!(
            update,
            RecordUpdate {
                title: Some("OTHER_TITLE".to_string()),
                description: None,
                state_event: Some(StateEvent::Merge),
            }
        );
    }

    #[test]
    fn closed_pull_request_requests_close() {
        let update = reconcile(
            &proposal(ProposalState::Closed, None),
            &record(RecordState::Opened),
        );
        assert_eq!(update.state_event, Some(StateEvent::Close));
    }

    #[test]
    fn reopened_pull_request_requests_reopen() {
        let update = reconcile(&proposal(ProposalState::Open, None), &record(RecordState::Merged));
        assert_eq!(update.state_event, Some(StateEvent::Reopen));
    }

    #[test]
    fn marker_does_not_cause_description_update() {
        let proposal = proposal(ProposalState::Closed, Some("today"));
        let mut record = record(RecordState::Closed);
        record.description = Some(with_marker("DESCRIPTION è"));

        assert!(reconcile(&proposal, &record).is_empty());
    }

    #[test]
    fn long_body_is_truncated_in_update() {
        let mut proposal = proposal(ProposalState::Open, None);
        proposal.body = Some("x".repeat(DESCRIPTION_MAX + 5));

        let update = reconcile(&proposal, &record(RecordState::Opened));

        assert_eq!(update.description.map(|d| d.len()), Some(DESCRIPTION_MAX));
    }

    #[test]
    fn builds_creation_request() {
        let mut proposal = proposal(ProposalState::Open, None);
        proposal.body = Some("b".repeat(2000));

        let request = creation_request(&proposal);

        assert_eq!(request.title, "TITLE é");
        assert_eq!(request.source_branch, "pull/7/head");
        assert_eq!(request.target_branch, "main");
        assert_eq!(request.description, Some("b".repeat(DESCRIPTION_MAX)));
    }

    #[test]
    fn creation_request_omits_empty_body() {
        let mut proposal = proposal(ProposalState::Open, None);
        proposal.body = None;
        assert_eq!(creation_request(&proposal).description, None);
    }
}
