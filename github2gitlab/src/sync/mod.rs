//! One reconciliation pass over every pull request.
//!
//! For each pull request, in key order, [`SyncDriver`] finds the mirroring
//! merge request through the [`IdentityMap`], creates it when it is missing
//! and both branches are mirrored, then writes whatever still diverges.
//! Every write is checked against what GitLab returns. The first error
//! aborts the pass; every step is idempotent, so the pass can simply be
//! run again.

mod error;
mod outcome;

pub use error::SyncError;
pub use outcome::{SkipReason, SyncAction, UpdateKind};

use crate::git::RefStore;
use crate::gitlab::RecordTarget;
use crate::identity::IdentityMap;
use crate::model::{with_marker, MirroredRecord, Proposal, RecordState, StateEvent};
use crate::promotion::mirrored_head_ref;
use crate::reconcile::{creation_request, reconcile, Expectation, RecordUpdate};
use std::collections::BTreeMap;
use tracing::{debug, info, info_span, warn, Instrument};

/// Drives pull requests into GitLab merge requests.
pub struct SyncDriver<'a, S: ?Sized, T: ?Sized> {
    refs: &'a S,
    target: &'a T,
}

impl<'a, S, T> SyncDriver<'a, S, T>
where
    S: RefStore + ?Sized,
    T: RecordTarget + ?Sized,
{
    /// Creates a driver reading refs from `refs` and writing to `target`.
    pub fn new(refs: &'a S, target: &'a T) -> Self {
        Self { refs, target }
    }

    /// Runs the pass.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] on the first failed call or verification.
    pub async fn run(
        &self,
        proposals: &BTreeMap<String, Proposal>,
        identity: &IdentityMap,
    ) -> Result<Vec<SyncAction>, SyncError> {
        let mut actions = Vec::new();

        for (number, proposal) in proposals {
            let span = info_span!("sync_proposal", number = %number);
            let record = identity.record_for(number).cloned();
            let steps = self.sync_proposal(number, proposal, record).instrument(span).await?;
            actions.extend(steps);
        }

        Ok(actions)
    }

    async fn sync_proposal(
        &self,
        number: &str,
        proposal: &Proposal,
        record: Option<MirroredRecord>,
    ) -> Result<Vec<SyncAction>, SyncError> {
        let mut actions = Vec::new();

        let record = match record {
            Some(record) => record,
            None => match self.create(number, proposal).await? {
                Ok(record) => {
                    actions.push(SyncAction::Created {
                        number: number.to_string(),
                        iid: record.iid,
                    });
                    record
                }
                Err(reason) => {
                    debug!(reason = reason.as_str(), "Skip pull request");
                    actions.push(SyncAction::Skipped {
                        number: number.to_string(),
                        reason,
                    });
                    return Ok(actions);
                }
            },
        };

        let update = reconcile(proposal, &record);
        if update.is_empty() {
            debug!(iid = record.iid, "Merge request up to date");
            if actions.is_empty() {
                actions.push(SyncAction::Unchanged {
                    number: number.to_string(),
                    iid: record.iid,
                });
            }
            return Ok(actions);
        }

        let kind = self.apply_update(&record, update).await?;
        actions.push(SyncAction::Updated {
            number: number.to_string(),
            iid: record.iid,
            kind,
        });
        Ok(actions)
    }

    /// Creates the merge request of `proposal` when both of its branches
    /// are in the mirror.
    async fn create(
        &self,
        number: &str,
        proposal: &Proposal,
    ) -> Result<Result<MirroredRecord, SkipReason>, SyncError> {
        if !self.refs.resolve(&mirrored_head_ref(number)).await?.is_found() {
            return Ok(Err(SkipReason::MissingHead));
        }
        let base = format!("refs/heads/{}", proposal.base.name);
        if !self.refs.resolve(&base).await?.is_found() {
            return Ok(Err(SkipReason::MissingBase));
        }

        let request = creation_request(proposal);
        let record = self.target.create_record(&request).await?;
        verify(
            &self.target.record_url(record.iid),
            request.expectations(&record),
        )?;
        info!(iid = record.iid, "Created merge request");
        Ok(Ok(record))
    }

    /// Writes `update` and checks the result, closing with the marker when
    /// GitLab refuses to merge.
    async fn apply_update(
        &self,
        record: &MirroredRecord,
        update: RecordUpdate,
    ) -> Result<UpdateKind, SyncError> {
        let url = self.target.record_url(record.iid);
        let result = self.target.update_record(record.iid, &update).await?;

        let merge_refused =
            update.state_event == Some(StateEvent::Merge) && result.state == RecordState::Opened;
        if !merge_refused {
            verify(&url, update.expectations(&result))?;
            info!(iid = record.iid, "Updated merge request");
            return Ok(UpdateKind::Applied);
        }

        let written = RecordUpdate {
            state_event: None,
            ..update
        };
        verify(&url, written.expectations(&result))?;

        warn!(url = %url, "GitLab refused to merge, closing with marker instead");
        let fallback = RecordUpdate {
            title: None,
            description: Some(with_marker(
                result.description.as_deref().unwrap_or_default(),
            )),
            state_event: Some(StateEvent::Close),
        };
        let closed = self.target.update_record(record.iid, &fallback).await?;
        verify(&url, fallback.expectations(&closed))?;
        Ok(UpdateKind::ClosedWithMarker)
    }
}

/// Fails on the first expectation GitLab did not meet.
fn verify(url: &str, expectations: Vec<Expectation>) -> Result<(), SyncError> {
    match expectations.into_iter().find(|e| !e.is_met()) {
        None => Ok(()),
        Some(unmet) => Err(SyncError::Verification {
            url: url.to_string(),
            field: unmet.field,
            expected: unmet.expected,
            actual: unmet.actual,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BranchRef, ProposalState, MARKER_TAG};
    use crate::reconcile::NewRecord;
    use crate::testing::{MemoryStore, MemoryTarget, TargetCall};

    fn proposal(number: u64, state: ProposalState, merged_at: Option<&str>) -> Proposal {
        Proposal {
            number,
            state,
            merged_at: merged_at.map(str::to_string),
            title: format!("Pull {number}"),
            body: Some("Body".to_string()),
            base: BranchRef {
                name: "main".to_string(),
            },
            head: BranchRef {
                name: format!("feature-{number}"),
            },
        }
    }

    fn record(number: u64, state: RecordState) -> MirroredRecord {
        MirroredRecord {
            id: number + 100,
            iid: number,
            state,
            title: format!("Pull {number}"),
            description: Some("Body".to_string()),
            source_branch: format!("pull/{number}/head"),
            target_branch: "main".to_string(),
        }
    }

    fn keyed(proposals: Vec<Proposal>) -> BTreeMap<String, Proposal> {
        proposals.into_iter().map(|p| (p.key(), p)).collect()
    }

    async fn identity_of(
        proposals: &BTreeMap<String, Proposal>,
        target: &MemoryTarget,
    ) -> IdentityMap {
        IdentityMap::build(proposals, &target.list_records().await.unwrap())
    }

    fn mirror_with(numbers: &[u64]) -> MemoryStore {
        numbers.iter().fold(
            MemoryStore::default().with_ref("refs/heads/main", "base"),
            |store, n| store.with_ref(&format!("refs/heads/pull/{n}/head"), &format!("h{n}")),
        )
    }

    #[tokio::test]
    async fn creates_merge_request_for_open_pull_request() {
        let proposals = keyed(vec![proposal(7, ProposalState::Open, None)]);
        let store = mirror_with(&[7]);
        let target = MemoryTarget::default();
        let identity = identity_of(&proposals, &target).await;

        let actions = SyncDriver::new(&store, &target)
            .run(&proposals, &identity)
            .await
            .unwrap();

        assert_eq!(
            target.calls(),
            vec![TargetCall::Create(NewRecord {
                title: "Pull 7".to_string(),
                source_branch: "pull/7/head".to_string(),
                target_branch: "main".to_string(),
                description: Some("Body".to_string()),
            })]
        );
        assert_eq!(
            actions,
            vec![SyncAction::Created {
                number: "7".to_string(),
                iid: 1
            }]
        );
    }

    #[tokio::test]
    async fn merged_pull_request_falls_back_to_close_with_marker() {
        let proposals = keyed(vec![proposal(3, ProposalState::Closed, Some("2024-01-01"))]);
        let store = mirror_with(&[3]);
        let target = MemoryTarget::default()
            .with_record(record(3, RecordState::Opened))
            .refusing_merge();
        let identity = identity_of(&proposals, &target).await;

        let actions = SyncDriver::new(&store, &target)
            .run(&proposals, &identity)
            .await
            .unwrap();

        assert_eq!(
            target.calls(),
            vec![
                TargetCall::Update(
                    3,
                    RecordUpdate {
                        state_event: Some(StateEvent::Merge),
                        ..Default::default()
                    }
                ),
                TargetCall::Update(
                    3,
                    RecordUpdate {
                        title: None,
                        description: Some(format!("Body{MARKER_TAG}")),
                        state_event: Some(StateEvent::Close),
                    }
                ),
            ]
        );
        assert_eq!(
            actions,
            vec![SyncAction::Updated {
                number: "3".to_string(),
                iid: 3,
                kind: UpdateKind::ClosedWithMarker
            }]
        );
        assert_eq!(target.record(3).unwrap().state, RecordState::Closed);
    }

    #[tokio::test]
    async fn merge_accepted_needs_no_fallback() {
        let proposals = keyed(vec![proposal(3, ProposalState::Closed, Some("2024-01-01"))]);
        let store = mirror_with(&[3]);
        let target = MemoryTarget::default().with_record(record(3, RecordState::Opened));
        let identity = identity_of(&proposals, &target).await;

        SyncDriver::new(&store, &target)
            .run(&proposals, &identity)
            .await
            .unwrap();

        assert_eq!(target.calls().len(), 1);
        assert_eq!(target.record(3).unwrap().state, RecordState::Merged);
    }

    #[tokio::test]
    async fn deleted_head_is_skipped_without_calls() {
        let proposals = keyed(vec![proposal(5, ProposalState::Open, None)]);
        let store = mirror_with(&[]);
        let target = MemoryTarget::default();
        let identity = identity_of(&proposals, &target).await;

        let actions = SyncDriver::new(&store, &target)
            .run(&proposals, &identity)
            .await
            .unwrap();

        assert!(target.calls().is_empty());
        assert_eq!(
            actions,
            vec![SyncAction::Skipped {
                number: "5".to_string(),
                reason: SkipReason::MissingHead
            }]
        );
    }

    #[tokio::test]
    async fn missing_base_is_skipped() {
        let proposals = keyed(vec![proposal(5, ProposalState::Open, None)]);
        let store = mirror_with(&[5]);
        store.remove_ref("refs/heads/main");
        let target = MemoryTarget::default();
        let identity = identity_of(&proposals, &target).await;

        let actions = SyncDriver::new(&store, &target)
            .run(&proposals, &identity)
            .await
            .unwrap();

        assert!(target.calls().is_empty());
        assert!(matches!(
            actions[0],
            SyncAction::Skipped {
                reason: SkipReason::MissingBase,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn closed_pull_request_is_created_then_closed() {
        let proposals = keyed(vec![proposal(2, ProposalState::Closed, None)]);
        let store = mirror_with(&[2]);
        let target = MemoryTarget::default();
        let identity = identity_of(&proposals, &target).await;

        let actions = SyncDriver::new(&store, &target)
            .run(&proposals, &identity)
            .await
            .unwrap();

        assert_eq!(actions.len(), 2);
        assert_eq!(target.record(1).unwrap().state, RecordState::Closed);
    }

    #[tokio::test]
    async fn second_pass_writes_nothing() {
        let proposals = keyed(vec![
            proposal(1, ProposalState::Open, None),
            proposal(2, ProposalState::Closed, None),
            proposal(3, ProposalState::Closed, Some("2024-01-01")),
            proposal(4, ProposalState::Open, None),
        ]);
        let store = mirror_with(&[1, 2, 3]);
        let target = MemoryTarget::default()
            .with_record(record(3, RecordState::Opened))
            .refusing_merge();

        let identity = identity_of(&proposals, &target).await;
        SyncDriver::new(&store, &target)
            .run(&proposals, &identity)
            .await
            .unwrap();
        let writes = target.calls().len();

        let identity = identity_of(&proposals, &target).await;
        let actions = SyncDriver::new(&store, &target)
            .run(&proposals, &identity)
            .await
            .unwrap();

        assert_eq!(target.calls().len(), writes);
        assert!(actions.iter().all(|a| matches!(
            a,
            SyncAction::Unchanged { .. } | SyncAction::Skipped { .. }
        )));
    }

    #[tokio::test]
    async fn ignored_field_is_a_verification_error() {
        let mut proposal = proposal(4, ProposalState::Open, None);
        proposal.title = "Renamed".to_string();
        let proposals = keyed(vec![proposal]);
        let store = mirror_with(&[4]);
        let target = MemoryTarget::default()
            .with_record(record(4, RecordState::Opened))
            .ignoring_title();
        let identity = identity_of(&proposals, &target).await;

        let error = SyncDriver::new(&store, &target)
            .run(&proposals, &identity)
            .await
            .unwrap_err();

        match error {
            SyncError::Verification {
                url,
                field,
                expected,
                actual,
            } => {
                assert_eq!(url, "memory://user/repo/merge_requests/4");
                assert_eq!(field, "title");
                assert_eq!(expected, "Renamed");
                assert_eq!(actual, "Pull 4");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn first_failure_stops_the_pass() {
        let mut first = proposal(1, ProposalState::Open, None);
        first.title = "Renamed 1".to_string();
        let mut second = proposal(2, ProposalState::Open, None);
        second.title = "Renamed 2".to_string();
        let proposals = keyed(vec![first, second]);
        let store = mirror_with(&[1, 2]);
        let target = MemoryTarget::default()
            .with_record(record(1, RecordState::Opened))
            .with_record(record(2, RecordState::Opened))
            .ignoring_title();
        let identity = identity_of(&proposals, &target).await;

        let result = SyncDriver::new(&store, &target)
            .run(&proposals, &identity)
            .await;

        assert!(matches!(result, Err(SyncError::Verification { .. })));
        assert_eq!(
            target.calls(),
            vec![TargetCall::Update(
                1,
                RecordUpdate {
                    title: Some("Renamed 1".to_string()),
                    ..Default::default()
                }
            )]
        );
        assert_eq!(target.record(2).unwrap().title, "Pull 2");
    }

    #[tokio::test]
    async fn created_record_is_verified() {
        let proposals = keyed(vec![proposal(6, ProposalState::Open, None)]);
        let store = mirror_with(&[6]);
        let target = MemoryTarget::default().forcing_target_branch("develop");
        let identity = identity_of(&proposals, &target).await;

        let error = SyncDriver::new(&store, &target)
            .run(&proposals, &identity)
            .await
            .unwrap_err();

        match error {
            SyncError::Verification {
                field,
                expected,
                actual,
                ..
            } => {
                assert_eq!(field, "target_branch");
                assert_eq!(expected, "main");
                assert_eq!(actual, "develop");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(target.calls().len(), 1);
    }

    #[tokio::test]
    async fn visits_pull_requests_in_key_order() {
        let proposals = keyed(vec![
            proposal(9, ProposalState::Open, None),
            proposal(10, ProposalState::Open, None),
        ]);
        let store = mirror_with(&[9, 10]);
        let target = MemoryTarget::default();
        let identity = identity_of(&proposals, &target).await;

        let actions = SyncDriver::new(&store, &target)
            .run(&proposals, &identity)
            .await
            .unwrap();

        let order: Vec<_> = actions
            .iter()
            .map(|a| match a {
                SyncAction::Created { number, .. } => number.as_str(),
                _ => "",
            })
            .collect();
        assert_eq!(order, vec!["10", "9"]);
    }
}
