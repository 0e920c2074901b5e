//! Merge request store the reconciliation writes to.

use super::GitLabError;
use crate::model::MirroredRecord;
use crate::reconcile::{NewRecord, RecordUpdate};
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Merge requests of the GitLab project.
///
/// [`GitLabClient`](super::GitLabClient) implements it over HTTP; tests use
/// an in-memory target.
#[async_trait]
pub trait RecordTarget: Send + Sync {
    /// Lists every merge request, whatever its state, keyed by id.
    async fn list_records(&self) -> Result<BTreeMap<u64, MirroredRecord>, GitLabError>;

    /// Creates a merge request and returns it as stored.
    async fn create_record(&self, record: &NewRecord) -> Result<MirroredRecord, GitLabError>;

    /// Updates the merge request `iid` and returns it as stored.
    async fn update_record(
        &self,
        iid: u64,
        update: &RecordUpdate,
    ) -> Result<MirroredRecord, GitLabError>;

    /// Web URL of the merge request `iid`, for diagnostics.
    fn record_url(&self, iid: u64) -> String;
}
