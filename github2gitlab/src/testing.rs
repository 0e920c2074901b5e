//! In-memory collaborators shared by unit tests.

use crate::git::{GitError, RefStore};
use crate::gitlab::{GitLabError, RecordTarget};
use crate::model::{Commit, MirroredRecord, Ref, RefLookup, RecordState, StateEvent};
use crate::reconcile::{NewRecord, RecordUpdate};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

/// Ref store with a fixed commit graph.
#[derive(Default)]
pub(crate) struct MemoryStore {
    refs: Mutex<BTreeMap<String, String>>,
    commits: HashMap<String, Vec<String>>,
    writes: Mutex<Vec<Vec<Ref>>>,
}

impl MemoryStore {
    pub(crate) fn with_ref(self, name: &str, target: &str) -> Self {
        self.refs
            .lock()
            .unwrap()
            .insert(name.to_string(), target.to_string());
        self
    }

    pub(crate) fn with_commit(mut self, hash: &str, parents: &[&str]) -> Self {
        self.commits.insert(
            hash.to_string(),
            parents.iter().map(|p| p.to_string()).collect(),
        );
        self
    }

    pub(crate) fn remove_ref(&self, name: &str) {
        self.refs.lock().unwrap().remove(name);
    }

    pub(crate) fn ref_target(&self, name: &str) -> Option<String> {
        self.refs.lock().unwrap().get(name).cloned()
    }

    pub(crate) fn write_count(&self) -> usize {
        self.writes.lock().unwrap().len()
    }
}

#[async_trait]
impl RefStore for MemoryStore {
    async fn list_refs(&self, prefix: &str) -> Result<Vec<Ref>, GitError> {
        Ok(self
            .refs
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _)| name.starts_with(prefix))
            .map(|(name, target)| Ref::new(name.clone(), target.clone()))
            .collect())
    }

    async fn read_commit(&self, revision: &str) -> Result<Commit, GitError> {
        Ok(Commit {
            hash: revision.to_string(),
            parents: self.commits.get(revision).cloned().unwrap_or_default(),
        })
    }

    async fn resolve(&self, revision: &str) -> Result<RefLookup, GitError> {
        Ok(match self.ref_target(revision) {
            Some(target) => RefLookup::Found(target),
            None => RefLookup::Missing,
        })
    }

    async fn write_refs(&self, refs: &[Ref]) -> Result<(), GitError> {
        let mut stored = self.refs.lock().unwrap();
        for r in refs {
            stored.insert(r.name.clone(), r.target.clone());
        }
        self.writes.lock().unwrap().push(refs.to_vec());
        Ok(())
    }
}

/// A write received by [`MemoryTarget`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TargetCall {
    Create(NewRecord),
    Update(u64, RecordUpdate),
}

/// GitLab project kept in memory.
///
/// With `refuse_merge`, a merge event leaves the record opened, the way
/// GitLab answers when it cannot merge.
#[derive(Default)]
pub(crate) struct MemoryTarget {
    records: Mutex<BTreeMap<u64, MirroredRecord>>,
    calls: Mutex<Vec<TargetCall>>,
    refuse_merge: bool,
    ignore_title: bool,
    forced_target_branch: Option<String>,
}

impl MemoryTarget {
    pub(crate) fn with_record(self, record: MirroredRecord) -> Self {
        self.records.lock().unwrap().insert(record.iid, record);
        self
    }

    pub(crate) fn refusing_merge(mut self) -> Self {
        self.refuse_merge = true;
        self
    }

    /// Accepts title changes without storing them.
    pub(crate) fn ignoring_title(mut self) -> Self {
        self.ignore_title = true;
        self
    }

    /// Stores every new record against `branch`, whatever was requested.
    pub(crate) fn forcing_target_branch(mut self, branch: &str) -> Self {
        self.forced_target_branch = Some(branch.to_string());
        self
    }

    pub(crate) fn calls(&self) -> Vec<TargetCall> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn record(&self, iid: u64) -> Option<MirroredRecord> {
        self.records.lock().unwrap().get(&iid).cloned()
    }
}

#[async_trait]
impl RecordTarget for MemoryTarget {
    async fn list_records(&self) -> Result<BTreeMap<u64, MirroredRecord>, GitLabError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .values()
            .map(|r| (r.id, r.clone()))
            .collect())
    }

    async fn create_record(&self, record: &NewRecord) -> Result<MirroredRecord, GitLabError> {
        self.calls
            .lock()
            .unwrap()
            .push(TargetCall::Create(record.clone()));

        let mut records = self.records.lock().unwrap();
        let iid = records.keys().next_back().map_or(1, |iid| iid + 1);
        let created = MirroredRecord {
            id: iid + 100,
            iid,
            state: RecordState::Opened,
            title: record.title.clone(),
            description: record.description.clone(),
            source_branch: record.source_branch.clone(),
            target_branch: self
                .forced_target_branch
                .clone()
                .unwrap_or_else(|| record.target_branch.clone()),
        };
        records.insert(iid, created.clone());
        Ok(created)
    }

    async fn update_record(
        &self,
        iid: u64,
        update: &RecordUpdate,
    ) -> Result<MirroredRecord, GitLabError> {
        self.calls
            .lock()
            .unwrap()
            .push(TargetCall::Update(iid, update.clone()));

        let mut records = self.records.lock().unwrap();
        let record = records.get_mut(&iid).ok_or_else(|| GitLabError::UnexpectedStatus {
            url: self.record_url(iid),
            status: 404,
            body: "404 Not found".to_string(),
        })?;

        if let Some(title) = &update.title {
            if !self.ignore_title {
                record.title = title.clone();
            }
        }
        if let Some(description) = &update.description {
            record.description = Some(description.clone());
        }
        match update.state_event {
            Some(StateEvent::Merge) if self.refuse_merge => {}
            Some(event) => record.state = event.resulting_state(),
            None => {}
        }
        Ok(record.clone())
    }

    fn record_url(&self, iid: u64) -> String {
        format!("memory://user/repo/merge_requests/{iid}")
    }
}
