//! GitLab merge requests.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a merge request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordState {
    Opened,
    Closed,
    Merged,
}

impl RecordState {
    /// Returns the state as GitLab spells it.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Opened => "opened",
            Self::Closed => "closed",
            Self::Merged => "merged",
        }
    }
}

/// Transition requested through the `state_event` parameter of a
/// merge request update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateEvent {
    Reopen,
    Close,
    Merge,
}

impl StateEvent {
    /// State a merge request is in once the event was applied.
    #[must_use]
    pub fn resulting_state(&self) -> RecordState {
        match self {
            Self::Merge => RecordState::Merged,
            Self::Reopen => RecordState::Opened,
            Self::Close => RecordState::Closed,
        }
    }

    /// Returns the event as GitLab spells it.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reopen => "reopen",
            Self::Close => "close",
            Self::Merge => "merge",
        }
    }
}

/// A merge request as returned by the GitLab API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirroredRecord {
    /// Instance-wide id.
    pub id: u64,

    /// Project-scoped id used in URLs and updates.
    pub iid: u64,

    /// Opened, closed or merged.
    pub state: RecordState,

    /// Title.
    #[serde(default)]
    pub title: String,

    /// Description; GitLab sends `null` when empty.
    #[serde(default)]
    pub description: Option<String>,

    /// Source branch, `pull/<N>/head` for mirrored pull requests.
    pub source_branch: String,

    /// Target branch.
    pub target_branch: String,
}
