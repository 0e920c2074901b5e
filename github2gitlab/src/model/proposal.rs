//! GitHub pull requests.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposalState {
    Open,
    Closed,
}

/// Branch end of a pull request (`base` or `head`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchRef {
    /// Branch name, e.g. "main".
    #[serde(rename = "ref")]
    pub name: String,
}

/// A pull request as listed by the GitHub API.
///
/// Only the fields the reconciliation needs are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    /// Pull request number.
    pub number: u64,

    /// Open or closed.
    pub state: ProposalState,

    /// When the pull request was merged, if it was.
    #[serde(default)]
    pub merged_at: Option<String>,

    /// Title.
    #[serde(default)]
    pub title: String,

    /// Body text; GitHub sends `null` for an empty body.
    #[serde(default)]
    pub body: Option<String>,

    /// Branch the pull request targets.
    pub base: BranchRef,

    /// Branch the pull request proposes.
    pub head: BranchRef,
}

impl Proposal {
    /// Key used to order and index pull requests.
    ///
    /// Numbers are compared as strings, so "10" sorts before "9".
    #[must_use]
    pub fn key(&self) -> String {
        self.number.to_string()
    }

    /// Whether the pull request was closed by merging it.
    #[must_use]
    pub fn is_merged(&self) -> bool {
        self.state == ProposalState::Closed && self.merged_at.is_some()
    }
}
