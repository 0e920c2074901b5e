//! Refs and commits of the local mirror clone.

/// A named ref and the commit it points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ref {
    /// Full ref name, e.g. `refs/heads/pull/7/head`.
    pub name: String,
    /// Commit hash.
    pub target: String,
}

impl Ref {
    pub fn new(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
        }
    }
}

/// Outcome of resolving a revision in the mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefLookup {
    /// The revision resolves to this commit hash.
    Found(String),
    /// The revision is unknown, e.g. a deleted branch.
    Missing,
}

impl RefLookup {
    /// Returns true when the revision resolved.
    #[must_use]
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    /// Returns the commit hash when the revision resolved.
    #[must_use]
    pub fn commit(&self) -> Option<&str> {
        match self {
            Self::Found(hash) => Some(hash),
            Self::Missing => None,
        }
    }
}

/// A commit and its parents, first parent first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub hash: String,
    pub parents: Vec<String>,
}

impl Commit {
    /// Second parent of a merge commit: the branch that was merged in.
    #[must_use]
    pub fn merged_parent(&self) -> Option<&str> {
        self.parents.get(1).map(String::as_str)
    }
}
