//! What a sync pass did with each pull request.

/// Why a pull request was left without a merge request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// `refs/heads/pull/<N>/head` is not in the mirror.
    MissingHead,
    /// The base branch is not in the mirror.
    MissingBase,
}

impl SkipReason {
    /// Short label for logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingHead => "head ref not mirrored",
            Self::MissingBase => "base branch not mirrored",
        }
    }
}

/// How an update reached GitLab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateKind {
    /// Written as computed.
    Applied,
    /// GitLab refused the merge; the record was closed and its description
    /// marked instead.
    ClosedWithMarker,
}

/// A single step taken for a pull request.
///
/// A new merge request that still diverges after creation yields both
/// `Created` and `Updated`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncAction {
    Skipped { number: String, reason: SkipReason },
    Created { number: String, iid: u64 },
    Updated { number: String, iid: u64, kind: UpdateKind },
    Unchanged { number: String, iid: u64 },
}
