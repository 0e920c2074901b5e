//! Promotion decision for a single pull request.

use super::head_unmoved;
use crate::model::{Commit, RefLookup};

/// Whether promoted refs are new or replace earlier ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromotionKind {
    Create,
    Update,
}

impl PromotionKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
        }
    }
}

/// What to do with a pull request exposing both head and merge refs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The merge test was computed against an earlier head.
    StaleMerge,
    /// The mirror already records this head.
    HeadUnmoved,
    /// Record head and merge test in the mirror.
    Promote(PromotionKind),
}

/// Decides whether the head and merge refs of a pull request are promoted.
///
/// `known_head` is the head currently recorded in the mirror.
#[must_use]
pub fn evaluate(head: &str, merge: &Commit, known_head: &RefLookup) -> Decision {
    if merge.merged_parent() != Some(head) {
        return Decision::StaleMerge;
    }
    if head_unmoved(known_head, head) {
        return Decision::HeadUnmoved;
    }
    match known_head {
        RefLookup::Found(_) => Decision::Promote(PromotionKind::Update),
        RefLookup::Missing => Decision::Promote(PromotionKind::Create),
    }
}
