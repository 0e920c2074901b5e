//! Promotion of GitHub pull request refs into the mirror.
//!
//! GitHub exposes `refs/pull/<N>/head` (the tip of the pull request) and
//! `refs/pull/<N>/merge` (a test merge of that tip into the base branch).
//! The merge ref is recomputed whenever the base moves, so it is only
//! published when it tests the current head and the head moved since the
//! last pass.

mod decision;

pub use decision::{evaluate, Decision, PromotionKind};

use crate::git::{GitError, RefStore};
use crate::model::{Ref, RefLookup};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Namespace GitHub pull request refs are fetched into.
pub const FETCHED_PULL_PREFIX: &str = "refs/remotes/origin/pull/";

/// Namespace promoted pull request refs live in, and are pushed from.
pub const MIRRORED_PULL_PREFIX: &str = "refs/heads/pull/";

/// A pull request whose refs were written into the mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Promotion {
    /// Pull request number.
    pub number: String,
    /// Head commit now recorded for the pull request.
    pub head: String,
    /// Merge test commit now recorded for the pull request.
    pub merge: String,
    /// Whether the refs were created or moved.
    pub kind: PromotionKind,
}

/// Head and merge refs fetched for one pull request.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct FetchedPull {
    head: Option<String>,
    merge: Option<String>,
}

/// Name of the promoted head ref of pull request `number`.
#[must_use]
pub fn mirrored_head_ref(number: &str) -> String {
    format!("{MIRRORED_PULL_PREFIX}{number}/head")
}

/// Name of the promoted merge test ref of pull request `number`.
#[must_use]
pub fn mirrored_merge_ref(number: &str) -> String {
    format!("{MIRRORED_PULL_PREFIX}{number}/merge")
}

/// Promotes every fetched pull request whose merge test commit is current.
///
/// For each pull request exposing both a head and a merge ref, the merge
/// commit's second parent must be the head; the refs are then written only
/// if the mirror's recorded head differs. Head and merge are written in a
/// single transaction.
///
/// # Errors
///
/// Returns [`GitError`] if reading or writing refs fails.
pub async fn promote_merge_refs<S: RefStore + ?Sized>(
    store: &S,
) -> Result<Vec<Promotion>, GitError> {
    let fetched = group_fetched_pulls(store.list_refs(FETCHED_PULL_PREFIX).await?);
    let mut promotions = Vec::new();

    for (number, pull) in fetched {
        let Some(head) = pull.head else {
            debug!(number = %number, "Merge ref without head, ignore");
            continue;
        };
        let Some(merge) = pull.merge else {
            debug!(number = %number, "Pull request cannot merge, ignore");
            continue;
        };

        let merge_commit = store.read_commit(&merge).await?;
        let known_head = store.resolve(&mirrored_head_ref(&number)).await?;

        match evaluate(&head, &merge_commit, &known_head) {
            Decision::StaleMerge => {
                debug!(number = %number, "Merge is obsolete, skip");
            }
            Decision::HeadUnmoved => {
                debug!(number = %number, "Head has not moved, skip");
            }
            Decision::Promote(kind) => {
                store
                    .write_refs(&[
                        Ref::new(mirrored_head_ref(&number), head.clone()),
                        Ref::new(mirrored_merge_ref(&number), merge.clone()),
                    ])
                    .await?;
                info!(
                    number = %number,
                    action = kind.as_str(),
                    head = %head,
                    merge = %merge,
                    "Promoted pull request refs"
                );
                promotions.push(Promotion {
                    number,
                    head,
                    merge,
                    kind,
                });
            }
        }
    }

    Ok(promotions)
}

/// Groups `<prefix><N>/head` and `<prefix><N>/merge` refs by pull request.
fn group_fetched_pulls(refs: Vec<Ref>) -> BTreeMap<String, FetchedPull> {
    let mut pulls: BTreeMap<String, FetchedPull> = BTreeMap::new();

    for r in refs {
        let Some(rest) = r.name.strip_prefix(FETCHED_PULL_PREFIX) else {
            continue;
        };
        let Some((number, kind)) = rest.split_once('/') else {
            continue;
        };
        if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) {
            continue;
        }

        let entry = pulls.entry(number.to_string()).or_default();
        match kind {
            "head" => entry.head = Some(r.target),
            "merge" => entry.merge = Some(r.target),
            _ => {}
        }
    }

    pulls
}

/// Whether a lookup of the promoted head matches `head`.
pub(crate) fn head_unmoved(known_head: &RefLookup, head: &str) -> bool {
    known_head.commit() == Some(head)
}
