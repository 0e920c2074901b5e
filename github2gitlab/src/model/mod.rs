//! Data shared by the mirroring and reconciliation passes.
//!
//! - [`Proposal`] - a GitHub pull request, read-only to this crate
//! - [`MirroredRecord`] - the GitLab merge request mirroring a proposal
//! - [`Ref`], [`RefLookup`] and [`Commit`] - refs inside the local mirror clone

mod proposal;
mod record;
mod refs;

pub use proposal::{BranchRef, Proposal, ProposalState};
pub use record::{MirroredRecord, RecordState, StateEvent};
pub use refs::{Commit, Ref, RefLookup};

/// Longest description mirrored into GitLab, in characters.
pub const DESCRIPTION_MAX: usize = 1024;

/// Suffix added to the description of a record that was closed because
/// GitLab refused to mark it merged.
pub const MARKER_TAG: &str = ":MERGED:";

/// Truncates a description to [`DESCRIPTION_MAX`] characters.
#[must_use]
pub fn truncate_description(text: &str) -> String {
    text.chars().take(DESCRIPTION_MAX).collect()
}

/// Appends [`MARKER_TAG`] to a description.
#[must_use]
pub fn with_marker(description: &str) -> String {
    format!("{description}{MARKER_TAG}")
}

/// Removes every [`MARKER_TAG`] from a description.
#[must_use]
pub fn strip_marker(description: &str) -> String {
    description.replace(MARKER_TAG, "")
}
