//! Reconciled fields and their equivalence rules.

use super::RecordUpdate;
use crate::model::{
    strip_marker, truncate_description, MirroredRecord, Proposal, ProposalState, RecordState,
    StateEvent,
};

/// How a field is compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Lifecycle state, compared through [`state_equal`].
    State,
    /// Free text, compared through [`text_equal`].
    Text,
    /// Compared verbatim.
    Exact,
}

/// A pull request field mirrored onto the merge request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// `state` -> `state` (written through `state_event`).
    State,
    /// `body` -> `description`.
    Body,
    /// `title` -> `title`.
    Title,
}

impl Field {
    /// Every reconciled field, in comparison order.
    pub const ALL: [Field; 3] = [Field::State, Field::Body, Field::Title];

    /// Comparison rule of this field.
    #[must_use]
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::State => FieldKind::State,
            Self::Body => FieldKind::Text,
            Self::Title => FieldKind::Exact,
        }
    }

    /// Name of the field on the merge request.
    #[must_use]
    pub fn remote_name(&self) -> &'static str {
        match self {
            Self::State => "state",
            Self::Body => "description",
            Self::Title => "title",
        }
    }

    /// Whether the merge request already reflects this field.
    #[must_use]
    pub fn is_equal(&self, proposal: &Proposal, record: &MirroredRecord) -> bool {
        match self.kind() {
            FieldKind::State => state_equal(proposal.state, record.state),
            FieldKind::Text => {
                text_equal(proposal.body.as_deref(), record.description.as_deref())
            }
            FieldKind::Exact => proposal.title == record.title,
        }
    }

    /// Records the value this field should take on the merge request.
    pub fn apply(&self, proposal: &Proposal, update: &mut RecordUpdate) {
        match self {
            Self::State => update.state_event = Some(state_event_for(proposal)),
            Self::Body => {
                update.description = Some(truncate_description(
                    proposal.body.as_deref().unwrap_or_default(),
                ));
            }
            Self::Title => update.title = Some(proposal.title.clone()),
        }
    }
}

/// An open pull request matches an opened merge request; a closed one
/// matches a closed or merged merge request.
#[must_use]
pub fn state_equal(proposal: ProposalState, record: RecordState) -> bool {
    matches!(
        (proposal, record),
        (ProposalState::Open, RecordState::Opened)
            | (ProposalState::Closed, RecordState::Closed | RecordState::Merged)
    )
}

/// Compares a pull request body with a merge request description.
///
/// Missing text is empty, the merge marker is ignored and only the
/// mirrored prefix is compared.
#[must_use]
pub fn text_equal(body: Option<&str>, description: Option<&str>) -> bool {
    let body = body.unwrap_or_default();
    let description = strip_marker(description.unwrap_or_default());
    truncate_description(body) == truncate_description(&description)
}

fn state_event_for(proposal: &Proposal) -> StateEvent {
    match proposal.state {
        ProposalState::Open => StateEvent::Reopen,
        ProposalState::Closed if proposal.merged_at.is_some() => StateEvent::Merge,
        ProposalState::Closed => StateEvent::Close,
    }
}
