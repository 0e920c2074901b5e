//! Merge request write payloads.

use crate::model::{MirroredRecord, StateEvent};
use serde::Serialize;

/// Fields to change on an existing merge request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecordUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_event: Option<StateEvent>,
}

impl RecordUpdate {
    /// Returns true when nothing would change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.state_event.is_none()
    }

    /// Pairs every requested value with what `record` actually holds.
    ///
    /// A `state_event` is checked against the state it leads to.
    #[must_use]
    pub fn expectations(&self, record: &MirroredRecord) -> Vec<Expectation> {
        let mut expectations = Vec::new();
        if let Some(title) = &self.title {
            expectations.push(Expectation::new("title", title, &record.title));
        }
        if let Some(description) = &self.description {
            expectations.push(Expectation::new(
                "description",
                description,
                record.description.as_deref().unwrap_or_default(),
            ));
        }
        if let Some(event) = &self.state_event {
            expectations.push(Expectation::new(
                "state",
                event.resulting_state().as_str(),
                record.state.as_str(),
            ));
        }
        expectations
    }
}

/// Fields of a merge request to create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewRecord {
    pub title: String,

    pub source_branch: String,

    pub target_branch: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl NewRecord {
    /// Pairs every requested value with what `record` actually holds.
    #[must_use]
    pub fn expectations(&self, record: &MirroredRecord) -> Vec<Expectation> {
        let mut expectations = vec![
            Expectation::new("title", &self.title, &record.title),
            Expectation::new("source_branch", &self.source_branch, &record.source_branch),
            Expectation::new("target_branch", &self.target_branch, &record.target_branch),
        ];
        if let Some(description) = &self.description {
            expectations.push(Expectation::new(
                "description",
                description,
                record.description.as_deref().unwrap_or_default(),
            ));
        }
        expectations
    }
}

/// A requested field value next to the value GitLab returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expectation {
    pub field: &'static str,
    pub expected: String,
    pub actual: String,
}

impl Expectation {
    fn new(field: &'static str, expected: &str, actual: &str) -> Self {
        Self {
            field,
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Whether the returned value matches, ignoring surrounding whitespace
    /// and line breaks GitLab may normalize.
    #[must_use]
    pub fn is_met(&self) -> bool {
        normalize(&self.expected) == normalize(&self.actual)
    }
}

fn normalize(value: &str) -> String {
    value.trim().replace(['\n', '\r'], "")
}
