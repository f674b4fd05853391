use crate::protocol::messages::null_as_default;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Argument mapping of a function call (parameter name → value)
pub type FunctionArgs = Map<String, Value>;

/// A function call confirmed by the remote service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub args: FunctionArgs,
}

impl FunctionCall {
    pub fn new(name: impl Into<String>, args: FunctionArgs) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

/// Lifecycle of a stored draft
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftStatus {
    /// Tentative proposal, nothing confirmed for this field yet
    PendingConfirmation,
    /// The service confirmed this field
    ConfirmedByLlm,
    /// A new proposal arrived for a field that was already confirmed
    AwaitingPotentialUpdate,
}

/// A tentative proposal as delivered by the service.
///
/// Carries no status: the draft manager decides what status gets stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftCandidate {
    pub draft_id: String,

    pub name: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub args: FunctionArgs,

    pub similarity_score: f64,

    /// Creation/update time as reported by the service
    #[serde(default, deserialize_with = "null_as_default")]
    pub timestamp: String,
}

/// A stored draft
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionDraft {
    pub draft_id: String,
    pub name: String,
    pub args: FunctionArgs,
    pub similarity_score: f64,
    pub status: DraftStatus,
    pub timestamp: String,
}

impl FunctionDraft {
    pub(crate) fn from_candidate(candidate: DraftCandidate, status: DraftStatus) -> Self {
        Self {
            draft_id: candidate.draft_id,
            name: candidate.name,
            args: candidate.args,
            similarity_score: candidate.similarity_score,
            status,
            timestamp: candidate.timestamp,
        }
    }
}
