use crate::drafts::{DraftCandidate, FunctionCall};
use crate::error::ClientError;
use crate::protocol::TranscriptMessage;
use serde::{Deserialize, Serialize};

/// Lifecycle of the streaming connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// Notifications from the transport and the audio bridge, delivered in order
/// over a single channel
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    Status(ConnectionStatus),
    Ack { session_id: String },
    Transcript(TranscriptMessage),
    Functions(Vec<FunctionCall>),
    Draft(DraftCandidate),
    /// The connection ended, gracefully or not
    SessionEnded,
    Recording(bool),
    Error(ClientError),
}
