use super::casing::{from_wire_keys, to_wire_keys};
use crate::drafts::{DraftCandidate, FunctionCall};
use crate::error::ClientError;
use crate::session::SessionConfig;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Read an explicit `null` the same as a missing field
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// A recognized word with timing, in seconds from the start of the stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub text: String,
    pub start: f64,
    pub end: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

/// Transcript fragment, final or interim
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TranscriptMessage {
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,

    #[serde(rename = "final")]
    pub is_final: bool,

    #[serde(default)]
    pub confidence: Option<f64>,

    #[serde(default)]
    pub stability: Option<f64>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub words: Vec<Word>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AckMessage {
    #[serde(rename = "sessionId", default, deserialize_with = "null_as_default")]
    pub session_id: String,
}

/// Confirmed function batch
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FunctionsMessage {
    #[serde(default, deserialize_with = "null_as_default")]
    pub functions: Vec<FunctionCall>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DraftMessage {
    /// Older servers send the payload under `draft_function`
    #[serde(alias = "draftFunction")]
    pub data: DraftCandidate,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ErrorMessage {
    #[serde(default, deserialize_with = "null_as_default")]
    pub err: String,
}

/// Every inbound message kind the client acts on
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Ack(AckMessage),
    Transcript(TranscriptMessage),
    Functions(FunctionsMessage),
    FunctionDraftExtracted(DraftMessage),
    SessionEnd {},
    Error(ErrorMessage),
}

const KNOWN_TYPES: [&str; 6] = [
    "ack",
    "transcript",
    "functions",
    "function_draft_extracted",
    "session_end",
    "error",
];

/// Parse one inbound text frame.
///
/// Returns `Ok(None)` for a well-formed message of a type this client does
/// not know, so newer servers can add message kinds.
pub fn parse_server_message(text: &str) -> Result<Option<ServerMessage>, ClientError> {
    let raw: Value = serde_json::from_str(text)
        .map_err(|e| ClientError::Protocol(format!("malformed JSON from server: {}", e)))?;

    let value = from_wire_keys(raw);

    let kind = match value.get("type").and_then(Value::as_str) {
        Some(kind) => kind.to_string(),
        None => {
            return Err(ClientError::Protocol(
                "server message has no type".to_string(),
            ))
        }
    };

    if !KNOWN_TYPES.contains(&kind.as_str()) {
        return Ok(None);
    }

    serde_json::from_value(value)
        .map(Some)
        .map_err(|e| ClientError::Protocol(format!("invalid '{}' message: {}", kind, e)))
}

/// Framing control messages sent by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMessage {
    /// Precedes the first audio chunk of a recording
    AudioStart,
    /// Ends a recording
    AudioStop,
}

impl ControlMessage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlMessage::AudioStart => "audio_start",
            ControlMessage::AudioStop => "audio_stop",
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::json!({ "type": self.as_str() }).to_string()
    }
}

/// The `config` message that opens every connection, in wire casing
pub fn config_payload(config: &SessionConfig) -> Result<String, ClientError> {
    let mut value = serde_json::to_value(config)
        .map_err(|e| ClientError::Config(format!("cannot serialize session config: {}", e)))?;

    if let Value::Object(map) = &mut value {
        map.insert("type".to_string(), Value::String("config".to_string()));
    }

    Ok(to_wire_keys(value).to_string())
}
