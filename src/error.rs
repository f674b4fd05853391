use serde::Serialize;
use thiserror::Error;

/// Errors surfaced by the voice-to-form client.
///
/// Transport and media errors never cross the public API as `Err` values; they
/// are published through the session's error slot. Validation errors are the
/// exception and are returned directly from manual field edits.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ClientError {
    /// Connection-level failure (cannot open, socket error, unexpected close)
    #[error("transport error: {0}")]
    Transport(String),

    /// Audio source unavailable or permission denied
    #[error("media error: {0}")]
    Media(String),

    /// Structurally invalid inbound message
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Error reported by the remote service through an `error` message
    #[error("remote error: {0}")]
    Remote(String),

    /// Manual field value rejected by type checking
    #[error("invalid value for field '{field}': {reason}")]
    Validation { field: String, reason: String },

    /// Session configuration rejected before connecting
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ClientError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
