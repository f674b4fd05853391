use super::form::FieldValue;
use crate::drafts::{FunctionCall, FunctionDraft};
use crate::error::ClientError;
use crate::protocol::{TranscriptMessage, Word};
use crate::transport::ConnectionStatus;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Accumulated confirmed transcript
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalTranscript {
    pub text: String,
    pub words: Vec<Word>,
    /// Confidence of the latest fragment that carried one
    pub confidence: f64,
}

impl FinalTranscript {
    /// Append a final fragment, joined with a single space.
    ///
    /// Fragments are not deduplicated: a fragment delivered twice appears
    /// twice.
    pub fn append(&mut self, fragment: &TranscriptMessage) {
        let incoming = fragment.text.trim();
        if !incoming.is_empty() {
            let current = self.text.trim_end();
            self.text = if current.is_empty() {
                incoming.to_string()
            } else {
                format!("{} {}", current, incoming)
            };
        }

        self.words.extend(fragment.words.iter().cloned());

        if let Some(confidence) = fragment.confidence {
            self.confidence = confidence;
        }
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// Latest unconfirmed hypothesis, replaced wholesale on every update
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterimTranscript {
    pub text: String,
    pub words: Vec<Word>,
    pub confidence: Option<f64>,
    pub stability: Option<f64>,
}

impl From<TranscriptMessage> for InterimTranscript {
    fn from(message: TranscriptMessage) -> Self {
        Self {
            text: message.text,
            words: message.words,
            confidence: message.confidence,
            stability: message.stability,
        }
    }
}

/// Statistics about the current session
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    /// Words in the final transcript
    pub word_count: usize,

    /// Confirmed argument updates received (an `id` argument is not counted)
    pub confirmed_field_updates: usize,

    /// Stability of the most recent interim result
    pub latest_stability: Option<f64>,

    /// When the latest recording started
    pub recording_started_at: Option<DateTime<Utc>>,
}

/// Everything a consumer binds against, published as one value
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub transcript_final: FinalTranscript,
    pub transcript_interim: InterimTranscript,

    /// Latest confirmed batch
    pub functions: Vec<FunctionCall>,

    /// Draft snapshot, highest score first
    pub drafts: Vec<FunctionDraft>,

    pub connection_status: ConnectionStatus,
    pub is_recording: bool,
    pub error: Option<ClientError>,

    /// Session id echoed by the server's `ack`
    pub acknowledged_session: Option<String>,

    /// Form values projected from confirmed calls, drafts and manual edits
    pub fields: BTreeMap<String, FieldValue>,

    pub stats: SessionStats,
}
