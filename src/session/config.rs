use crate::drafts::FunctionCall;
use crate::error::ClientError;
use crate::protocol::FunctionDefinition;
use serde::Serialize;
use std::collections::HashSet;

/// Configuration for one streaming session.
///
/// Serialized (minus the endpoint) as the `config` message sent right after
/// the connection opens. A new configuration requires a new session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    /// WebSocket endpoint (e.g., "wss://api.example.com/ws")
    #[serde(skip)]
    pub endpoint: String,

    /// Unique session identifier; generated when left empty
    pub session_id: String,

    /// Locale tag for speech recognition (e.g., "en-US")
    pub language: String,

    #[serde(rename = "stt")]
    pub speech: SpeechConfig,

    #[serde(rename = "functionConfig")]
    pub functions: FunctionConfig,

    /// Prior transcript/functions when resuming a session
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_context: Option<InputContext>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpeechConfig {
    /// Minimum stability (0.0 to 1.0) for interim results to be emitted
    #[serde(rename = "interimStabilityThreshold")]
    pub stability_threshold: f32,

    /// Audio sample rate in Hz
    #[serde(rename = "sampleHertz")]
    pub sample_rate: u32,

    /// Audio encoding hint for the recognizer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionConfig {
    /// How often the service re-evaluates function calls
    #[serde(rename = "updateMs")]
    pub update_interval_ms: u64,

    /// Natural-language extraction instructions
    pub parsing_guide: String,

    pub definitions: Vec<FunctionDefinition>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_transcript: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_functions: Option<Vec<FunctionCall>>,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            stability_threshold: 0.8,
            sample_rate: 16000,
            encoding: None,
        }
    }
}

impl Default for FunctionConfig {
    fn default() -> Self {
        Self {
            update_interval_ms: 800,
            parsing_guide: String::new(),
            definitions: Vec::new(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            endpoint: "ws://localhost:8080/ws".to_string(),
            session_id: uuid::Uuid::new_v4().to_string(),
            language: "en-US".to_string(),
            speech: SpeechConfig::default(),
            functions: FunctionConfig::default(),
            input_context: None,
        }
    }
}

impl SessionConfig {
    pub fn new(endpoint: impl Into<String>, functions: FunctionConfig) -> Self {
        Self {
            endpoint: endpoint.into(),
            functions,
            ..Default::default()
        }
    }

    /// Check the configuration before a session is built from it
    pub fn validate(&self) -> Result<(), ClientError> {
        if !(self.endpoint.starts_with("ws://") || self.endpoint.starts_with("wss://")) {
            return Err(ClientError::Config(format!(
                "endpoint must be a ws:// or wss:// URI, got '{}'",
                self.endpoint
            )));
        }

        if !(0.0..=1.0).contains(&self.speech.stability_threshold) {
            return Err(ClientError::Config(format!(
                "stability threshold must be within 0..=1, got {}",
                self.speech.stability_threshold
            )));
        }

        if self.speech.sample_rate == 0 {
            return Err(ClientError::Config("sample rate must be non-zero".to_string()));
        }

        let mut names = HashSet::new();
        for definition in &self.functions.definitions {
            if !names.insert(definition.name.as_str()) {
                return Err(ClientError::Config(format!(
                    "duplicate function definition '{}'",
                    definition.name
                )));
            }
        }

        Ok(())
    }
}
