use crate::audio::AudioBackendConfig;
use crate::session::{FunctionConfig, SessionConfig, SpeechConfig};
use crate::templates::{function_definitions, parsing_guide, Template, TimeContext};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub client: ClientConfig,
    pub speech: SpeechSettings,
    pub functions: FunctionSettings,
    pub audio: AudioSettings,
    pub templates: TemplateSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// WebSocket endpoint of the inference service
    pub endpoint: String,
    pub language: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpeechSettings {
    pub stability_threshold: f32,
    pub sample_rate: u32,
    pub encoding: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FunctionSettings {
    pub update_interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    pub chunk_ms: u64,
    /// Input device name for microphone capture; the default device if unset
    pub device: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TemplateSettings {
    /// JSON template file; the built-in templates are used if unset
    pub path: Option<PathBuf>,
    /// Template selected when none is given on the command line
    pub default: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "voiceform".to_string(),
            http: HttpConfig::default(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 3030,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "ws://localhost:8080/ws".to_string(),
            language: "en-US".to_string(),
        }
    }
}

impl Default for SpeechSettings {
    fn default() -> Self {
        let speech = SpeechConfig::default();
        Self {
            stability_threshold: speech.stability_threshold,
            sample_rate: speech.sample_rate,
            encoding: speech.encoding,
        }
    }
}

impl Default for FunctionSettings {
    fn default() -> Self {
        Self {
            update_interval_ms: FunctionConfig::default().update_interval_ms,
        }
    }
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            chunk_ms: AudioBackendConfig::default().chunk_ms,
            device: None,
        }
    }
}

impl Config {
    /// Load `path` (extension optional), then apply `VOICEFORM__SECTION__KEY`
    /// environment overrides
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("VOICEFORM").separator("__"))
            .build()
            .with_context(|| format!("Failed to load config from {}", path))?;

        settings
            .try_deserialize()
            .context("Invalid configuration")
    }

    /// Session configuration for filling in `template`
    pub fn session_config(&self, template: &Template, time: &TimeContext) -> SessionConfig {
        SessionConfig {
            endpoint: self.client.endpoint.clone(),
            language: self.client.language.clone(),
            speech: SpeechConfig {
                stability_threshold: self.speech.stability_threshold,
                sample_rate: self.speech.sample_rate,
                encoding: self.speech.encoding.clone(),
            },
            functions: FunctionConfig {
                update_interval_ms: self.functions.update_interval_ms,
                parsing_guide: parsing_guide(template, time),
                definitions: function_definitions(template),
            },
            ..Default::default()
        }
    }

    pub fn backend_config(&self) -> AudioBackendConfig {
        AudioBackendConfig {
            target_sample_rate: self.speech.sample_rate,
            chunk_ms: self.audio.chunk_ms,
        }
    }
}
