pub mod audio;
pub mod config;
pub mod drafts;
pub mod error;
pub mod http;
pub mod protocol;
pub mod session;
pub mod templates;
pub mod transport;

pub use audio::{
    AudioBackend, AudioBackendConfig, AudioBackendFactory, AudioCaptureBridge, AudioChunk,
    AudioFile, AudioSource, WavFileBackend,
};
pub use config::Config;
pub use drafts::{DraftCandidate, DraftManager, DraftStatus, FunctionCall, FunctionDraft};
pub use error::ClientError;
pub use http::{create_router, AppState};
pub use protocol::{FunctionDefinition, ParamType, ParameterSchema, ServerMessage};
pub use session::{Session, SessionConfig, SessionState};
pub use templates::{Template, TemplateStore, TimeContext};
pub use transport::{ClientEvent, ConnectionStatus, Connector, TransportClient};
