//! Session facade
//!
//! `Session` ties the transport, the audio bridge and the draft engine
//! together and exposes one observable `SessionState`:
//! - final and interim transcript
//! - confirmed function calls and the draft list
//! - connection status, recording flag and the last error
//! - form field values projected from calls, drafts and manual edits

mod config;
pub mod form;
mod session;
mod state;

pub use config::{FunctionConfig, InputContext, SessionConfig, SpeechConfig};
pub use form::{FieldCatalog, FieldValue};
pub use session::Session;
pub use state::{FinalTranscript, InterimTranscript, SessionState, SessionStats};
