//! Wire protocol spoken with the inference service
//!
//! Outbound: a `config` message once per connection, `audio_start` /
//! `audio_stop` framing messages, and raw binary audio chunks.
//! Inbound: `ack`, `transcript`, `functions`, `function_draft_extracted`,
//! `session_end` and `error` JSON messages.

pub mod casing;
pub mod messages;
pub mod schema;

pub use casing::{from_wire_keys, to_camel_case, to_snake_case, to_wire_keys};
pub use messages::{
    config_payload, parse_server_message, AckMessage, ControlMessage, DraftMessage, ErrorMessage,
    FunctionsMessage, ServerMessage, TranscriptMessage, Word,
};
pub use schema::{FunctionDefinition, ParamType, ParameterSchema};
