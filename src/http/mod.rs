//! HTTP API for controlling the running session
//!
//! - GET /health - Health check
//! - GET /session/state - Transcript, drafts, fields and connection status
//! - POST /session/connect - Open the connection
//! - POST /session/disconnect - Stop recording and close the connection
//! - POST /session/recording/start - Start recording (409 unless connected)
//! - POST /session/recording/stop - Stop recording
//! - POST /session/clear - Reset transcript, drafts and fields
//! - PUT /session/fields/:identifier - Set a field by hand (422 if invalid)

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
