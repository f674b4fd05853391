use super::state::AppState;
use crate::error::ClientError;
use crate::transport::ConnectionStatus;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct UpdateFieldRequest {
    /// Raw value; numeric and boolean fields also accept strings
    pub value: Value,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub session_id: String,
    pub status: String,
    pub connection_status: ConnectionStatus,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn status_response(state: &AppState, status: &str) -> Json<StatusResponse> {
    Json(StatusResponse {
        session_id: state.session.session_id().to_string(),
        status: status.to_string(),
        connection_status: state.session.connection_status(),
    })
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /session/state
/// Full observable state of the session
pub async fn get_state(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.session.state()))
}

/// POST /session/connect
pub async fn connect(State(state): State<AppState>) -> impl IntoResponse {
    info!("Connect requested for session {}", state.session.session_id());
    state.session.connect();
    (StatusCode::ACCEPTED, status_response(&state, "connecting"))
}

/// POST /session/disconnect
/// Stops any recording first
pub async fn disconnect(State(state): State<AppState>) -> impl IntoResponse {
    info!("Disconnect requested for session {}", state.session.session_id());
    state.session.disconnect().await;
    (StatusCode::OK, status_response(&state, "disconnected"))
}

/// POST /session/recording/start
pub async fn start_recording(State(state): State<AppState>) -> impl IntoResponse {
    if !state.session.start_recording() {
        return (
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                error: "Session is not connected".to_string(),
            }),
        )
            .into_response();
    }

    (StatusCode::ACCEPTED, status_response(&state, "starting")).into_response()
}

/// POST /session/recording/stop
pub async fn stop_recording(State(state): State<AppState>) -> impl IntoResponse {
    state.session.stop_recording().await;
    (StatusCode::OK, status_response(&state, "stopped"))
}

/// POST /session/clear
pub async fn clear_session(State(state): State<AppState>) -> impl IntoResponse {
    state.session.clear_session();
    (StatusCode::OK, status_response(&state, "cleared"))
}

/// PUT /session/fields/:identifier
/// Set a form field by hand
pub async fn update_field(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
    Json(req): Json<UpdateFieldRequest>,
) -> impl IntoResponse {
    match state.session.update_field(&identifier, req.value) {
        Ok(()) => match state.session.state().fields.get(&identifier) {
            Some(field) => (StatusCode::OK, Json(field.clone())).into_response(),
            None => StatusCode::NO_CONTENT.into_response(),
        },
        Err(e @ ClientError::Validation { .. }) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            warn!("Field update failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
