// Integration tests for the HTTP control surface

mod common;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use common::{accept, wait_until, ConnectMode, MockConnector, ScriptedBackend};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use voiceform::http::{create_router, AppState};
use voiceform::session::{Session, SessionConfig};
use voiceform::templates::{default_templates, function_definitions};
use voiceform::transport::ConnectionStatus;

fn session(mode: ConnectMode) -> (Arc<Session>, tokio::sync::mpsc::UnboundedReceiver<common::ServerEnd>) {
    let mut config = SessionConfig::default();
    config.endpoint = "ws://test.local/ws".to_string();
    config.session_id = "http-session".to_string();
    config.functions.definitions = function_definitions(&default_templates()[0]);

    let (connector, servers) = MockConnector::new(mode);
    let (backend, _feed) = ScriptedBackend::new();
    (Arc::new(Session::with_connector(config, backend, connector).unwrap()), servers)
}

async fn call(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_health_check() {
    let (session, _servers) = session(ConnectMode::Open);
    let app = create_router(AppState::new(session));

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"OK");
}

#[tokio::test]
async fn test_get_state() {
    let (session, _servers) = session(ConnectMode::Open);
    let app = create_router(AppState::new(session));

    let (status, body) = call(app, "GET", "/session/state", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["connectionStatus"], "disconnected");
    assert_eq!(body["isRecording"], false);
    assert_eq!(body["transcriptFinal"]["text"], "");
}

#[tokio::test]
async fn test_start_recording_requires_connection() {
    let (session, _servers) = session(ConnectMode::Hang);
    let app = create_router(AppState::new(Arc::clone(&session)));

    let (status, _) = call(app.clone(), "POST", "/session/connect", None).await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let (status, body) = call(app, "POST", "/session/recording/start", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Session is not connected");
    assert!(!session.state().is_recording);
}

#[tokio::test]
async fn test_connect_and_start_recording() {
    let (session, mut servers) = session(ConnectMode::Open);
    let app = create_router(AppState::new(Arc::clone(&session)));
    let mut state = session.subscribe();

    let (status, body) = call(app.clone(), "POST", "/session/connect", None).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["session_id"], "http-session");

    let _server = accept(&mut servers).await;
    wait_until(&mut state, |s| s.connection_status == ConnectionStatus::Connected).await;

    let (status, body) = call(app.clone(), "POST", "/session/recording/start", None).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["status"], "starting");
    wait_until(&mut state, |s| s.is_recording).await;

    let (status, _) = call(app.clone(), "POST", "/session/recording/stop", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(app, "POST", "/session/disconnect", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["connection_status"], "disconnected");
}

#[tokio::test]
async fn test_update_field() {
    let (session, _servers) = session(ConnectMode::Open);
    let app = create_router(AppState::new(Arc::clone(&session)));

    let (status, body) = call(
        app.clone(),
        "PUT",
        "/session/fields/customer_name",
        Some(json!({"value": "Ada"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"value": "Ada", "draft": false}));

    let (status, body) = call(
        app.clone(),
        "PUT",
        "/session/fields/party_size",
        Some(json!({"value": "lots"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("party_size"));

    let (status, _) = call(
        app,
        "PUT",
        "/session/fields/unknown",
        Some(json!({"value": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    assert_eq!(session.state().fields.len(), 1);
}

#[tokio::test]
async fn test_clear_session() {
    let (session, _servers) = session(ConnectMode::Open);
    session.update_field("customer_name", json!("Ada")).unwrap();
    let app = create_router(AppState::new(Arc::clone(&session)));

    let (status, body) = call(app, "POST", "/session/clear", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "cleared");
    assert!(session.state().fields.is_empty());
}
