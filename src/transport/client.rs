use super::connector::{Connection, Connector, Frame, SocketEvent, CLOSE_NORMAL};
use super::events::{ClientEvent, ConnectionStatus};
use crate::error::ClientError;
use crate::protocol::{config_payload, parse_server_message, ControlMessage, ServerMessage};
use crate::session::SessionConfig;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Owns one streaming connection: lifecycle, framing and inbound dispatch.
///
/// Cheap to clone; clones share the same connection.
#[derive(Clone)]
pub struct TransportClient {
    inner: Arc<Inner>,
}

struct Inner {
    config: Arc<SessionConfig>,
    connector: Arc<dyn Connector>,
    events: mpsc::UnboundedSender<ClientEvent>,
    link: Mutex<Link>,
}

struct Link {
    status: ConnectionStatus,
    /// Bumped on every connect/disconnect so a superseded connection task
    /// can no longer publish anything
    epoch: u64,
    /// Present only once the config message has been queued
    outbound: Option<mpsc::UnboundedSender<Frame>>,
    task: Option<JoinHandle<()>>,
}

impl TransportClient {
    pub fn new(
        config: Arc<SessionConfig>,
        connector: Arc<dyn Connector>,
        events: mpsc::UnboundedSender<ClientEvent>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                connector,
                events,
                link: Mutex::new(Link {
                    status: ConnectionStatus::Disconnected,
                    epoch: 0,
                    outbound: None,
                    task: None,
                }),
            }),
        }
    }

    /// Open the connection.
    ///
    /// Returns immediately; readiness is reported later through a
    /// `Status(Connected)` event. Does nothing while already connecting or
    /// connected.
    pub fn connect(&self) {
        let mut link = self.inner.lock_link();

        if matches!(
            link.status,
            ConnectionStatus::Connecting | ConnectionStatus::Connected
        ) {
            debug!("Connect ignored: already {:?}", link.status);
            return;
        }

        // A socket left open after an error is replaced
        if let Some(outbound) = link.outbound.take() {
            let _ = outbound.send(close_frame());
        }
        if let Some(task) = link.task.take() {
            task.abort();
        }

        link.epoch += 1;
        let epoch = link.epoch;
        self.inner.set_status(&mut link, ConnectionStatus::Connecting);

        let inner = Arc::clone(&self.inner);
        link.task = Some(tokio::spawn(run_connection(inner, epoch)));
    }

    /// Close the connection with a normal-closure code.
    ///
    /// The status becomes `Disconnected` whatever it was before.
    pub fn disconnect(&self) {
        let mut link = self.inner.lock_link();
        link.epoch += 1;

        if let Some(outbound) = link.outbound.take() {
            info!("Closing connection for session {}", self.inner.config.session_id);
            let _ = outbound.send(close_frame());
        }

        if let Some(task) = link.task.take() {
            task.abort();
        }

        self.inner.set_status(&mut link, ConnectionStatus::Disconnected);
    }

    /// Queue a frame for sending.
    ///
    /// Frames are only accepted while the connection is open; anything sent
    /// before the open (or after the close) is dropped, never queued.
    /// Returns whether the frame was accepted.
    pub fn send(&self, frame: Frame) -> bool {
        let link = self.inner.lock_link();
        match &link.outbound {
            Some(outbound) => outbound.send(frame).is_ok(),
            None => {
                debug!("Dropping outbound frame: connection not open");
                false
            }
        }
    }

    pub fn send_control(&self, message: ControlMessage) -> bool {
        self.send(Frame::Text(message.to_json()))
    }

    pub fn status(&self) -> ConnectionStatus {
        self.inner.lock_link().status
    }

    /// Whether the config has been sent and frames can flow
    pub fn is_open(&self) -> bool {
        self.inner.lock_link().outbound.is_some()
    }

    pub fn session_id(&self) -> &str {
        &self.inner.config.session_id
    }
}

impl Inner {
    fn lock_link(&self) -> MutexGuard<'_, Link> {
        self.link.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_status(&self, link: &mut Link, status: ConnectionStatus) {
        link.status = status;
        self.emit(ClientEvent::Status(status));
    }

    fn emit(&self, event: ClientEvent) {
        if self.events.send(event).is_err() {
            debug!("Event receiver dropped");
        }
    }

    fn dispatch(&self, text: &str) {
        match parse_server_message(text) {
            Ok(Some(message)) => self.route(message),
            Ok(None) => debug!("Ignoring unknown server message"),
            Err(e) => {
                warn!("{}", e);
                self.emit(ClientEvent::Error(e));
            }
        }
    }

    fn route(&self, message: ServerMessage) {
        let event = match message {
            ServerMessage::Ack(ack) => {
                info!("Session acknowledged: {}", ack.session_id);
                ClientEvent::Ack {
                    session_id: ack.session_id,
                }
            }
            ServerMessage::Transcript(transcript) => ClientEvent::Transcript(transcript),
            ServerMessage::Functions(batch) => ClientEvent::Functions(batch.functions),
            ServerMessage::FunctionDraftExtracted(draft) => ClientEvent::Draft(draft.data),
            ServerMessage::SessionEnd {} => {
                info!("Server ended session {}", self.config.session_id);
                ClientEvent::SessionEnded
            }
            ServerMessage::Error(err) => {
                warn!("Server reported error: {}", err.err);
                ClientEvent::Error(ClientError::Remote(err.err))
            }
        };

        self.emit(event);
    }
}

fn close_frame() -> Frame {
    Frame::Close {
        code: CLOSE_NORMAL,
        reason: "client disconnect".to_string(),
    }
}

async fn run_connection(inner: Arc<Inner>, epoch: u64) {
    let endpoint = inner.config.endpoint.clone();

    let connection = match inner.connector.connect(&endpoint).await {
        Ok(connection) => connection,
        Err(e) => {
            error!("Connection to {} failed: {:#}", endpoint, e);
            let mut link = inner.lock_link();
            if link.epoch == epoch {
                link.task = None;
                inner.set_status(&mut link, ConnectionStatus::Error);
                inner.emit(ClientEvent::Error(ClientError::Transport(format!("{:#}", e))));
            }
            return;
        }
    };

    let Connection {
        outbound,
        mut inbound,
    } = connection;

    {
        let mut link = inner.lock_link();
        if link.epoch != epoch {
            let _ = outbound.send(close_frame());
            return;
        }

        // The config is the first frame on every connection; audio can only
        // follow once `outbound` is published below.
        match config_payload(&inner.config) {
            Ok(payload) => {
                let _ = outbound.send(Frame::Text(payload));
            }
            Err(e) => {
                error!("{}", e);
                let _ = outbound.send(close_frame());
                link.task = None;
                inner.set_status(&mut link, ConnectionStatus::Error);
                inner.emit(ClientEvent::Error(e));
                return;
            }
        }

        link.outbound = Some(outbound);
        inner.set_status(&mut link, ConnectionStatus::Connected);
    }

    info!("Session {} connected", inner.config.session_id);

    while let Some(event) = inbound.recv().await {
        let mut link = inner.lock_link();
        if link.epoch != epoch {
            return;
        }

        match event {
            SocketEvent::Frame(Frame::Text(text)) => inner.dispatch(&text),
            SocketEvent::Frame(_) => debug!("Ignoring non-text frame from server"),
            SocketEvent::Error(e) => {
                warn!("WebSocket error: {}", e);
                inner.set_status(&mut link, ConnectionStatus::Error);
                inner.emit(ClientEvent::Error(ClientError::Transport(
                    "websocket error".to_string(),
                )));
            }
            SocketEvent::Closed { code, reason } => {
                info!("Connection closed (code={:?}, reason={:?})", code, reason);
                break;
            }
        }
    }

    let mut link = inner.lock_link();
    if link.epoch != epoch {
        return;
    }

    link.outbound = None;
    link.task = None;
    inner.set_status(&mut link, ConnectionStatus::Disconnected);
    inner.emit(ClientEvent::SessionEnded);
}
