use super::config::SessionConfig;
use super::form::{self, FieldCatalog, FieldValue};
use super::state::{FinalTranscript, InterimTranscript, SessionState, SessionStats};
use crate::audio::{AudioBackend, AudioCaptureBridge};
use crate::drafts::{DraftCandidate, DraftManager, FunctionCall, FunctionDraft};
use crate::error::ClientError;
use crate::transport::{ClientEvent, ConnectionStatus, Connector, TransportClient, WebSocketConnector};
use chrono::Utc;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// A streaming transcription session with live form-field extraction.
///
/// Owns the transport, the audio bridge and the draft list, and publishes a
/// single `SessionState` value that changes as server messages arrive.
/// Server messages are applied one at a time, in delivery order.
pub struct Session {
    config: Arc<SessionConfig>,
    transport: TransportClient,
    bridge: AudioCaptureBridge,
    shared: Arc<Shared>,
    event_task: JoinHandle<()>,
    shut_down: AtomicBool,
}

/// State touched both by the event loop and by direct calls
struct Shared {
    core: Mutex<Core>,
    state: watch::Sender<SessionState>,
}

struct Core {
    drafts: DraftManager,
    catalog: FieldCatalog,
}

impl Session {
    /// Create a session that connects over WebSocket.
    ///
    /// Must be called inside a tokio runtime. Nothing is opened until
    /// `connect()`.
    pub fn new(config: SessionConfig, backend: Box<dyn AudioBackend>) -> Result<Self, ClientError> {
        Self::with_connector(config, backend, Arc::new(WebSocketConnector))
    }

    /// Create a session whose socket is opened by `connector`
    pub fn with_connector(
        mut config: SessionConfig,
        backend: Box<dyn AudioBackend>,
        connector: Arc<dyn Connector>,
    ) -> Result<Self, ClientError> {
        if config.session_id.trim().is_empty() {
            config.session_id = uuid::Uuid::new_v4().to_string();
        }
        config.validate()?;

        let config = Arc::new(config);
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let transport = TransportClient::new(Arc::clone(&config), connector, events_tx.clone());
        let bridge = AudioCaptureBridge::new(transport.clone(), backend, events_tx);

        let mut core = Core {
            drafts: DraftManager::new(),
            catalog: FieldCatalog::from_definitions(&config.functions.definitions),
        };
        let initial = initial_state(&config, &mut core);

        let (state, _) = watch::channel(initial);
        let shared = Arc::new(Shared {
            core: Mutex::new(core),
            state,
        });

        let event_task = tokio::spawn(run_events(
            Arc::clone(&shared),
            transport.clone(),
            bridge.clone(),
            events_rx,
        ));

        info!("Created session {}", config.session_id);

        Ok(Self {
            config,
            transport,
            bridge,
            shared,
            event_task,
            shut_down: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn session_id(&self) -> &str {
        &self.config.session_id
    }

    /// Open the connection. Returns immediately; watch `connection_status`.
    pub fn connect(&self) {
        self.transport.connect();
    }

    /// Stop any recording, then close the connection
    pub async fn disconnect(&self) {
        self.bridge.stop_recording().await;
        self.transport.disconnect();
    }

    /// Current connection status, ahead of the published state
    pub fn connection_status(&self) -> ConnectionStatus {
        self.transport.status()
    }

    /// Whether a recording can start right now
    pub fn can_record(&self) -> bool {
        self.connection_status() == ConnectionStatus::Connected
    }

    /// Begin recording.
    ///
    /// Rejected (returns false) unless the connection is established. The
    /// device is acquired in the background; `is_recording` turns true once
    /// it is.
    pub fn start_recording(&self) -> bool {
        if !self.can_record() {
            warn!(
                "Cannot start recording: connection is {:?}",
                self.connection_status()
            );
            return false;
        }

        self.bridge.start_recording();
        true
    }

    pub async fn stop_recording(&self) {
        self.bridge.stop_recording().await;
    }

    /// Reset transcript, functions, drafts, field values, stats and error.
    ///
    /// The connection and any ongoing recording are left alone.
    pub fn clear_session(&self) {
        let mut core = self.shared.lock_core();
        core.drafts.clear();

        self.shared.state.send_modify(|state| {
            let recording_started_at = state
                .is_recording
                .then_some(state.stats.recording_started_at)
                .flatten();

            state.transcript_final = FinalTranscript::default();
            state.transcript_interim = InterimTranscript::default();
            state.functions.clear();
            state.drafts.clear();
            state.fields.clear();
            state.error = None;
            state.stats = SessionStats {
                recording_started_at,
                ..Default::default()
            };
        });

        info!("Cleared session {}", self.config.session_id);
    }

    /// Snapshot of the current state
    pub fn state(&self) -> SessionState {
        self.shared.state.borrow().clone()
    }

    /// Receive every state change. Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.shared.state.subscribe()
    }

    /// Set a form field by hand.
    ///
    /// The value is checked against the parameter type of the field's
    /// `update_<identifier>` function. A rejected value leaves the state
    /// unchanged. Nothing is sent to the server.
    pub fn update_field(&self, identifier: &str, raw: Value) -> Result<(), ClientError> {
        let core = self.shared.lock_core();

        let value = core.catalog.validate(identifier, raw).map_err(|e| {
            warn!("Rejected manual value: {}", e);
            e
        })?;

        debug!("Manual update of {}", identifier);
        self.shared.state.send_modify(|state| {
            state
                .fields
                .insert(identifier.to_string(), FieldValue { value, draft: false });
        });

        Ok(())
    }

    /// Submit a draft as if the server had proposed it
    pub fn add_manual_draft(&self, candidate: DraftCandidate) -> Vec<FunctionDraft> {
        self.shared.apply_draft(candidate)
    }

    /// Reconcile the drafts against `batch` without treating it as a server
    /// confirmation: `functions` and the stats are left unchanged.
    pub fn confirm_functions(&self, batch: &[FunctionCall]) -> Vec<FunctionDraft> {
        let mut core = self.shared.lock_core();
        let snapshot = core.drafts.reconcile_confirmed(batch);

        self.shared.state.send_modify(|state| {
            form::apply_confirmed(&mut state.fields, &core.catalog, batch);
            state.drafts = snapshot.clone();
        });

        snapshot
    }

    pub fn clear_drafts(&self) {
        let mut core = self.shared.lock_core();
        core.drafts.clear();
        self.shared.state.send_modify(|state| state.drafts.clear());
    }

    /// Remove only the drafts matching `predicate`
    pub fn clear_drafts_where<F>(&self, predicate: F) -> Vec<FunctionDraft>
    where
        F: Fn(&FunctionDraft) -> bool,
    {
        let mut core = self.shared.lock_core();
        let snapshot = core.drafts.clear_where(predicate);
        self.shared
            .state
            .send_modify(|state| state.drafts = snapshot.clone());
        snapshot
    }

    pub fn drafts(&self) -> Vec<FunctionDraft> {
        self.shared.lock_core().drafts.snapshot()
    }

    /// Stop recording and close the connection. Safe to call more than once.
    pub async fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return;
        }

        info!("Shutting down session {}", self.config.session_id);
        self.disconnect().await;
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if !self.shut_down.swap(true, Ordering::SeqCst) {
            self.bridge.abandon();
            self.transport.disconnect();
        }
        self.event_task.abort();
    }
}

impl Shared {
    fn lock_core(&self) -> MutexGuard<'_, Core> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn apply_draft(&self, candidate: DraftCandidate) -> Vec<FunctionDraft> {
        let mut core = self.lock_core();
        let snapshot = core.drafts.submit_draft(candidate);

        self.state.send_modify(|state| {
            form::apply_drafts(&mut state.fields, &core.catalog, &snapshot);
            state.drafts = snapshot.clone();
        });

        snapshot
    }

    fn apply_confirmed(&self, batch: Vec<FunctionCall>) {
        let mut core = self.lock_core();
        let snapshot = core.drafts.reconcile_confirmed(&batch);

        self.state.send_modify(|state| {
            form::apply_confirmed(&mut state.fields, &core.catalog, &batch);
            state.stats.confirmed_field_updates += form::count_updates(&batch);
            state.drafts = snapshot;
            state.functions = batch;
        });
    }

    fn apply(&self, event: ClientEvent) {
        match event {
            ClientEvent::Status(status) => {
                self.state
                    .send_modify(|state| state.connection_status = status);
            }
            ClientEvent::Ack { session_id } => {
                self.state
                    .send_modify(|state| state.acknowledged_session = Some(session_id));
            }
            ClientEvent::Transcript(message) if message.is_final => {
                self.state.send_modify(|state| {
                    state.transcript_final.append(&message);
                    state.transcript_interim = InterimTranscript::default();
                    state.stats.word_count = state.transcript_final.word_count();
                });
            }
            ClientEvent::Transcript(message) => {
                self.state.send_modify(|state| {
                    state.stats.latest_stability = message.stability;
                    state.transcript_interim = InterimTranscript::from(message);
                });
            }
            ClientEvent::Functions(batch) => self.apply_confirmed(batch),
            ClientEvent::Draft(candidate) => {
                self.apply_draft(candidate);
            }
            ClientEvent::SessionEnded => {
                self.state.send_modify(|state| {
                    state.connection_status = ConnectionStatus::Disconnected;
                    state.is_recording = false;
                });
            }
            ClientEvent::Recording(on) => {
                self.state.send_modify(|state| {
                    state.is_recording = on;
                    if on {
                        state.stats.recording_started_at = Some(Utc::now());
                    }
                });
            }
            ClientEvent::Error(e) => {
                self.state.send_modify(|state| state.error = Some(e));
            }
        }
    }
}

/// State seeded from a resumed session's input context
fn initial_state(config: &SessionConfig, core: &mut Core) -> SessionState {
    let mut state = SessionState::default();

    let Some(context) = &config.input_context else {
        return state;
    };

    if let Some(transcript) = context.current_transcript.as_deref() {
        state.transcript_final.text = transcript.trim().to_string();
        state.stats.word_count = state.transcript_final.word_count();
    }

    if let Some(functions) = &context.current_functions {
        state.drafts = core.drafts.reconcile_confirmed(functions);
        form::apply_confirmed(&mut state.fields, &core.catalog, functions);
        state.functions = functions.clone();
    }

    state
}

async fn run_events(
    shared: Arc<Shared>,
    transport: TransportClient,
    bridge: AudioCaptureBridge,
    mut events: mpsc::UnboundedReceiver<ClientEvent>,
) {
    while let Some(event) = events.recv().await {
        let ended = matches!(event, ClientEvent::SessionEnded);
        shared.apply(event);

        if ended {
            bridge.stop_recording().await;
            if transport.status() != ConnectionStatus::Disconnected {
                transport.disconnect();
            }
        }
    }

    debug!("Session event loop finished");
}
