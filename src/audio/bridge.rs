use super::backend::{AudioBackend, AudioChunk};
use crate::error::ClientError;
use crate::protocol::ControlMessage;
use crate::transport::{ClientEvent, Frame, TransportClient};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    /// Waiting for the backend to acquire the device
    Starting,
    Recording,
}

struct Recording {
    phase: Phase,
    /// Identifies the current recording; chunks from an older one are dropped
    epoch: u64,
    first_chunk_sent: bool,
    task: Option<JoinHandle<()>>,
}

/// Forwards audio chunks from a backend to the transport while recording.
///
/// Each recording is framed by one `audio_start` (right before its first
/// chunk) and an `audio_stop`. Cheap to clone; clones share the backend.
#[derive(Clone)]
pub struct AudioCaptureBridge {
    transport: TransportClient,
    backend: Arc<tokio::sync::Mutex<Box<dyn AudioBackend>>>,
    recording: Arc<Mutex<Recording>>,
    events: mpsc::UnboundedSender<ClientEvent>,
}

impl AudioCaptureBridge {
    pub fn new(
        transport: TransportClient,
        backend: Box<dyn AudioBackend>,
        events: mpsc::UnboundedSender<ClientEvent>,
    ) -> Self {
        Self {
            transport,
            backend: Arc::new(tokio::sync::Mutex::new(backend)),
            recording: Arc::new(Mutex::new(Recording {
                phase: Phase::Idle,
                epoch: 0,
                first_chunk_sent: false,
                task: None,
            })),
            events,
        }
    }

    /// Begin a recording.
    ///
    /// Returns immediately: the device is acquired in the background and a
    /// `Recording(true)` event follows once chunks can flow. Acquisition
    /// failures are reported as media errors. Does nothing while a recording
    /// is starting or active.
    pub fn start_recording(&self) {
        let mut rec = self.lock_recording();
        if rec.phase != Phase::Idle {
            debug!("Recording already {:?}", rec.phase);
            return;
        }

        rec.phase = Phase::Starting;
        rec.epoch += 1;
        rec.first_chunk_sent = false;

        let bridge = self.clone();
        let epoch = rec.epoch;
        rec.task = Some(tokio::spawn(async move { bridge.run_capture(epoch).await }));
    }

    /// End the current recording.
    ///
    /// Always sends `audio_stop`, even when nothing is recording, so a caller
    /// that lost track of state can still close the server-side recording.
    /// When a recording is active (or starting) the backend is stopped and
    /// the device released before this returns.
    pub async fn stop_recording(&self) {
        let (was_active, task) = {
            let mut rec = self.lock_recording();
            let was_active = rec.phase != Phase::Idle;
            if was_active {
                rec.phase = Phase::Idle;
                rec.epoch += 1;
                rec.first_chunk_sent = false;
            }
            (was_active, rec.task.take())
        };

        // Sent after the phase flip: no chunk can follow it
        self.transport.send_control(ControlMessage::AudioStop);

        if let Some(task) = task {
            task.abort();
        }

        if !was_active {
            return;
        }

        let mut backend = self.backend.lock().await;
        if let Err(e) = backend.stop().await {
            warn!("Failed to stop {} backend: {:#}", backend.name(), e);
        }
        drop(backend);

        info!("Recording stopped");
        self.emit(ClientEvent::Recording(false));
    }

    pub fn is_recording(&self) -> bool {
        self.lock_recording().phase == Phase::Recording
    }

    /// Drop the current recording without waiting on the backend
    pub(crate) fn abandon(&self) {
        let mut rec = self.lock_recording();
        rec.phase = Phase::Idle;
        rec.epoch += 1;
        rec.first_chunk_sent = false;
        if let Some(task) = rec.task.take() {
            task.abort();
        }
    }

    fn lock_recording(&self) -> MutexGuard<'_, Recording> {
        self.recording.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: ClientEvent) {
        if self.events.send(event).is_err() {
            debug!("Event receiver dropped");
        }
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.lock_recording().epoch == epoch
    }

    async fn run_capture(&self, epoch: u64) {
        let mut chunks = {
            let mut backend = self.backend.lock().await;
            if !self.is_current(epoch) {
                return;
            }

            info!("Acquiring audio from {}", backend.name());
            match backend.start().await {
                Ok(rx) => rx,
                Err(e) => {
                    error!("Failed to start {}: {:#}", backend.name(), e);
                    {
                        let mut rec = self.lock_recording();
                        if rec.epoch == epoch {
                            rec.phase = Phase::Idle;
                        }
                    }
                    self.emit(ClientEvent::Error(ClientError::Media(format!("{:#}", e))));
                    return;
                }
            }
        };

        let proceed = {
            let mut rec = self.lock_recording();
            let proceed = rec.epoch == epoch && rec.phase == Phase::Starting;
            if proceed {
                rec.phase = Phase::Recording;
            }
            proceed
        };

        if !proceed {
            // Stopped while the device was being acquired
            let mut backend = self.backend.lock().await;
            if let Err(e) = backend.stop().await {
                warn!("Failed to stop {} backend: {:#}", backend.name(), e);
            }
            return;
        }

        info!("Recording started");
        self.emit(ClientEvent::Recording(true));

        while let Some(chunk) = chunks.recv().await {
            if !self.forward_chunk(epoch, chunk) {
                return;
            }
        }

        // Source ran dry on its own
        let ended = {
            let mut rec = self.lock_recording();
            let ended = rec.epoch == epoch && rec.phase == Phase::Recording;
            if ended {
                rec.phase = Phase::Idle;
                rec.first_chunk_sent = false;
                rec.task = None;
            }
            ended
        };

        if ended {
            info!("Audio source finished");
            self.transport.send_control(ControlMessage::AudioStop);
            let mut backend = self.backend.lock().await;
            if let Err(e) = backend.stop().await {
                warn!("Failed to stop {} backend: {:#}", backend.name(), e);
            }
            drop(backend);
            self.emit(ClientEvent::Recording(false));
        }
    }

    /// Send one chunk, preceded by `audio_start` when it is the first of this
    /// recording. Returns false once the recording has ended.
    fn forward_chunk(&self, epoch: u64, chunk: AudioChunk) -> bool {
        // Held across the sends so stop_recording cannot interleave
        let mut rec = self.lock_recording();
        if rec.epoch != epoch || rec.phase != Phase::Recording {
            debug!("Dropping chunk delivered after stop");
            return false;
        }

        if !self.transport.is_open() {
            debug!("Dropping chunk: connection not open");
            return true;
        }

        if !rec.first_chunk_sent {
            if !self.transport.send_control(ControlMessage::AudioStart) {
                return true;
            }
            rec.first_chunk_sent = true;
        }

        self.transport.send(Frame::Binary(chunk.data));
        true
    }
}
