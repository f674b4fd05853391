// Shared fixtures for integration tests: an in-memory connector standing in
// for the WebSocket, and an audio backend fed by the test.

#![allow(dead_code)]

use anyhow::{anyhow, bail, Result};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use voiceform::audio::{AudioBackend, AudioChunk};
use voiceform::transport::{Connection, Connector, Frame, SocketEvent};

pub const TIMEOUT: Duration = Duration::from_secs(2);

/// How the fake server answers a connection attempt
#[derive(Debug, Clone)]
pub enum ConnectMode {
    Open,
    Refuse(String),
    /// Never completes; the client stays `connecting`
    Hang,
}

/// The server end of one in-memory connection
pub struct ServerEnd {
    pub endpoint: String,
    pub from_client: mpsc::UnboundedReceiver<Frame>,
    pub to_client: mpsc::UnboundedSender<SocketEvent>,
}

impl ServerEnd {
    /// Next frame written by the client
    pub async fn next_frame(&mut self) -> Frame {
        tokio::time::timeout(TIMEOUT, self.from_client.recv())
            .await
            .expect("timed out waiting for a client frame")
            .expect("client side closed")
    }

    /// Next frame, skipping nothing, parsed as JSON text
    pub async fn next_json(&mut self) -> serde_json::Value {
        match self.next_frame().await {
            Frame::Text(text) => serde_json::from_str(&text).expect("client sent invalid JSON"),
            other => panic!("expected a text frame, got {:?}", other),
        }
    }

    /// Every frame written so far, without waiting
    pub fn drain(&mut self) -> Vec<Frame> {
        let mut frames = Vec::new();
        while let Ok(frame) = self.from_client.try_recv() {
            frames.push(frame);
        }
        frames
    }

    pub fn send_json(&self, value: serde_json::Value) {
        self.send_text(&value.to_string());
    }

    pub fn send_text(&self, text: &str) {
        self.to_client
            .send(SocketEvent::Frame(Frame::Text(text.to_string())))
            .expect("client stopped reading");
    }

    pub fn close(&self, code: u16) {
        let _ = self.to_client.send(SocketEvent::Closed {
            code: Some(code),
            reason: String::new(),
        });
    }
}

pub struct MockConnector {
    mode: ConnectMode,
    servers: mpsc::UnboundedSender<ServerEnd>,
}

impl MockConnector {
    pub fn new(mode: ConnectMode) -> (Arc<Self>, mpsc::UnboundedReceiver<ServerEnd>) {
        let (servers, accepted) = mpsc::unbounded_channel();
        (Arc::new(Self { mode, servers }), accepted)
    }
}

#[async_trait::async_trait]
impl Connector for MockConnector {
    async fn connect(&self, endpoint: &str) -> Result<Connection> {
        match &self.mode {
            ConnectMode::Open => {}
            ConnectMode::Refuse(reason) => bail!("connection refused: {}", reason),
            ConnectMode::Hang => std::future::pending::<()>().await,
        }

        let (outbound, from_client) = mpsc::unbounded_channel();
        let (to_client, inbound) = mpsc::unbounded_channel();

        self.servers
            .send(ServerEnd {
                endpoint: endpoint.to_string(),
                from_client,
                to_client,
            })
            .map_err(|_| anyhow!("test dropped the server side"))?;

        Ok(Connection { outbound, inbound })
    }
}

pub async fn accept(servers: &mut mpsc::UnboundedReceiver<ServerEnd>) -> ServerEnd {
    tokio::time::timeout(TIMEOUT, servers.recv())
        .await
        .expect("timed out waiting for a connection")
        .expect("connector dropped")
}

/// Test-side handle pushing chunks into a `ScriptedBackend`
#[derive(Clone, Default)]
pub struct ChunkFeed {
    sender: Arc<Mutex<Option<mpsc::Sender<AudioChunk>>>>,
    starts: Arc<Mutex<usize>>,
    stops: Arc<Mutex<usize>>,
}

impl ChunkFeed {
    /// Push one chunk; false when the backend is not capturing
    pub async fn push(&self, data: Vec<u8>) -> bool {
        let sender = self.sender.lock().unwrap().clone();
        match sender {
            Some(tx) => tx
                .send(AudioChunk {
                    data,
                    sample_rate: 16000,
                    timestamp_ms: 0,
                })
                .await
                .is_ok(),
            None => false,
        }
    }

    /// End the stream as if the source ran dry
    pub fn finish(&self) {
        self.sender.lock().unwrap().take();
    }

    pub fn starts(&self) -> usize {
        *self.starts.lock().unwrap()
    }

    pub fn stops(&self) -> usize {
        *self.stops.lock().unwrap()
    }
}

/// Audio backend whose chunks come from the test
pub struct ScriptedBackend {
    feed: ChunkFeed,
    deny: Option<String>,
    /// Keep delivering after `stop`, like a device callback that fires late
    linger: bool,
    capturing: bool,
}

impl ScriptedBackend {
    pub fn new() -> (Box<Self>, ChunkFeed) {
        let feed = ChunkFeed::default();
        (
            Box::new(Self {
                feed: feed.clone(),
                deny: None,
                linger: false,
                capturing: false,
            }),
            feed,
        )
    }

    /// A backend whose device cannot be acquired
    pub fn denied(reason: &str) -> (Box<Self>, ChunkFeed) {
        let (mut backend, feed) = Self::new();
        backend.deny = Some(reason.to_string());
        (backend, feed)
    }

    /// A backend whose `stop` leaves the stream open and emits one more chunk
    pub fn lingering() -> (Box<Self>, ChunkFeed) {
        let (mut backend, feed) = Self::new();
        backend.linger = true;
        (backend, feed)
    }
}

#[async_trait::async_trait]
impl AudioBackend for ScriptedBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioChunk>> {
        if let Some(reason) = &self.deny {
            bail!("{}", reason);
        }

        let (tx, rx) = mpsc::channel(16);
        *self.feed.sender.lock().unwrap() = Some(tx);
        *self.feed.starts.lock().unwrap() += 1;
        self.capturing = true;
        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        if self.linger {
            let sender = self.feed.sender.lock().unwrap().clone();
            if let Some(tx) = sender {
                let _ = tx.try_send(AudioChunk {
                    data: vec![0xEE],
                    sample_rate: 16000,
                    timestamp_ms: 0,
                });
            }
        } else {
            self.feed.sender.lock().unwrap().take();
        }
        *self.feed.stops.lock().unwrap() += 1;
        self.capturing = false;
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.capturing
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Wait until the published state satisfies `predicate`
pub async fn wait_until<T, F>(rx: &mut watch::Receiver<T>, predicate: F) -> T
where
    T: Clone,
    F: FnMut(&T) -> bool,
{
    tokio::time::timeout(TIMEOUT, rx.wait_for(predicate))
        .await
        .expect("timed out waiting for state")
        .expect("state sender dropped")
        .clone()
}

/// Give spawned tasks a chance to run
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}
