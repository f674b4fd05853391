use anyhow::{Context, Result};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

/// Normal closure code
pub const CLOSE_NORMAL: u16 = 1000;

/// A frame exchanged over the streaming connection
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
    Close { code: u16, reason: String },
}

/// What the socket reports back
#[derive(Debug, Clone, PartialEq)]
pub enum SocketEvent {
    Frame(Frame),
    /// Socket-level error; a `Closed` event follows
    Error(String),
    /// Connection closed; `code` is `None` when no close frame was received
    Closed { code: Option<u16>, reason: String },
}

/// An open connection, seen as a pair of channels.
///
/// Dropping `outbound` ends the writer side.
pub struct Connection {
    pub outbound: mpsc::UnboundedSender<Frame>,
    pub inbound: mpsc::UnboundedReceiver<SocketEvent>,
}

/// Opens streaming connections
#[async_trait::async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, endpoint: &str) -> Result<Connection>;
}

/// WebSocket connector backed by tokio-tungstenite
#[derive(Debug, Default, Clone, Copy)]
pub struct WebSocketConnector;

#[async_trait::async_trait]
impl Connector for WebSocketConnector {
    async fn connect(&self, endpoint: &str) -> Result<Connection> {
        info!("Connecting to {}", endpoint);

        let (stream, _) = connect_async(endpoint)
            .await
            .with_context(|| format!("Failed to connect to {}", endpoint))?;

        info!("WebSocket open: {}", endpoint);

        let (mut writer, mut reader) = stream.split();
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Frame>();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel::<SocketEvent>();

        tokio::spawn(async move {
            while let Some(frame) = outbound_rx.recv().await {
                let closing = matches!(frame, Frame::Close { .. });
                let message = match frame {
                    Frame::Text(text) => Message::Text(text.into()),
                    Frame::Binary(bytes) => Message::Binary(bytes.into()),
                    Frame::Close { code, reason } => Message::Close(Some(CloseFrame {
                        code: CloseCode::from(code),
                        reason: reason.into(),
                    })),
                };

                if let Err(e) = writer.send(message).await {
                    warn!("WebSocket write failed: {}", e);
                    break;
                }

                if closing {
                    break;
                }
            }

            debug!("WebSocket writer stopped");
        });

        tokio::spawn(async move {
            while let Some(message) = reader.next().await {
                let event = match message {
                    Ok(Message::Text(text)) => SocketEvent::Frame(Frame::Text(text.as_str().to_owned())),
                    Ok(Message::Binary(bytes)) => SocketEvent::Frame(Frame::Binary(bytes.to_vec())),
                    Ok(Message::Close(frame)) => {
                        let (code, reason) = match frame {
                            Some(frame) => (Some(u16::from(frame.code)), frame.reason.as_str().to_owned()),
                            None => (None, String::new()),
                        };
                        let _ = inbound_tx.send(SocketEvent::Closed { code, reason });
                        return;
                    }
                    // Ping/pong are answered by tungstenite
                    Ok(_) => continue,
                    Err(e) => {
                        let _ = inbound_tx.send(SocketEvent::Error(e.to_string()));
                        let _ = inbound_tx.send(SocketEvent::Closed {
                            code: None,
                            reason: String::new(),
                        });
                        return;
                    }
                };

                if inbound_tx.send(event).is_err() {
                    return;
                }
            }

            let _ = inbound_tx.send(SocketEvent::Closed {
                code: None,
                reason: String::new(),
            });
        });

        Ok(Connection {
            outbound: outbound_tx,
            inbound: inbound_rx,
        })
    }
}
