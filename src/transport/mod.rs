//! Streaming transport to the inference service
//!
//! `TransportClient` manages a single connection: it sends the session
//! configuration as the first frame, accepts outbound control and audio
//! frames while open, and turns inbound frames into ordered `ClientEvent`s.
//! The socket itself sits behind the `Connector` trait.

mod client;
mod connector;
mod events;

pub use client::TransportClient;
pub use connector::{Connection, Connector, Frame, SocketEvent, WebSocketConnector, CLOSE_NORMAL};
pub use events::{ClientEvent, ConnectionStatus};
