//! Transport Layer for Stream Subscriptions
//!
//! Provides abstraction over the mechanism that carries frames from the
//! gateway to the client:
//! - `WebSocketConnector`: real network transport (feature `websocket`)
//! - `ChannelConnector`: channel-backed transport for tests and embedding
//!
//! # Design Philosophy
//!
//! The connection manager never touches a concrete socket. It asks a
//! [`TransportConnector`] for a fresh [`StreamTransport`] on every
//! (re)connection attempt and reads text frames from it until it closes or
//! errors. This keeps the reconnect state machine testable without a
//! network: tests script a [`ChannelConnector`] with accepted and refused
//! attempts and drive frames by hand.

use async_trait::async_trait;
use thiserror::Error;

pub mod in_process;
#[cfg(feature = "websocket")]
pub mod websocket;

pub use in_process::{ChannelConnector, ChannelTransport};
#[cfg(feature = "websocket")]
pub use websocket::WebSocketConnector;

/// Errors that can occur during transport operations
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection to the endpoint failed
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    /// Failed to receive a frame
    #[error("receive failed: {0}")]
    ReceiveFailed(String),
    /// IO error from the underlying transport
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// One live connection to a stream endpoint.
///
/// Frames are opaque text payloads; decoding and normalization happen in
/// the connection manager, not here.
#[async_trait]
pub trait StreamTransport: Send {
    /// Receive the next frame. `Ok(None)` means the peer closed cleanly;
    /// an error means the connection is unusable. Both trigger reconnect.
    async fn recv(&mut self) -> Result<Option<String>, TransportError>;

    /// Close the connection.
    async fn close(&mut self) -> Result<(), TransportError>;
}

/// Opens transports to endpoint URLs.
///
/// Called once per connection attempt; every successful call yields a wholly
/// new transport instance, so a reconnect never resumes an old one.
#[async_trait]
pub trait TransportConnector: Send + Sync {
    /// Open a transport to `url`.
    async fn connect(&self, url: &str) -> Result<Box<dyn StreamTransport>, TransportError>;
}
