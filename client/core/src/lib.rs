//! Newswire Client Core - Stream Subscriptions with Explicit Commit
//!
//! This crate maintains a live, ordered view of a server-pushed message
//! stream (a per-user feed or a topic) over an unreliable connection, while
//! giving the caller explicit control over when newly-arrived items are
//! actually inserted into the displayed list. It is completely independent
//! of any UI framework.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────┐
//! │                    Display Surface                     │
//! │     messages / pending / ready / loading   refresh()   │
//! └───────────────────────────┬───────────────────────────┘
//!                             │ poll()
//! ┌───────────────────────────┴───────────────────────────┐
//! │                     StreamConsumer                     │
//! │        log ──reconcile──> messages + pending           │
//! └───────────────────────────┬───────────────────────────┘
//!                             │ Delivery { generation, event }
//! ┌───────────────────────────┴───────────────────────────┐
//! │                   ConnectionManager                    │
//! │   Connecting -> Open -> Closed -> (backoff) -> retry   │
//! └───────────────────────────┬───────────────────────────┘
//!                             │ StreamTransport
//!                      WebSocket / in-process
//! ```
//!
//! # Key Types
//!
//! - [`StreamConsumer`]: the caller-facing surface; owns the two-tier view
//! - [`ConnectionManager`]: reconnect-with-backoff loop around one transport
//! - [`Message`]: canonical message record produced by [`normalize`]
//! - [`SubscriptionKey`]: selects the feed or topic being followed
//! - [`ClientConfig`]: endpoints, backlog request, channel sizing
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use newswire_core::{ClientConfig, StreamConsumer, WebSocketConnector};
//!
//! let mut consumer = StreamConsumer::new(ClientConfig::load(), Arc::new(WebSocketConnector));
//! consumer.set_topic("news")?;
//!
//! loop {
//!     consumer.poll();
//!     render(consumer.messages(), consumer.pending().len(), consumer.ready());
//!     if user_clicked_refresh() {
//!         consumer.refresh();
//!     }
//! }
//! ```
//!
//! # Failure Model
//!
//! Transport failures are self-healing: the connection manager reconnects
//! with capped exponential backoff and the outage is visible only as
//! `ready() == false`. A malformed frame is dropped and logged without
//! disturbing the connection. The one non-recoverable error is a blank
//! subscription key, which is a caller contract violation.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod connection;
pub mod consumer;
pub mod message;
pub mod profile;
pub mod subscription;
pub mod transport;

// Re-exports for convenience
pub use config::{
    default_config_path, load_config_from_path, ClientConfig, ClientToml, ConfigError,
};
pub use connection::{
    backoff_delay, ConnState, ConnectionEvent, ConnectionManager, Delivery, BACKOFF_BASE_MS,
    BACKOFF_CAP_MS,
};
pub use consumer::StreamConsumer;
pub use message::{decode_frame, normalize, FrameError, Message, NO_TITLE};
pub use profile::{ProfileClient, ProfileError, UserProfile};
pub use subscription::{KeyError, SubscriptionKey};
pub use transport::{
    ChannelConnector, ChannelTransport, StreamTransport, TransportConnector, TransportError,
};
#[cfg(feature = "websocket")]
pub use transport::WebSocketConnector;
