//! Connection Manager
//!
//! Owns one logical subscription to a stream endpoint: connect, receive,
//! disconnect, reconnect with exponential backoff. Every successfully
//! decoded frame is normalized and delivered upward exactly once, in
//! arrival order; transport failures are absorbed by the reconnect loop
//! and only ever surface as `Ready(false)`.
//!
//! # State machine
//!
//! ```text
//! Connecting ──open──> Open ──close/error──> Closed ──delay──> Connecting
//!      │                                       ^
//!      └──────────────connect failed───────────┘
//!
//! Disconnected: reached only by explicit teardown.
//! ```
//!
//! # Generation guard
//!
//! A superseded connection task must never mutate its owner's view, even if
//! a reconnect timer fires or a frame arrives in flight. Each manager is
//! tagged with a generation number; a shared counter records the live
//! generation. Events are delivered only while the tags match, so stale
//! asynchronous callbacks are identified structurally rather than through a
//! mutable "is this still current" flag.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::message::{decode_frame, FrameError, Message};
use crate::transport::TransportConnector;

/// First reconnect delay in milliseconds.
pub const BACKOFF_BASE_MS: u64 = 1000;
/// Reconnect delay cap in milliseconds.
pub const BACKOFF_CAP_MS: u64 = 5000;

/// Reconnect delay for the given retry count:
/// `min(BACKOFF_BASE_MS * 2^retry, BACKOFF_CAP_MS)`.
#[must_use]
pub fn backoff_delay(retry: u32) -> Duration {
    let factor = 1u64 << retry.min(16);
    Duration::from_millis(BACKOFF_BASE_MS.saturating_mul(factor).min(BACKOFF_CAP_MS))
}

/// Connection lifecycle states.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnState {
    /// Torn down; no further activity.
    Disconnected,
    /// Opening a transport to the endpoint.
    Connecting,
    /// Transport open, receiving frames.
    Open,
    /// Transport lost; reconnect scheduled.
    Closed,
}

/// Event delivered from the connection task to its owner.
#[derive(Debug)]
pub enum ConnectionEvent {
    /// Transport readiness changed.
    Ready(bool),
    /// One decoded, normalized message, in arrival order.
    Frame(Message),
    /// A frame that failed to decode. It was dropped; the connection
    /// stays open and subsequent frames keep flowing.
    Malformed {
        /// Decode failure description.
        reason: String,
    },
}

/// Generation-tagged event envelope.
#[derive(Debug)]
pub struct Delivery {
    /// Generation of the manager that produced this event.
    pub generation: u64,
    /// The event payload.
    pub event: ConnectionEvent,
}

/// Keeps one subscription alive for as long as its owner wants it.
///
/// Spawns a task running the reconnect state machine; the task delivers
/// [`Delivery`] events over the channel handed to [`ConnectionManager::spawn`].
pub struct ConnectionManager {
    generation: u64,
    current: Arc<AtomicU64>,
    state_rx: watch::Receiver<ConnState>,
    task: JoinHandle<()>,
}

impl ConnectionManager {
    /// Spawn the connection task for `url`.
    ///
    /// `generation` must be the value stored in `current` by the owner;
    /// the task stops delivering as soon as `current` moves past it.
    #[must_use]
    pub fn spawn(
        url: String,
        connector: Arc<dyn TransportConnector>,
        generation: u64,
        current: Arc<AtomicU64>,
        tx: mpsc::Sender<Delivery>,
    ) -> Self {
        let (state_tx, state_rx) = watch::channel(ConnState::Connecting);
        let task = tokio::spawn(run(
            url,
            connector,
            generation,
            Arc::clone(&current),
            tx,
            state_tx,
        ));
        Self {
            generation,
            current,
            state_rx,
            task,
        }
    }

    /// Generation tag of this manager's deliveries.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Current lifecycle state. Reports `Disconnected` once superseded.
    #[must_use]
    pub fn state(&self) -> ConnState {
        if self.current.load(Ordering::SeqCst) != self.generation {
            ConnState::Disconnected
        } else {
            *self.state_rx.borrow()
        }
    }

    /// Tear down: supersede the generation so in-flight events are
    /// discarded, then stop the task at whatever suspension point it is in.
    pub fn shutdown(&self) {
        // fetch_max so a newer live generation is never regressed
        self.current.fetch_max(self.generation + 1, Ordering::SeqCst);
        self.task.abort();
        debug!(generation = self.generation, "connection torn down");
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Deliver one event, unless this generation has been superseded or the
/// owner is gone. Returns whether the task should keep running.
async fn deliver(
    tx: &mpsc::Sender<Delivery>,
    current: &AtomicU64,
    generation: u64,
    event: ConnectionEvent,
) -> bool {
    if current.load(Ordering::SeqCst) != generation {
        return false;
    }
    tx.send(Delivery { generation, event }).await.is_ok()
}

/// The reconnect state machine. Runs until superseded or the owner drops
/// its receiver.
async fn run(
    url: String,
    connector: Arc<dyn TransportConnector>,
    generation: u64,
    current: Arc<AtomicU64>,
    tx: mpsc::Sender<Delivery>,
    state: watch::Sender<ConnState>,
) {
    let mut retry: u32 = 0;
    loop {
        if current.load(Ordering::SeqCst) != generation {
            return;
        }
        state.send_replace(ConnState::Connecting);
        debug!(%url, "connecting");

        match connector.connect(&url).await {
            Ok(mut transport) => {
                if current.load(Ordering::SeqCst) != generation {
                    let _ = transport.close().await;
                    return;
                }
                state.send_replace(ConnState::Open);
                retry = 0;
                info!(%url, "stream open");
                if !deliver(&tx, &current, generation, ConnectionEvent::Ready(true)).await {
                    let _ = transport.close().await;
                    return;
                }

                loop {
                    match transport.recv().await {
                        Ok(Some(payload)) => match decode_frame(&payload) {
                            Ok(message) => {
                                if !deliver(
                                    &tx,
                                    &current,
                                    generation,
                                    ConnectionEvent::Frame(message),
                                )
                                .await
                                {
                                    let _ = transport.close().await;
                                    return;
                                }
                            }
                            Err(FrameError::Malformed(reason)) => {
                                warn!(%reason, "dropping malformed frame");
                                if !deliver(
                                    &tx,
                                    &current,
                                    generation,
                                    ConnectionEvent::Malformed { reason },
                                )
                                .await
                                {
                                    let _ = transport.close().await;
                                    return;
                                }
                            }
                        },
                        Ok(None) => {
                            debug!(%url, "transport closed by peer");
                            break;
                        }
                        Err(e) => {
                            warn!(%url, error = %e, "transport error");
                            break;
                        }
                    }
                }

                state.send_replace(ConnState::Closed);
                if !deliver(&tx, &current, generation, ConnectionEvent::Ready(false)).await {
                    return;
                }
            }
            Err(e) => {
                state.send_replace(ConnState::Closed);
                warn!(%url, error = %e, "connect failed");
            }
        }

        let delay = backoff_delay(retry);
        retry = retry.saturating_add(1);
        debug!(%url, delay_ms = delay.as_millis() as u64, retry, "reconnect scheduled");
        tokio::time::sleep(delay).await;
    }
}
