//! Stream Consumer
//!
//! Turns the connection manager's append-only log into the two-tier view a
//! display surface wants: `messages` (shown) and `pending` (buffered live
//! updates awaiting an explicit [`StreamConsumer::refresh`]). The split
//! keeps items from reflowing underneath user interaction: only the very
//! first batch for a subscription is revealed immediately, everything after
//! that waits for the caller to commit.
//!
//! All state mutation happens on the caller's side, via the non-blocking
//! [`StreamConsumer::poll`] drain and explicit calls; the connection task
//! only ever writes into the event channel.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::connection::{ConnState, ConnectionEvent, ConnectionManager, Delivery};
use crate::message::Message;
use crate::subscription::{KeyError, SubscriptionKey};
use crate::transport::TransportConnector;

/// A live, ordered view of one server-pushed stream.
///
/// Create with [`StreamConsumer::new`], then call
/// [`set_feed`](Self::set_feed) or [`set_topic`](Self::set_topic) to
/// subscribe. Call [`poll`](Self::poll) regularly to ingest transport
/// events and [`refresh`](Self::refresh) to commit buffered updates.
pub struct StreamConsumer {
    config: ClientConfig,
    connector: Arc<dyn TransportConnector>,
    key: Option<SubscriptionKey>,
    manager: Option<ConnectionManager>,
    rx: Option<mpsc::Receiver<Delivery>>,
    next_generation: u64,
    current: Arc<AtomicU64>,
    log: Vec<Message>,
    messages: Vec<Message>,
    pending: Vec<Message>,
    ready: bool,
    loading: bool,
}

impl StreamConsumer {
    /// Create a consumer with no active subscription.
    #[must_use]
    pub fn new(config: ClientConfig, connector: Arc<dyn TransportConnector>) -> Self {
        Self {
            config,
            connector,
            key: None,
            manager: None,
            rx: None,
            next_generation: 1,
            current: Arc::new(AtomicU64::new(0)),
            log: Vec::new(),
            messages: Vec::new(),
            pending: Vec::new(),
            ready: false,
            loading: true,
        }
    }

    /// Subscribe to the feed for `uid`, replacing any current subscription.
    ///
    /// A blank uid is a contract violation: the previous subscription is
    /// still torn down and all state reset, but no transport is opened and
    /// `ready` stays `false` until a valid key is supplied.
    pub fn set_feed(&mut self, uid: &str) -> Result<(), KeyError> {
        self.teardown_and_reset();
        let key = SubscriptionKey::feed(uid).map_err(|e| {
            warn!(uid, "refusing to subscribe: {e}");
            e
        })?;
        self.start(key);
        Ok(())
    }

    /// Subscribe to the topic stream for `slug`, replacing any current
    /// subscription. Same contract as [`set_feed`](Self::set_feed).
    pub fn set_topic(&mut self, slug: &str) -> Result<(), KeyError> {
        self.teardown_and_reset();
        let key = SubscriptionKey::topic(slug).map_err(|e| {
            warn!(slug, "refusing to subscribe: {e}");
            e
        })?;
        self.start(key);
        Ok(())
    }

    /// Tear down the current subscription without starting a new one.
    pub fn shutdown(&mut self) {
        self.teardown_and_reset();
    }

    /// Drain transport events and classify newly arrived messages.
    ///
    /// Non-blocking. Events from a superseded connection generation are
    /// discarded. Returns the number of messages appended to the log.
    pub fn poll(&mut self) -> usize {
        let Some(rx) = self.rx.as_mut() else {
            return 0;
        };
        let generation = self
            .manager
            .as_ref()
            .map_or(0, ConnectionManager::generation);

        let mut appended = 0;
        while let Ok(delivery) = rx.try_recv() {
            if delivery.generation != generation {
                continue;
            }
            match delivery.event {
                ConnectionEvent::Ready(ready) => self.ready = ready,
                ConnectionEvent::Frame(message) => {
                    self.log.push(message);
                    appended += 1;
                }
                ConnectionEvent::Malformed { reason } => {
                    debug!(%reason, "skipped malformed frame");
                }
            }
        }

        if appended > 0 {
            self.reconcile();
        }
        appended
    }

    /// Commit buffered live updates: prepend `pending` (in arrival order)
    /// to the front of `messages` and clear it. A no-op when `pending` is
    /// empty.
    pub fn refresh(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let mut committed = std::mem::take(&mut self.pending);
        committed.append(&mut self.messages);
        self.messages = committed;
    }

    /// Messages currently presented to the caller.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Messages received but not yet committed.
    #[must_use]
    pub fn pending(&self) -> &[Message] {
        &self.pending
    }

    /// Every normalized message received for the current key, in arrival
    /// order. Never truncated while the key is unchanged.
    #[must_use]
    pub fn log(&self) -> &[Message] {
        &self.log
    }

    /// Whether the transport is currently open.
    #[must_use]
    pub fn ready(&self) -> bool {
        self.ready
    }

    /// Whether the initial reveal has not happened yet for this key.
    #[must_use]
    pub fn loading(&self) -> bool {
        self.loading
    }

    /// The active subscription key, if any.
    #[must_use]
    pub fn key(&self) -> Option<&SubscriptionKey> {
        self.key.as_ref()
    }

    /// Lifecycle state of the underlying connection.
    #[must_use]
    pub fn connection_state(&self) -> ConnState {
        self.manager
            .as_ref()
            .map_or(ConnState::Disconnected, ConnectionManager::state)
    }

    /// Classify log entries not yet in either tier. The first batch while
    /// `messages` is empty is the initial reveal; later arrivals buffer in
    /// `pending` until the caller commits.
    fn reconcile(&mut self) {
        let classified = self.messages.len() + self.pending.len();
        if classified >= self.log.len() {
            return;
        }
        let new_items = self.log[classified..].to_vec();
        if self.messages.is_empty() {
            self.messages.extend(new_items);
            self.loading = false;
        } else {
            self.pending.extend(new_items);
        }
    }

    fn start(&mut self, key: SubscriptionKey) {
        let generation = self.next_generation;
        self.next_generation += 1;
        self.current.store(generation, Ordering::SeqCst);

        let (tx, rx) = mpsc::channel(self.config.channel_capacity.max(1));
        let url = key.endpoint_url(&self.config.ws_base, self.config.backlog);
        debug!(key = %key, %url, generation, "subscribing");

        self.manager = Some(ConnectionManager::spawn(
            url,
            Arc::clone(&self.connector),
            generation,
            Arc::clone(&self.current),
            tx,
        ));
        self.rx = Some(rx);
        self.key = Some(key);
    }

    fn teardown_and_reset(&mut self) {
        if let Some(manager) = self.manager.take() {
            manager.shutdown();
        }
        self.rx = None;
        self.key = None;
        self.log.clear();
        self.messages.clear();
        self.pending.clear();
        self.ready = false;
        self.loading = true;
    }
}
