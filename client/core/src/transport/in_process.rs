//! In-Process Transport
//!
//! Channel-backed transport for tests and embedded use. A
//! [`ChannelConnector`] holds a queue of scripted connection attempts:
//! each call to `connect` consumes the next attempt, which is either a
//! refusal or an accepted connection fed by an [`mpsc`] sender held by the
//! test. Dropping the sender closes the connection, which is how tests
//! exercise the reconnect path.
//!
//! Attempts must be scripted before the connector is asked to connect;
//! an unscripted attempt is refused.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::{StreamTransport, TransportConnector, TransportError};

/// One scripted connection attempt.
enum Attempt {
    /// The attempt fails with a connection error.
    Refuse,
    /// The attempt succeeds; frames arrive from the paired sender.
    Accept(mpsc::UnboundedReceiver<String>),
}

/// Connector yielding scripted in-process connections.
#[derive(Clone, Default)]
pub struct ChannelConnector {
    attempts: Arc<Mutex<VecDeque<Attempt>>>,
}

impl ChannelConnector {
    /// Create a connector with no scripted attempts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the next attempt to be refused.
    pub fn refuse_next(&self) {
        self.attempts.lock().push_back(Attempt::Refuse);
    }

    /// Script the next attempt to be accepted.
    ///
    /// Returns the sender that feeds frames to the connection. Dropping it
    /// closes the connection from the server side.
    pub fn accept_next(&self) -> mpsc::UnboundedSender<String> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.attempts.lock().push_back(Attempt::Accept(rx));
        tx
    }

    /// Number of attempts not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.attempts.lock().len()
    }
}

#[async_trait]
impl TransportConnector for ChannelConnector {
    async fn connect(&self, _url: &str) -> Result<Box<dyn StreamTransport>, TransportError> {
        let attempt = self.attempts.lock().pop_front();
        match attempt {
            Some(Attempt::Accept(rx)) => Ok(Box::new(ChannelTransport { rx })),
            Some(Attempt::Refuse) => Err(TransportError::ConnectionFailed(
                "scripted refusal".to_string(),
            )),
            None => Err(TransportError::ConnectionFailed(
                "no scripted attempt".to_string(),
            )),
        }
    }
}

/// Channel-backed connection produced by [`ChannelConnector`].
pub struct ChannelTransport {
    rx: mpsc::UnboundedReceiver<String>,
}

#[async_trait]
impl StreamTransport for ChannelTransport {
    async fn recv(&mut self) -> Result<Option<String>, TransportError> {
        Ok(self.rx.recv().await)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.rx.close();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_accepted_attempt_delivers_frames() {
        let connector = ChannelConnector::new();
        let tx = connector.accept_next();

        let mut transport = connector.connect("test://").await.unwrap();
        tx.send(r#"{"title":"one"}"#.to_string()).unwrap();

        let frame = transport.recv().await.unwrap();
        assert_eq!(frame.as_deref(), Some(r#"{"title":"one"}"#));
    }

    #[tokio::test]
    async fn test_dropping_sender_closes_connection() {
        let connector = ChannelConnector::new();
        let tx = connector.accept_next();
        let mut transport = connector.connect("test://").await.unwrap();

        drop(tx);
        assert!(transport.recv().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_refused_attempt() {
        let connector = ChannelConnector::new();
        connector.refuse_next();

        let result = connector.connect("test://").await;
        assert!(matches!(result, Err(TransportError::ConnectionFailed(_))));
    }

    #[tokio::test]
    async fn test_unscripted_attempt_is_refused() {
        let connector = ChannelConnector::new();
        assert!(connector.connect("test://").await.is_err());
        assert_eq!(connector.remaining(), 0);
    }

    #[tokio::test]
    async fn test_attempts_consumed_in_order() {
        let connector = ChannelConnector::new();
        connector.refuse_next();
        let _tx = connector.accept_next();
        assert_eq!(connector.remaining(), 2);

        assert!(connector.connect("test://").await.is_err());
        assert!(connector.connect("test://").await.is_ok());
        assert_eq!(connector.remaining(), 0);
    }
}
