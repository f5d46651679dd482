//! WebSocket Transport
//!
//! Client-side WebSocket transport to the gateway's stream endpoints.
//! Text frames are passed through as-is; binary frames are accepted when
//! they are valid UTF-8; ping/pong is handled by tungstenite underneath
//! and skipped here; a close frame or exhausted stream ends the connection
//! cleanly.

use async_trait::async_trait;
use futures::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::debug;

use super::{StreamTransport, TransportConnector, TransportError};

/// Connector opening real WebSocket connections.
#[derive(Clone, Copy, Debug, Default)]
pub struct WebSocketConnector;

#[async_trait]
impl TransportConnector for WebSocketConnector {
    async fn connect(&self, url: &str) -> Result<Box<dyn StreamTransport>, TransportError> {
        let (stream, _response) = connect_async(url)
            .await
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;
        debug!(%url, "websocket connected");
        Ok(Box::new(WebSocketTransport { inner: stream }))
    }
}

/// One live WebSocket connection.
pub struct WebSocketTransport {
    inner: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl StreamTransport for WebSocketTransport {
    async fn recv(&mut self) -> Result<Option<String>, TransportError> {
        loop {
            match self.inner.next().await {
                Some(Ok(WsMessage::Text(text))) => return Ok(Some(text)),
                Some(Ok(WsMessage::Binary(bytes))) => {
                    let text = String::from_utf8(bytes)
                        .map_err(|e| TransportError::ReceiveFailed(e.to_string()))?;
                    return Ok(Some(text));
                }
                Some(Ok(WsMessage::Close(_))) | None => return Ok(None),
                // Ping/pong and raw frames carry no payload for us
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(TransportError::ReceiveFailed(e.to_string())),
            }
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.inner
            .close(None)
            .await
            .map_err(|e| TransportError::ReceiveFailed(e.to_string()))
    }
}
