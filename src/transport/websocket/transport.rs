//! WebSocket transport implementation

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

use crate::error::{RealtimeError, Result};
use crate::transport::{SocketConnection, Transport};

use super::reader::spawn_reader;

/// Default time allowed for the WebSocket handshake
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Transport opening real WebSocket connections
#[derive(Debug, Clone)]
pub struct WebSocketTransport {
    connect_timeout: Duration,
}

impl WebSocketTransport {
    /// Create a transport with the default handshake timeout
    #[must_use]
    pub const fn new() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Create a transport with a custom handshake timeout
    #[must_use]
    pub const fn with_connect_timeout(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

impl Default for WebSocketTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for WebSocketTransport {
    async fn connect(&self, endpoint: &Url) -> Result<SocketConnection> {
        let (stream, _response) =
            tokio::time::timeout(self.connect_timeout, connect_async(endpoint.as_str()))
                .await
                .map_err(|_| {
                    RealtimeError::timeout(format!(
                        "WebSocket handshake with {endpoint} timed out after {:?}",
                        self.connect_timeout
                    ))
                })?
                .map_err(|e| RealtimeError::connection(format!("{endpoint}: {e}")))?;

        let (mut sink, stream) = stream.split();
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<String>();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Some(text) = outbound_rx.recv().await {
                if let Err(e) = sink.send(Message::Text(text)).await {
                    log::debug!("WebSocket write failed: {e}");
                    return;
                }
            }
            // Every sender dropped: the owner is done with this socket.
            let _ = sink.send(Message::Close(None)).await;
            let _ = sink.close().await;
        });

        spawn_reader(stream, inbound_tx);

        Ok(SocketConnection {
            outbound: outbound_tx,
            inbound: inbound_rx,
        })
    }
}
