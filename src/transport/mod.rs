//! Transport layer for the dashboard notification socket
//!
//! This module provides the transport abstraction and the WebSocket
//! implementation. The connection manager only ever sees a
//! [`SocketConnection`]: a sender for outbound text frames and a receiver of
//! [`SocketEvent`]s, so tests can substitute an in-memory transport.

pub mod websocket;

use tokio::sync::mpsc;
use url::Url;

use crate::error::Result;

/// Event observed on an open socket
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    /// Text frame from the server
    Message(String),
    /// Socket-level error; a `Closed` event follows
    Error(String),
    /// The socket closed
    Closed {
        /// Close code, if the peer sent one
        code: Option<u16>,
        /// Close reason, possibly empty
        reason: String,
    },
}

/// An established socket
///
/// Dropping `outbound` closes the socket. `inbound` ends after a
/// [`SocketEvent::Closed`].
#[derive(Debug)]
pub struct SocketConnection {
    /// Text frames to send
    pub outbound: mpsc::UnboundedSender<String>,
    /// Events received
    pub inbound: mpsc::UnboundedReceiver<SocketEvent>,
}

/// Transport trait for opening notification sockets
///
/// Each call opens a fresh socket; the connection manager never reuses one.
pub trait Transport: Send + Sync + 'static {
    /// Open a socket to `endpoint`
    ///
    /// # Errors
    /// Returns error if the socket cannot be established
    fn connect(
        &self,
        endpoint: &Url,
    ) -> impl std::future::Future<Output = Result<SocketConnection>> + Send;
}

pub use websocket::WebSocketTransport;
