//! WebSocket transport using tokio-tungstenite
//!
//! The socket is split into a writer task draining the outbound channel and a
//! reader task forwarding frames as [`SocketEvent`](super::SocketEvent)s.

mod reader;
mod transport;

pub use transport::{DEFAULT_CONNECT_TIMEOUT, WebSocketTransport};
