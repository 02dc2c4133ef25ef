//! `RealtimeClient`: the dashboard's single notification socket
//!
//! This module provides the connection manager and the subscription
//! multiplexer built on top of it:
//! - One physical socket shared by every consumer
//! - Lazy connection on first subscribe
//! - Exponential reconnect backoff with a fixed ceiling
//! - Subscription replay after every (re)connect
//! - Keepalive pings while open
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     RealtimeClient                        │
//! │                                                           │
//! │  subscribe / unsubscribe / send        Supervisor task    │
//! │  ┌─────────────────────┐         ┌────────────────────┐  │
//! │  │ SubscriptionRegistry│◀────────│ connect → session  │  │
//! │  │  (channel → set)    │ fan-out │ → backoff → retry  │  │
//! │  └─────────────────────┘         └─────────┬──────────┘  │
//! │            │ control frames                │              │
//! │            └──────────▶  outbound sender ◀─┘              │
//! │                          (Some only while Open)           │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! The supervisor owns the socket for its whole life. Consumers only touch
//! the registry and, when the socket is open, a clone of its outbound sender,
//! so nothing blocks on network I/O.
//!
//! # Example
//!
//! ```no_run
//! use inbox_realtime::{RealtimeClient, RealtimeOptions, SubscriptionChannel, SubscriptionRegistry};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = RealtimeClient::new(&RealtimeOptions::from_env());
//!
//! let subscription = client.subscribe(
//!     SubscriptionChannel::ChatUpdates,
//!     SubscriptionRegistry::callback(|data| {
//!         log::info!("chat update: {data}");
//!         Ok(())
//!     }),
//! );
//!
//! // ...later, when the consumer goes away
//! subscription.unsubscribe();
//! client.shutdown();
//! # Ok(())
//! # }
//! ```

mod backoff;
mod client_impl;
mod subscription;
mod tasks;

pub use backoff::Backoff;
pub use subscription::Subscription;

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use url::Url;

use crate::registry::SubscriptionRegistry;
use crate::transport::{Transport, WebSocketTransport};

/// Readiness of the physical connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No socket and no attempt pending (initial, shut down, or gave up)
    Idle,
    /// A socket is being opened
    Connecting,
    /// The socket is open
    Open,
    /// The socket closed; a retry may be scheduled
    Closed,
}

/// Client owning the single notification socket
///
/// Cheap to clone; clones share the connection and the registry. Construct
/// one at the composition root and hand clones to consumers.
pub struct RealtimeClient<T: Transport = WebSocketTransport> {
    inner: Arc<ClientInner<T>>,
}

impl<T: Transport> Clone for RealtimeClient<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Shared state behind every clone of a client
pub(crate) struct ClientInner<T> {
    /// Notification service endpoint
    endpoint: Url,
    /// Keepalive interval while open
    heartbeat_interval: Duration,
    /// Socket factory
    transport: T,
    /// Channel subscribers
    registry: Mutex<SubscriptionRegistry>,
    /// Connection bookkeeping
    link: Mutex<Link>,
    /// Cleared by `shutdown`; no reconnect is scheduled once false
    should_reconnect: AtomicBool,
    /// Publishes `is_connected` transitions
    connected_tx: watch::Sender<bool>,
}

/// Connection bookkeeping guarded by one lock
struct Link {
    /// Current readiness
    state: ConnectionState,
    /// Sender of the open socket; `Some` only while `Open`
    outbound: Option<mpsc::UnboundedSender<String>>,
    /// Reconnect schedule
    backoff: backoff::Backoff,
    /// Whether a supervisor task is alive
    supervising: bool,
    /// Handle of the supervisor task, aborted on shutdown
    supervisor: Option<JoinHandle<()>>,
}
