//! # Inbox Realtime
//!
//! The real-time layer of the support inbox dashboard: one multiplexed
//! WebSocket to the notification service, and per-section unread counts kept
//! in sync from both pushes and REST polling.
//!
//! ## Quick Start
//!
//! ```no_run
//! use inbox_realtime::{
//!     FileReadStateStore, HttpCountSource, RealtimeClient, RealtimeOptions, SectionId,
//!     UnreadReconciler,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let options = RealtimeOptions::from_env();
//!
//!     let client = RealtimeClient::new(&options);
//!     let reconciler = UnreadReconciler::new(
//!         FileReadStateStore::new(std::env::temp_dir()),
//!         HttpCountSource::new(&options)?,
//!     );
//!
//!     reconciler.attach(&client);
//!     reconciler.refresh_counts().await;
//!
//!     let unread = reconciler.get_unread_count(&SectionId::from("human-chats"));
//!     log::info!("{unread} unread chat(s)");
//!
//!     reconciler.on_route_change("/inbox/my-inbox/chats").await;
//!
//!     reconciler.shutdown();
//!     client.shutdown();
//!     Ok(())
//! }
//! ```
//!
//! ## Core Features
//!
//! ### 1. Shared Socket with [`RealtimeClient`]
//!
//! Consumers subscribe to channels (`chat_updates`, `unread_counts`,
//! `website_status`). The first subscription opens the socket; every
//! reconnect replays the channels that still have subscribers. A failing or
//! panicking callback never affects the others.
//!
//! ```no_run
//! # use inbox_realtime::{RealtimeClient, RealtimeOptions, SubscriptionChannel, SubscriptionRegistry};
//! # async fn example() {
//! let client = RealtimeClient::new(&RealtimeOptions::default());
//! let subscription = client.subscribe(
//!     SubscriptionChannel::WebsiteStatus,
//!     SubscriptionRegistry::callback(|status| {
//!         log::info!("website status: {status}");
//!         Ok(())
//!     }),
//! );
//! subscription.unsubscribe();
//! # }
//! ```
//!
//! ### 2. Unread Counts with [`UnreadReconciler`]
//!
//! Unread = current total − count seen at the last visit, never negative.
//! A section never visited is entirely unread. Visiting a section marks it
//! read immediately and stores the fresh total as the new cursor.
//!
//! ## Architecture
//!
//! - [`types`]: Identifiers, wire frames, options, read state, section tables
//! - [`client`]: Connection manager and subscription API
//! - [`registry`]: Channel → callback sets and isolated fan-out
//! - [`transport`]: Socket abstraction and the WebSocket implementation
//! - [`message`]: Server frame parsing
//! - [`counts`]: Per-section chat counts from the REST snapshot
//! - [`store`]: Persistent read cursors
//! - [`unread`]: Reconciler and periodic refresh
//! - [`error`]: Error types and handling
//!
//! ## Error Handling
//!
//! Nothing in this layer is fatal to the host. Network, storage and protocol
//! failures are logged and replaced by a safe default (a count of 0, an empty
//! read state, a dropped frame). Constructors return
//! [`Result<T, RealtimeError>`](Result).

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod counts;
pub mod error;
pub mod message;
pub mod registry;
pub mod store;
pub mod transport;
pub mod types;
pub mod unread;

// Re-export commonly used types for external API
pub use client::{ConnectionState, RealtimeClient, Subscription};
pub use counts::{CountSource, HttpCountSource};
pub use error::{RealtimeError, Result};
pub use message::parse_server_message;
pub use registry::{SubscriptionCallback, SubscriptionRegistry};
pub use store::{FileReadStateStore, MemoryReadStateStore, ReadStateStore};
pub use transport::{SocketConnection, SocketEvent, Transport, WebSocketTransport};
pub use unread::{RefreshScheduler, UnreadReconciler, UnreadSnapshot};

// Re-export type submodules for flat public API
pub use types::identifiers::{SectionId, ServerSection, SubscriberId};
pub use types::messages::{ClientFrame, ServerMessage, SubscriptionChannel};
pub use types::options::{RealtimeOptions, RealtimeOptionsBuilder};
pub use types::read_state::{ReadStateMap, SectionReadState, UnreadCountMap};

/// Version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
