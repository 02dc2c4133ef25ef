//! `RealtimeClient` implementation
//!
//! This module contains the constructor and public API methods for `RealtimeClient`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde_json::{Map, Value};
use tokio::sync::watch;

use crate::registry::{SubscriptionCallback, SubscriptionRegistry};
use crate::transport::{Transport, WebSocketTransport};
use crate::types::{ClientFrame, RealtimeOptions, SubscriberId, SubscriptionChannel};

use super::backoff::Backoff;
use super::subscription::{Release, Subscription};
use super::{ClientInner, ConnectionState, Link, RealtimeClient};

impl RealtimeClient<WebSocketTransport> {
    /// Create a client talking to `options.ws_endpoint` over WebSocket
    ///
    /// No connection is opened until the first subscription.
    #[must_use]
    pub fn new(options: &RealtimeOptions) -> Self {
        Self::with_transport(
            options,
            WebSocketTransport::with_connect_timeout(options.connect_timeout),
        )
    }
}

impl<T: Transport> RealtimeClient<T> {
    /// Create a client over a custom transport
    #[must_use]
    pub fn with_transport(options: &RealtimeOptions, transport: T) -> Self {
        let (connected_tx, _) = watch::channel(false);
        Self {
            inner: Arc::new(ClientInner {
                endpoint: options.ws_endpoint.clone(),
                heartbeat_interval: options.heartbeat_interval,
                transport,
                registry: Mutex::new(SubscriptionRegistry::new()),
                link: Mutex::new(Link {
                    state: ConnectionState::Idle,
                    outbound: None,
                    backoff: Backoff::new(
                        options.reconnect_base_delay,
                        options.max_reconnect_attempts,
                    ),
                    supervising: false,
                    supervisor: None,
                }),
                should_reconnect: AtomicBool::new(true),
                connected_tx,
            }),
        }
    }

    /// Start the connection supervisor if it is not already running
    ///
    /// Idempotent while a socket is open or being opened. After the client
    /// gave up reconnecting, a call makes one fresh attempt. After
    /// [`shutdown`](Self::shutdown) it does nothing.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn connect(&self) {
        if !self.inner.should_reconnect.load(Ordering::SeqCst) {
            log::debug!("Client is shut down; ignoring connect");
            return;
        }

        let mut link = self.inner.link.lock();
        if link.supervising {
            return;
        }
        link.supervising = true;
        let inner = Arc::clone(&self.inner);
        link.supervisor = Some(tokio::spawn(async move {
            inner.supervise().await;
        }));
    }

    /// Register `callback` for `channel`
    ///
    /// Opens the connection if needed. When the socket is already open a
    /// `subscribe` frame goes out immediately; otherwise the channel is
    /// subscribed when the socket opens.
    pub fn subscribe(&self, channel: SubscriptionChannel, callback: SubscriptionCallback) -> Subscription {
        let id = self.inner.registry.lock().add(channel, callback);
        log::debug!("Subscribed callback {id} to {channel}");

        if !self.inner.send_frame(&ClientFrame::Subscribe {
            subscription_type: channel,
        }) {
            self.connect();
        }

        let owner: Weak<ClientInner<T>> = Arc::downgrade(&self.inner);
        let owner: Weak<dyn Release> = owner;
        Subscription::new(channel, id, owner)
    }

    /// Drop every subscriber of `channel`
    ///
    /// Sends an `unsubscribe` frame when the socket is open.
    pub fn unsubscribe(&self, channel: SubscriptionChannel) {
        let removed = self.inner.registry.lock().remove_channel(channel);
        log::debug!("Removed {removed} subscriber(s) from {channel}");
        self.inner.send_frame(&ClientFrame::Unsubscribe {
            subscription_type: channel,
        });
    }

    /// Send an arbitrary action frame
    ///
    /// Object `data` is merged into the frame next to `action`. Any other
    /// value is kept under a `data` key instead of being dropped, so
    /// `send("echo", Some(json!(5)))` sends `{"action":"echo","data":5}`.
    /// Returns `false` without queueing anything when the socket is not open.
    pub fn send(&self, action: &str, data: Option<Value>) -> bool {
        let mut frame = Map::new();
        frame.insert("action".to_string(), Value::String(action.to_string()));
        match data {
            Some(Value::Object(fields)) => frame.extend(fields),
            Some(other) => {
                frame.insert("data".to_string(), other);
            }
            None => {}
        }

        let text = Value::Object(frame).to_string();
        if self.inner.send_text(text) {
            true
        } else {
            log::warn!("WebSocket not connected, cannot send message");
            false
        }
    }

    /// Whether the socket is currently open
    #[must_use]
    pub fn is_connected(&self) -> bool {
        *self.inner.connected_tx.borrow()
    }

    /// Current connection state
    #[must_use]
    pub fn connection_state(&self) -> ConnectionState {
        self.inner.link.lock().state
    }

    /// Watch `is_connected` transitions
    #[must_use]
    pub fn connection_watch(&self) -> watch::Receiver<bool> {
        self.inner.connected_tx.subscribe()
    }

    /// Reconnect attempts scheduled since the last successful open
    #[must_use]
    pub fn reconnect_attempts(&self) -> u32 {
        self.inner.link.lock().backoff.attempts()
    }

    /// Number of callbacks registered on `channel`
    #[must_use]
    pub fn subscriber_count(&self, channel: SubscriptionChannel) -> usize {
        self.inner.registry.lock().subscriber_count(channel)
    }

    /// Close the socket and stop reconnecting
    ///
    /// Registered callbacks are kept but never invoked again.
    pub fn shutdown(&self) {
        let mut link = self.inner.link.lock();
        self.inner.should_reconnect.store(false, Ordering::SeqCst);
        if let Some(handle) = link.supervisor.take() {
            handle.abort();
        }
        link.supervising = false;
        // Dropping the sender closes the socket
        link.outbound = None;
        link.state = ConnectionState::Idle;
        drop(link);

        self.inner.connected_tx.send_replace(false);
        log::info!("Realtime client shut down");
    }
}

impl<T> ClientInner<T> {
    /// Serialize and send a control frame if the socket is open
    pub(super) fn send_frame(&self, frame: &ClientFrame) -> bool {
        match frame.to_json() {
            Ok(text) => self.send_text(text),
            Err(e) => {
                log::error!("Failed to serialize {frame:?}: {e}");
                false
            }
        }
    }

    /// Queue a text frame if the socket is open
    pub(super) fn send_text(&self, text: String) -> bool {
        let link = self.link.lock();
        match &link.outbound {
            Some(outbound) if link.state == ConnectionState::Open => outbound.send(text).is_ok(),
            _ => false,
        }
    }
}

impl<T: Send + Sync> Release for ClientInner<T> {
    fn release(&self, channel: SubscriptionChannel, id: SubscriberId) {
        let removal = self.registry.lock().remove(channel, id);
        if !removal.removed {
            return;
        }
        log::debug!("Unsubscribed callback {id} from {channel}");
        if removal.channel_empty {
            self.send_frame(&ClientFrame::Unsubscribe {
                subscription_type: channel,
            });
        }
    }
}
