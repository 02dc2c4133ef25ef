//! Subscription registry and fan-out
//!
//! Many consumers share the one socket. The registry records which callbacks
//! want which channel; its per-channel sets decide whether the connection
//! manager keeps a server-side subscription for that channel.

use std::collections::BTreeMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use crate::error::Result;
use crate::types::{SubscriberId, SubscriptionChannel};

/// Callback invoked with the `data` payload of a channel message
pub type SubscriptionCallback = Arc<dyn Fn(&serde_json::Value) -> Result<()> + Send + Sync>;

/// A registered callback with its identity
#[derive(Clone)]
pub struct Subscriber {
    /// Registry-assigned id
    pub id: SubscriberId,
    /// The callback
    pub callback: SubscriptionCallback,
}

/// Outcome of removing a single subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Removal {
    /// Whether the subscriber was present
    pub removed: bool,
    /// Whether its channel has no subscribers left
    pub channel_empty: bool,
}

/// Channel → subscriber set, deduplicated by callback identity
#[derive(Default)]
pub struct SubscriptionRegistry {
    channels: BTreeMap<SubscriptionChannel, Vec<Subscriber>>,
    next_id: u64,
}

impl SubscriptionRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a subscription callback from a closure
    pub fn callback<F>(f: F) -> SubscriptionCallback
    where
        F: Fn(&serde_json::Value) -> Result<()> + Send + Sync + 'static,
    {
        Arc::new(f)
    }

    /// Add a callback to a channel
    ///
    /// Registering the same callback (same `Arc`) twice on a channel keeps one
    /// entry and returns the existing id.
    pub fn add(&mut self, channel: SubscriptionChannel, callback: SubscriptionCallback) -> SubscriberId {
        let subscribers = self.channels.entry(channel).or_default();
        if let Some(existing) = subscribers
            .iter()
            .find(|s| same_callback(&s.callback, &callback))
        {
            return existing.id;
        }

        self.next_id += 1;
        let id = SubscriberId::new(self.next_id);
        subscribers.push(Subscriber { id, callback });
        id
    }

    /// Remove one subscriber from a channel
    pub fn remove(&mut self, channel: SubscriptionChannel, id: SubscriberId) -> Removal {
        let Some(subscribers) = self.channels.get_mut(&channel) else {
            return Removal {
                removed: false,
                channel_empty: true,
            };
        };

        let before = subscribers.len();
        subscribers.retain(|s| s.id != id);
        let removed = subscribers.len() != before;
        let channel_empty = subscribers.is_empty();
        if channel_empty {
            self.channels.remove(&channel);
        }
        Removal {
            removed,
            channel_empty,
        }
    }

    /// Drop every subscriber of a channel; returns how many were removed
    pub fn remove_channel(&mut self, channel: SubscriptionChannel) -> usize {
        self.channels.remove(&channel).map_or(0, |s| s.len())
    }

    /// Number of subscribers on a channel
    #[must_use]
    pub fn subscriber_count(&self, channel: SubscriptionChannel) -> usize {
        self.channels.get(&channel).map_or(0, Vec::len)
    }

    /// Channels with at least one live subscriber, in stable order
    #[must_use]
    pub fn active_channels(&self) -> Vec<SubscriptionChannel> {
        self.channels
            .iter()
            .filter(|(_, subscribers)| !subscribers.is_empty())
            .map(|(channel, _)| *channel)
            .collect()
    }

    /// Snapshot of a channel's subscribers
    ///
    /// Dispatch works on the snapshot so callbacks may subscribe or
    /// unsubscribe without deadlocking on the registry.
    #[must_use]
    pub fn subscribers(&self, channel: SubscriptionChannel) -> Vec<Subscriber> {
        self.channels.get(&channel).cloned().unwrap_or_default()
    }
}

fn same_callback(a: &SubscriptionCallback, b: &SubscriptionCallback) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// Invoke every subscriber with a payload, isolating failures
///
/// A callback returning `Err` or panicking is logged and skipped; the others
/// still run. Returns the number of callbacks that completed successfully.
pub fn fan_out(channel: SubscriptionChannel, subscribers: &[Subscriber], data: &serde_json::Value) -> usize {
    if subscribers.is_empty() {
        log::warn!("No subscribers found for {channel}");
        return 0;
    }
    log::debug!("Found {} subscriber(s) for {channel}", subscribers.len());

    let mut delivered = 0;
    for (index, subscriber) in subscribers.iter().enumerate() {
        match catch_unwind(AssertUnwindSafe(|| (subscriber.callback)(data))) {
            Ok(Ok(())) => delivered += 1,
            Ok(Err(e)) => {
                log::warn!("Error in {channel} subscription callback {}: {e}", index + 1);
            }
            Err(panic) => {
                log::warn!(
                    "Subscription callback {} for {channel} panicked: {}",
                    index + 1,
                    panic_message(panic.as_ref())
                );
            }
        }
    }
    delivered
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic>")
}
