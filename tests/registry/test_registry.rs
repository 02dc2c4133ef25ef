//! Unit tests for `SubscriptionRegistry`
//!
//! Tests subscriber bookkeeping and isolated fan-out

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use inbox_realtime::registry::fan_out;
use inbox_realtime::{RealtimeError, SubscriptionCallback, SubscriptionChannel, SubscriptionRegistry};
use serde_json::json;

fn counting(counter: &Arc<AtomicUsize>) -> SubscriptionCallback {
    let counter = Arc::clone(counter);
    SubscriptionRegistry::callback(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })
}

#[test]
fn test_active_channels_are_ordered_and_non_empty() {
    let mut registry = SubscriptionRegistry::new();
    let counter = Arc::new(AtomicUsize::new(0));

    registry.add(SubscriptionChannel::WebsiteStatus, counting(&counter));
    let chat = registry.add(SubscriptionChannel::ChatUpdates, counting(&counter));
    registry.add(SubscriptionChannel::UnreadCounts, counting(&counter));

    assert_eq!(
        registry.active_channels(),
        vec![
            SubscriptionChannel::ChatUpdates,
            SubscriptionChannel::UnreadCounts,
            SubscriptionChannel::WebsiteStatus,
        ]
    );

    registry.remove(SubscriptionChannel::ChatUpdates, chat);
    assert_eq!(
        registry.active_channels(),
        vec![SubscriptionChannel::UnreadCounts, SubscriptionChannel::WebsiteStatus]
    );
}

#[test]
fn test_distinct_callbacks_get_distinct_ids() {
    let mut registry = SubscriptionRegistry::new();
    let counter = Arc::new(AtomicUsize::new(0));

    let a = registry.add(SubscriptionChannel::ChatUpdates, counting(&counter));
    let b = registry.add(SubscriptionChannel::ChatUpdates, counting(&counter));

    assert_ne!(a, b);
    assert_eq!(registry.subscriber_count(SubscriptionChannel::ChatUpdates), 2);
}

#[test]
fn test_remove_unknown_subscriber_is_harmless() {
    let mut registry = SubscriptionRegistry::new();
    let counter = Arc::new(AtomicUsize::new(0));
    let id = registry.add(SubscriptionChannel::ChatUpdates, counting(&counter));

    let removal = registry.remove(SubscriptionChannel::UnreadCounts, id);
    assert!(!removal.removed);
    assert_eq!(registry.subscriber_count(SubscriptionChannel::ChatUpdates), 1);

    let first = registry.remove(SubscriptionChannel::ChatUpdates, id);
    let again = registry.remove(SubscriptionChannel::ChatUpdates, id);
    assert!(first.removed);
    assert!(!again.removed);
}

#[test]
fn test_remove_channel_drops_everything() {
    let mut registry = SubscriptionRegistry::new();
    let counter = Arc::new(AtomicUsize::new(0));
    registry.add(SubscriptionChannel::UnreadCounts, counting(&counter));
    registry.add(SubscriptionChannel::UnreadCounts, counting(&counter));

    assert_eq!(registry.remove_channel(SubscriptionChannel::UnreadCounts), 2);
    assert_eq!(registry.remove_channel(SubscriptionChannel::UnreadCounts), 0);
    assert!(registry.active_channels().is_empty());
}

#[test]
fn test_fan_out_isolates_failures() {
    let mut registry = SubscriptionRegistry::new();
    let counter = Arc::new(AtomicUsize::new(0));

    registry.add(SubscriptionChannel::ChatUpdates, counting(&counter));
    registry.add(
        SubscriptionChannel::ChatUpdates,
        SubscriptionRegistry::callback(|_| Err(RealtimeError::subscriber("rejected"))),
    );
    registry.add(
        SubscriptionChannel::ChatUpdates,
        SubscriptionRegistry::callback(|_| panic!("subscriber bug")),
    );
    registry.add(SubscriptionChannel::ChatUpdates, counting(&counter));

    let subscribers = registry.subscribers(SubscriptionChannel::ChatUpdates);
    let delivered = fan_out(SubscriptionChannel::ChatUpdates, &subscribers, &json!({"id": 1}));

    assert_eq!(delivered, 2);
    assert_eq!(counter.load(Ordering::SeqCst), 2);
}

#[test]
fn test_fan_out_without_subscribers() {
    let registry = SubscriptionRegistry::new();
    let subscribers = registry.subscribers(SubscriptionChannel::WebsiteStatus);
    assert_eq!(
        fan_out(SubscriptionChannel::WebsiteStatus, &subscribers, &json!(null)),
        0
    );
}
