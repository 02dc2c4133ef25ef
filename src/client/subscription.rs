//! Unsubscribe handle returned by `RealtimeClient::subscribe`

use std::sync::Weak;

use crate::types::{SubscriberId, SubscriptionChannel};

/// Something a subscriber can be released from
pub(crate) trait Release: Send + Sync {
    fn release(&self, channel: SubscriptionChannel, id: SubscriberId);
}

/// Handle for one registered callback
///
/// Call [`Subscription::unsubscribe`] when the consumer goes away. Dropping the
/// handle without calling it leaves the callback registered.
#[must_use = "keep the handle to unsubscribe later"]
pub struct Subscription {
    channel: SubscriptionChannel,
    id: SubscriberId,
    owner: Weak<dyn Release>,
}

impl Subscription {
    pub(crate) fn new(channel: SubscriptionChannel, id: SubscriberId, owner: Weak<dyn Release>) -> Self {
        Self { channel, id, owner }
    }

    /// Channel this handle is registered on
    #[must_use]
    pub const fn channel(&self) -> SubscriptionChannel {
        self.channel
    }

    /// Registry id of the callback
    #[must_use]
    pub const fn id(&self) -> SubscriberId {
        self.id
    }

    /// Remove the callback
    ///
    /// When it was the channel's last subscriber and the socket is open, an
    /// `unsubscribe` control frame is sent.
    pub fn unsubscribe(self) {
        if let Some(owner) = self.owner.upgrade() {
            owner.release(self.channel, self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("channel", &self.channel)
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}
