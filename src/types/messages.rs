//! Wire types for the dashboard notification socket
//!
//! Client frames are control frames (`{"action": ...}`); server frames carry a
//! `type` discriminant and, for the data channels, a `data` payload.

use serde::{Deserialize, Serialize};

/// Named category of server-pushed events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionChannel {
    /// Full chat listing snapshots
    ChatUpdates,
    /// Per-section chat counts
    UnreadCounts,
    /// Website ingestion status
    WebsiteStatus,
}

impl SubscriptionChannel {
    /// Every channel, in a stable order
    pub const ALL: [Self; 3] = [Self::ChatUpdates, Self::UnreadCounts, Self::WebsiteStatus];

    /// Wire name of the channel
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ChatUpdates => "chat_updates",
            Self::UnreadCounts => "unread_counts",
            Self::WebsiteStatus => "website_status",
        }
    }

    /// Parse a wire name
    #[must_use]
    pub fn from_wire(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }
}

impl std::fmt::Display for SubscriptionChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Control frame sent from the client to the notification service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientFrame {
    /// Start receiving a channel
    Subscribe {
        /// Channel to subscribe to
        subscription_type: SubscriptionChannel,
    },
    /// Stop receiving a channel
    Unsubscribe {
        /// Channel to unsubscribe from
        subscription_type: SubscriptionChannel,
    },
    /// Keepalive
    Ping,
}

impl ClientFrame {
    /// Serialize to the JSON text sent on the socket
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Frame received from the notification service
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    /// Connection handshake acknowledgement
    Connected {
        /// Server-assigned connection id
        connection_id: Option<String>,
    },
    /// Subscription confirmed
    Subscribed {
        /// Confirmed channel name
        subscription_type: Option<String>,
    },
    /// Unsubscription confirmed
    Unsubscribed {
        /// Released channel name
        subscription_type: Option<String>,
    },
    /// Data pushed on a channel
    Data {
        /// Channel the payload belongs to
        channel: SubscriptionChannel,
        /// Channel payload (`null` when absent)
        data: serde_json::Value,
    },
    /// Heartbeat acknowledgement
    Pong,
    /// Server-side error report
    Error {
        /// Error text
        message: Option<String>,
    },
    /// Any other `type`
    Unknown {
        /// The unrecognized discriminant
        kind: String,
    },
}

/// Loose shape of every server frame, before dispatch on `type`
#[derive(Debug, Deserialize)]
pub(crate) struct RawServerFrame {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    #[serde(default)]
    pub connection_id: Option<String>,
    #[serde(default)]
    pub subscription_type: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl From<RawServerFrame> for ServerMessage {
    fn from(raw: RawServerFrame) -> Self {
        if let Some(channel) = SubscriptionChannel::from_wire(&raw.kind) {
            return Self::Data {
                channel,
                data: raw.data.unwrap_or(serde_json::Value::Null),
            };
        }
        match raw.kind.as_str() {
            "connected" => Self::Connected {
                connection_id: raw.connection_id,
            },
            "subscribed" => Self::Subscribed {
                subscription_type: raw.subscription_type,
            },
            "unsubscribed" => Self::Unsubscribed {
                subscription_type: raw.subscription_type,
            },
            "pong" => Self::Pong,
            "error" => Self::Error {
                message: raw.message,
            },
            _ => Self::Unknown { kind: raw.kind },
        }
    }
}
