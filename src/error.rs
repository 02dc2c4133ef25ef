//! Error types for the inbox real-time layer

use thiserror::Error;

/// Main error type for the inbox real-time layer
///
/// Most of these never reach a consumer: the fail-soft boundaries (count
/// fetches, read-state storage, socket sends) log them and fall back to a safe
/// default. They surface from constructors and from the lower-level helpers.
#[derive(Error, Debug)]
pub enum RealtimeError {
    /// Connection error when reaching the notification service
    #[error("Connection error: {0}")]
    Connection(String),

    /// JSON decode error
    #[error("JSON decode error: {0}")]
    JsonDecode(#[from] serde_json::Error),

    /// Server frame parse error with optional raw data
    #[error("Message parse error: {message}")]
    MessageParse {
        /// Error message
        message: String,
        /// Raw frame that failed to parse
        raw: Option<String>,
    },

    /// HTTP error from the count snapshot endpoint
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid endpoint URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Read-state storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Timeout error
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Subscriber callback failure
    #[error("Subscriber error: {0}")]
    Subscriber(String),
}

/// Result type alias for real-time operations
pub type Result<T> = std::result::Result<T, RealtimeError>;

impl RealtimeError {
    /// Create a connection error
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create a message parse error
    pub fn message_parse(msg: impl Into<String>, raw: Option<String>) -> Self {
        Self::MessageParse {
            message: msg.into(),
            raw,
        }
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a timeout error
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create a subscriber error
    pub fn subscriber(msg: impl Into<String>) -> Self {
        Self::Subscriber(msg.into())
    }
}
