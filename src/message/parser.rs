//! Parser for notification service frames

use crate::error::{RealtimeError, Result};
use crate::types::messages::{RawServerFrame, ServerMessage};

/// Parse a text frame into a typed [`ServerMessage`]
///
/// Any JSON object with a string `type` parses; discriminants this client does
/// not know become [`ServerMessage::Unknown`] rather than an error, so the
/// caller can log them and keep the connection.
///
/// # Errors
/// Returns `RealtimeError::MessageParse` if the frame is not JSON or has no `type`
pub fn parse_server_message(text: &str) -> Result<ServerMessage> {
    serde_json::from_str::<RawServerFrame>(text)
        .map(ServerMessage::from)
        .map_err(|e| {
            RealtimeError::message_parse(
                format!("Failed to parse server frame: {e}"),
                Some(text.to_string()),
            )
        })
}
