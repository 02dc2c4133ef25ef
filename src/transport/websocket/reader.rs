//! Frame reading for the WebSocket transport

use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{self, Message};

use crate::transport::SocketEvent;

/// Forward incoming frames until the socket closes
///
/// Always finishes with exactly one [`SocketEvent::Closed`], preceded by a
/// [`SocketEvent::Error`] when the socket failed.
pub(super) fn spawn_reader<S>(mut stream: S, tx: mpsc::UnboundedSender<SocketEvent>)
where
    S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let closed = loop {
            match stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    if tx.send(SocketEvent::Message(text)).is_err() {
                        // Receiver dropped, stop reading
                        return;
                    }
                }
                Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes) {
                    Ok(text) => {
                        if tx.send(SocketEvent::Message(text)).is_err() {
                            return;
                        }
                    }
                    Err(_) => log::debug!("Ignoring non-UTF-8 binary frame"),
                },
                Some(Ok(Message::Close(frame))) => {
                    break match frame {
                        Some(frame) => SocketEvent::Closed {
                            code: Some(u16::from(frame.code)),
                            reason: frame.reason.into_owned(),
                        },
                        None => SocketEvent::Closed {
                            code: None,
                            reason: String::new(),
                        },
                    };
                }
                // Pings are answered by tungstenite itself
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    let _ = tx.send(SocketEvent::Error(e.to_string()));
                    break SocketEvent::Closed {
                        code: None,
                        reason: e.to_string(),
                    };
                }
                None => {
                    break SocketEvent::Closed {
                        code: None,
                        reason: "stream ended".to_string(),
                    };
                }
            }
        };
        let _ = tx.send(closed);
    });
}
