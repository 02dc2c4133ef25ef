//! Background tasks for `RealtimeClient`
//!
//! This module contains the connection supervisor: it opens the socket, runs
//! the session (dispatch and heartbeat) until the socket closes, then sleeps
//! out the backoff and tries again.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};

use crate::message::parse_server_message;
use crate::registry::fan_out;
use crate::transport::{SocketConnection, SocketEvent, Transport};
use crate::types::{ClientFrame, ServerMessage};

use super::{ClientInner, ConnectionState};

impl<T: Transport> ClientInner<T> {
    /// Supervisor task - owns the socket across reconnects
    pub(super) async fn supervise(self: Arc<Self>) {
        loop {
            {
                let mut link = self.link.lock();
                if !self.should_reconnect.load(Ordering::SeqCst) {
                    break;
                }
                link.state = ConnectionState::Connecting;
            }
            log::debug!("Connecting to {}", self.endpoint);

            match self.transport.connect(&self.endpoint).await {
                Ok(connection) => self.run_session(connection).await,
                Err(e) => log::error!("WebSocket connection failed: {e}"),
            }
            self.mark_closed();

            if !self.should_reconnect.load(Ordering::SeqCst) {
                break;
            }

            let (delay, attempt, max) = {
                let mut link = self.link.lock();
                let delay = link.backoff.next_delay();
                (delay, link.backoff.attempts(), link.backoff.max_attempts())
            };
            let Some(delay) = delay else {
                log::error!("Max reconnection attempts ({max}) reached, giving up");
                break;
            };
            log::info!(
                "Attempting to reconnect in {}ms (attempt {attempt}/{max})",
                delay.as_millis()
            );
            tokio::time::sleep(delay).await;
        }

        let mut link = self.link.lock();
        link.supervising = false;
        link.supervisor = None;
        link.state = ConnectionState::Idle;
    }

    /// Session task body - dispatch frames and ping until the socket closes
    async fn run_session(&self, connection: SocketConnection) {
        let SocketConnection {
            outbound,
            mut inbound,
        } = connection;
        if !self.on_open(outbound) {
            log::debug!("Client shut down while connecting; dropping socket");
            return;
        }

        let period = self.heartbeat_interval;
        let mut heartbeat = tokio::time::interval_at(Instant::now() + period, period);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                event = inbound.recv() => match event {
                    Some(SocketEvent::Message(text)) => self.handle_frame(&text),
                    Some(SocketEvent::Error(e)) => {
                        log::error!("WebSocket error: {e}");
                        self.mark_closed();
                    }
                    Some(SocketEvent::Closed { code, reason }) => {
                        log::info!("WebSocket disconnected (code: {code:?}, reason: {reason:?})");
                        break;
                    }
                    None => {
                        log::info!("WebSocket stream ended");
                        break;
                    }
                },
                _ = heartbeat.tick() => {
                    if !self.send_frame(&ClientFrame::Ping) {
                        log::debug!("Skipping heartbeat, socket not open");
                    }
                }
            }
        }
    }

    /// Mark the socket open and replay every active subscription
    ///
    /// Returns `false` and drops `outbound` when the client was shut down
    /// while the connect was in flight.
    fn on_open(&self, outbound: mpsc::UnboundedSender<String>) -> bool {
        let mut link = self.link.lock();
        // `shutdown` flips the flag under this lock
        if !self.should_reconnect.load(Ordering::SeqCst) {
            link.state = ConnectionState::Idle;
            return false;
        }
        link.backoff.reset();
        link.state = ConnectionState::Open;

        // Snapshot under the link lock so a concurrent subscribe either lands
        // in the snapshot or sees the socket open and sends its own frame.
        let channels = self.registry.lock().active_channels();
        for channel in channels {
            match (ClientFrame::Subscribe {
                subscription_type: channel,
            })
            .to_json()
            {
                Ok(text) => {
                    let _ = outbound.send(text);
                }
                Err(e) => log::error!("Failed to serialize subscribe for {channel}: {e}"),
            }
        }
        link.outbound = Some(outbound);
        drop(link);

        self.connected_tx.send_replace(true);
        log::info!("WebSocket connected to {}", self.endpoint);
        true
    }

    /// Forget the socket; no-op when already closed
    fn mark_closed(&self) {
        {
            let mut link = self.link.lock();
            link.outbound = None;
            if link.state != ConnectionState::Idle {
                link.state = ConnectionState::Closed;
            }
        }
        self.connected_tx.send_if_modified(|connected| std::mem::replace(connected, false));
    }

    /// Handle one text frame from the server
    fn handle_frame(&self, text: &str) {
        let message = match parse_server_message(text) {
            Ok(message) => message,
            Err(e) => {
                log::error!("Error parsing WebSocket message: {e}");
                return;
            }
        };

        match message {
            ServerMessage::Connected { connection_id } => {
                log::info!("WebSocket connection established: {connection_id:?}");
            }
            ServerMessage::Subscribed { subscription_type } => {
                log::debug!("Subscribed to {subscription_type:?}");
            }
            ServerMessage::Unsubscribed { subscription_type } => {
                log::debug!("Unsubscribed from {subscription_type:?}");
            }
            ServerMessage::Pong => log::trace!("Received pong"),
            ServerMessage::Error { message } => {
                log::error!("WebSocket server error: {}", message.as_deref().unwrap_or("unknown"));
            }
            ServerMessage::Data { channel, data } => {
                let subscribers = self.registry.lock().subscribers(channel);
                fan_out(channel, &subscribers, &data);
            }
            ServerMessage::Unknown { kind } => {
                log::warn!("Unknown message type: {kind}");
            }
        }
    }
}
