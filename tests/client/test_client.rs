//! Integration tests for `RealtimeClient`
//!
//! Drives the connection manager through a fake transport: lazy connect,
//! subscription replay, fan-out isolation, reconnect backoff and teardown.

#[path = "../support/mod.rs"]
mod support;

use std::sync::Arc;
use std::time::Duration;

use inbox_realtime::{
    ConnectionState, RealtimeClient, RealtimeError, RealtimeOptions, SocketConnection,
    SocketEvent, SubscriptionCallback, SubscriptionChannel, SubscriptionRegistry, Transport,
};
use parking_lot::Mutex;
use serde_json::{Value, json};
use support::{FakeServer, FakeTransport, eventually, fake_transport, fast_options, init_logging};
use tokio::sync::mpsc;
use url::Url;

fn client_with(options: &RealtimeOptions) -> (RealtimeClient<FakeTransport>, FakeServer) {
    init_logging();
    let (transport, server) = fake_transport();
    (RealtimeClient::with_transport(options, transport), server)
}

fn noop() -> SubscriptionCallback {
    SubscriptionRegistry::callback(|_| Ok(()))
}

fn recorder() -> (SubscriptionCallback, Arc<Mutex<Vec<Value>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let callback = SubscriptionRegistry::callback(move |data| {
        sink.lock().push(data.clone());
        Ok(())
    });
    (callback, seen)
}

fn subscribe_frame(channel: &str) -> Value {
    json!({"action": "subscribe", "subscription_type": channel})
}

fn unsubscribe_frame(channel: &str) -> Value {
    json!({"action": "unsubscribe", "subscription_type": channel})
}

async fn wait_connected(client: &RealtimeClient<FakeTransport>) {
    let mut connected = client.connection_watch();
    tokio::time::timeout(support::WAIT, connected.wait_for(|up| *up))
        .await
        .expect("timed out waiting for connection")
        .expect("client dropped");
}

#[tokio::test]
async fn test_first_subscribe_connects_lazily() {
    let (client, mut server) = client_with(&fast_options());
    assert_eq!(client.connection_state(), ConnectionState::Idle);
    assert!(!client.is_connected());

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(server.attempts(), 0, "no subscription, no socket");

    let _chat = client.subscribe(SubscriptionChannel::ChatUpdates, noop());
    let mut session = server.next_session().await;
    assert_eq!(session.next_frame().await, subscribe_frame("chat_updates"));

    wait_connected(&client).await;
    assert_eq!(client.connection_state(), ConnectionState::Open);

    // Already open: the frame goes out immediately, no second socket
    let _counts = client.subscribe(SubscriptionChannel::UnreadCounts, noop());
    assert_eq!(session.next_frame().await, subscribe_frame("unread_counts"));
    assert_eq!(server.attempts(), 1);
}

#[tokio::test]
async fn test_data_fans_out_to_channel_subscribers() {
    let (client, mut server) = client_with(&fast_options());
    let (first, first_seen) = recorder();
    let (second, second_seen) = recorder();
    let (other, other_seen) = recorder();

    let _a = client.subscribe(SubscriptionChannel::ChatUpdates, first);
    let _b = client.subscribe(SubscriptionChannel::ChatUpdates, second);
    let _c = client.subscribe(SubscriptionChannel::WebsiteStatus, other);

    let session = server.next_session().await;
    wait_connected(&client).await;

    session.push(json!({"type": "chat_updates", "data": {"chat_id": 42}}));
    eventually(|| first_seen.lock().len() == 1 && second_seen.lock().len() == 1).await;

    assert_eq!(first_seen.lock()[0], json!({"chat_id": 42}));
    assert_eq!(second_seen.lock()[0], json!({"chat_id": 42}));
    assert!(other_seen.lock().is_empty());
}

#[tokio::test]
async fn test_failing_callbacks_do_not_stop_dispatch() {
    let (client, mut server) = client_with(&fast_options());
    let (healthy, seen) = recorder();

    let _err = client.subscribe(
        SubscriptionChannel::ChatUpdates,
        SubscriptionRegistry::callback(|_| Err(RealtimeError::subscriber("boom"))),
    );
    let _panic = client.subscribe(
        SubscriptionChannel::ChatUpdates,
        SubscriptionRegistry::callback(|_| panic!("callback exploded")),
    );
    let _ok = client.subscribe(SubscriptionChannel::ChatUpdates, healthy);

    let session = server.next_session().await;
    wait_connected(&client).await;

    session.push(json!({"type": "chat_updates", "data": 1}));
    session.push(json!({"type": "chat_updates", "data": 2}));
    eventually(|| seen.lock().len() == 2).await;

    assert_eq!(*seen.lock(), vec![json!(1), json!(2)]);
    assert!(client.is_connected());
    assert_eq!(server.attempts(), 1);
}

#[tokio::test]
async fn test_only_last_unsubscribe_sends_frame() {
    let (client, mut server) = client_with(&fast_options());
    let first = client.subscribe(SubscriptionChannel::ChatUpdates, noop());
    let second = client.subscribe(SubscriptionChannel::ChatUpdates, noop());
    assert_eq!(client.subscriber_count(SubscriptionChannel::ChatUpdates), 2);

    let mut session = server.next_session().await;
    assert_eq!(session.next_frame().await, subscribe_frame("chat_updates"));
    wait_connected(&client).await;

    first.unsubscribe();
    assert!(client.send("marker", None));
    assert_eq!(session.next_frame().await, json!({"action": "marker"}));

    second.unsubscribe();
    assert_eq!(session.next_frame().await, unsubscribe_frame("chat_updates"));
    assert_eq!(client.subscriber_count(SubscriptionChannel::ChatUpdates), 0);
}

#[tokio::test]
async fn test_unsubscribe_channel_drops_every_callback() {
    let (client, mut server) = client_with(&fast_options());
    let (callback, seen) = recorder();
    let _a = client.subscribe(SubscriptionChannel::WebsiteStatus, callback);
    let _b = client.subscribe(SubscriptionChannel::WebsiteStatus, noop());

    let mut session = server.next_session().await;
    assert_eq!(session.next_frame().await, subscribe_frame("website_status"));
    wait_connected(&client).await;

    client.unsubscribe(SubscriptionChannel::WebsiteStatus);
    assert_eq!(session.next_frame().await, unsubscribe_frame("website_status"));
    assert_eq!(client.subscriber_count(SubscriptionChannel::WebsiteStatus), 0);

    session.push(json!({"type": "website_status", "data": {"online": true}}));
    assert!(client.send("marker", None));
    assert_eq!(session.next_frame().await, json!({"action": "marker"}));
    assert!(seen.lock().is_empty());
}

#[tokio::test]
async fn test_reconnect_replays_only_active_channels() {
    let (client, mut server) = client_with(&fast_options());
    let _chat = client.subscribe(SubscriptionChannel::ChatUpdates, noop());
    let counts = client.subscribe(SubscriptionChannel::UnreadCounts, noop());

    let mut first = server.next_session().await;
    assert_eq!(first.next_frame().await, subscribe_frame("chat_updates"));
    assert_eq!(first.next_frame().await, subscribe_frame("unread_counts"));
    wait_connected(&client).await;

    counts.unsubscribe();
    assert_eq!(first.next_frame().await, unsubscribe_frame("unread_counts"));

    first.close();
    let mut second = server.next_session().await;
    assert_eq!(second.next_frame().await, subscribe_frame("chat_updates"));
    wait_connected(&client).await;

    assert!(client.send("marker", None));
    assert_eq!(second.next_frame().await, json!({"action": "marker"}));
    assert_eq!(server.attempts(), 2);
}

#[tokio::test]
async fn test_gives_up_after_max_attempts() {
    let options = RealtimeOptions::builder()
        .reconnect_base_delay(Duration::from_millis(1))
        .max_reconnect_attempts(5)
        .heartbeat_interval(Duration::from_secs(3600))
        .build();
    let (client, server) = client_with(&options);
    server.fail_next(usize::MAX);

    let _chat = client.subscribe(SubscriptionChannel::ChatUpdates, noop());

    // One initial attempt plus five retries
    eventually(|| server.attempts() == 6 && client.connection_state() == ConnectionState::Idle)
        .await;
    assert_eq!(client.reconnect_attempts(), 5);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(server.attempts(), 6);
    assert!(!client.is_connected());
}

#[tokio::test]
async fn test_successful_open_resets_backoff() {
    let (client, mut server) = client_with(&fast_options());
    server.fail_next(2);

    let _chat = client.subscribe(SubscriptionChannel::ChatUpdates, noop());
    let _session = server.next_session().await;
    wait_connected(&client).await;

    assert_eq!(server.attempts(), 3);
    assert_eq!(client.reconnect_attempts(), 0);
}

#[tokio::test]
async fn test_send_merges_object_payloads() {
    let (client, mut server) = client_with(&fast_options());
    let _chat = client.subscribe(SubscriptionChannel::ChatUpdates, noop());
    let mut session = server.next_session().await;
    session.next_frame().await;
    wait_connected(&client).await;

    assert!(client.send("mark_read", Some(json!({"chat_id": 7}))));
    assert_eq!(
        session.next_frame().await,
        json!({"action": "mark_read", "chat_id": 7})
    );

    assert!(client.send("echo", Some(json!(5))));
    assert_eq!(session.next_frame().await, json!({"action": "echo", "data": 5}));
}

#[tokio::test]
async fn test_send_while_disconnected_is_dropped() {
    let (client, server) = client_with(&fast_options());

    assert!(!client.send("ping", None));

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(server.attempts(), 0, "send never opens a socket");
}

#[tokio::test]
async fn test_shutdown_closes_socket_and_stops_reconnecting() {
    let (client, mut server) = client_with(&fast_options());
    let _chat = client.subscribe(SubscriptionChannel::ChatUpdates, noop());
    let mut session = server.next_session().await;
    wait_connected(&client).await;

    client.shutdown();
    session.wait_closed().await;
    assert!(!client.is_connected());
    assert_eq!(client.connection_state(), ConnectionState::Idle);

    let _late = client.subscribe(SubscriptionChannel::UnreadCounts, noop());
    client.connect();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(server.attempts(), 1);
}

type StalledSocket = (mpsc::UnboundedReceiver<String>, mpsc::UnboundedSender<SocketEvent>);

/// Transport whose connect holds its worker thread until the test releases it
struct StalledTransport {
    started: mpsc::UnboundedSender<()>,
    release: Mutex<std::sync::mpsc::Receiver<()>>,
    sockets: mpsc::UnboundedSender<StalledSocket>,
}

impl Transport for StalledTransport {
    async fn connect(&self, _endpoint: &Url) -> inbox_realtime::Result<SocketConnection> {
        let _ = self.started.send(());
        // No await until the connect returns, so an abort cannot land here
        let _ = self.release.lock().recv();

        let (outbound, frames) = mpsc::unbounded_channel();
        let (events, inbound) = mpsc::unbounded_channel();
        let _ = self.sockets.send((frames, events));
        Ok(SocketConnection { outbound, inbound })
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_shutdown_while_connecting_drops_the_socket() {
    init_logging();
    let (started_tx, mut started) = mpsc::unbounded_channel();
    let (release_tx, release_rx) = std::sync::mpsc::channel();
    let (sockets_tx, mut sockets) = mpsc::unbounded_channel();
    let client = RealtimeClient::with_transport(
        &fast_options(),
        StalledTransport {
            started: started_tx,
            release: Mutex::new(release_rx),
            sockets: sockets_tx,
        },
    );
    let _chat = client.subscribe(SubscriptionChannel::ChatUpdates, noop());

    tokio::time::timeout(support::WAIT, started.recv())
        .await
        .expect("connect never started")
        .expect("transport dropped");
    client.shutdown();
    release_tx.send(()).unwrap();

    let (mut frames, _events) = tokio::time::timeout(support::WAIT, sockets.recv())
        .await
        .expect("connect never finished")
        .expect("transport dropped");
    let first = tokio::time::timeout(support::WAIT, frames.recv())
        .await
        .expect("client kept the socket open");
    assert_eq!(first, None, "no frames go out on a shut-down client");

    assert!(!client.is_connected());
    assert_eq!(client.connection_state(), ConnectionState::Idle);
    assert!(!client.send("ping", None));

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(started.try_recv().is_err(), "no reconnect after shutdown");
}

#[tokio::test]
async fn test_heartbeat_pings_while_open() {
    let options = RealtimeOptions::builder()
        .reconnect_base_delay(Duration::from_millis(10))
        .heartbeat_interval(Duration::from_millis(20))
        .build();
    let (client, mut server) = client_with(&options);
    let _chat = client.subscribe(SubscriptionChannel::ChatUpdates, noop());

    let mut session = server.next_session().await;
    assert_eq!(session.next_frame().await, subscribe_frame("chat_updates"));
    assert_eq!(session.next_frame().await, json!({"action": "ping"}));
    assert_eq!(session.next_frame().await, json!({"action": "ping"}));
}

#[tokio::test]
async fn test_bad_frames_keep_the_connection() {
    let (client, mut server) = client_with(&fast_options());
    let (callback, seen) = recorder();
    let _chat = client.subscribe(SubscriptionChannel::ChatUpdates, callback);

    let session = server.next_session().await;
    wait_connected(&client).await;

    session.push_raw("not json at all");
    session.push(json!({"no_type": true}));
    session.push(json!({"type": "mystery"}));
    session.push(json!({"type": "error", "message": "rate limited"}));
    session.push(json!({"type": "connected", "connection_id": "abc"}));
    session.push(json!({"type": "pong"}));
    session.push(json!({"type": "chat_updates", "data": "still here"}));

    eventually(|| seen.lock().len() == 1).await;
    assert_eq!(seen.lock()[0], json!("still here"));
    assert!(client.is_connected());
    assert_eq!(server.attempts(), 1);
}

#[tokio::test]
async fn test_connection_watch_follows_socket() {
    let (client, mut server) = client_with(&fast_options());
    let mut connected = client.connection_watch();
    assert!(!*connected.borrow());

    let _chat = client.subscribe(SubscriptionChannel::ChatUpdates, noop());
    let first = server.next_session().await;
    wait_connected(&client).await;

    first.close();
    tokio::time::timeout(support::WAIT, connected.wait_for(|up| !*up))
        .await
        .expect("timed out waiting for disconnect")
        .expect("client dropped");

    let _second = server.next_session().await;
    wait_connected(&client).await;
}
