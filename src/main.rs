// Inbox realtime daemon
//
// Runs the dashboard's real-time layer headless: subscribes to unread-count
// pushes, polls the REST snapshot on a cadence, and treats each line on stdin
// as a route the user navigated to. Unread counts are logged on every change.

use std::collections::BTreeMap;

use anyhow::Result;
use inbox_realtime::{
    FileReadStateStore, HttpCountSource, RealtimeClient, RealtimeOptions, RefreshScheduler,
    UnreadReconciler, UnreadSnapshot,
};
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let options = RealtimeOptions::from_env();
    log::info!(
        "inbox-realtime {} (socket: {}, api: {})",
        inbox_realtime::VERSION,
        options.ws_endpoint,
        options.api_base_url
    );

    let state_dir = match &options.read_state_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()?,
    };

    let client = RealtimeClient::new(&options);
    let reconciler = UnreadReconciler::new(
        FileReadStateStore::new(state_dir),
        HttpCountSource::new(&options)?,
    );

    reconciler.attach(&client);
    reconciler.refresh_counts().await;

    let mut scheduler = RefreshScheduler::new(options.refresh_interval);
    scheduler.start(reconciler.clone());

    let mut changes = reconciler.watch();
    let reporter = tokio::spawn(async move {
        while changes.changed().await.is_ok() {
            let snapshot = changes.borrow_and_update().clone();
            log_counts(&snapshot);
        }
    });

    let mut connected = client.connection_watch();
    let connection_logger = tokio::spawn(async move {
        while connected.changed().await.is_ok() {
            let is_connected = *connected.borrow_and_update();
            log::info!("Realtime connection {}", if is_connected { "up" } else { "down" });
        }
    });

    let mut routes = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = routes.next_line() => match line {
                Ok(Some(path)) => {
                    let path = path.trim();
                    if path.is_empty() {
                        continue;
                    }
                    if !reconciler.on_route_change(path).await {
                        log::debug!("No inbox section for {path}");
                    }
                }
                Ok(None) => {
                    log::info!("stdin closed, shutting down");
                    break;
                }
                Err(e) => {
                    log::error!("Failed to read route: {e}");
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                log::info!("Interrupted, shutting down");
                break;
            }
        }
    }

    scheduler.stop();
    reconciler.shutdown();
    client.shutdown();
    reporter.abort();
    connection_logger.abort();
    Ok(())
}

fn log_counts(snapshot: &UnreadSnapshot) {
    if snapshot.loading {
        return;
    }
    let ordered: BTreeMap<_, _> = snapshot.counts.iter().collect();
    let summary = ordered
        .iter()
        .map(|(section, count)| format!("{section}={count}"))
        .collect::<Vec<_>>()
        .join(" ");
    log::info!("Unread: {summary}");
}
