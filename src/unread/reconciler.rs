//! Unread-count reconciler

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::future::join_all;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::watch;

use crate::client::{RealtimeClient, Subscription};
use crate::counts::CountSource;
use crate::registry::SubscriptionRegistry;
use crate::store::ReadStateStore;
use crate::transport::Transport;
use crate::types::read_state::unread_count;
use crate::types::sections::{
    known_sections, section_for_path, section_for_server_name, server_section_for,
};
use crate::types::{
    ReadStateMap, SectionId, SectionReadState, SubscriptionChannel, UnreadCountMap,
};

/// Published reconciler state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnreadSnapshot {
    /// Unread count per section
    pub counts: UnreadCountMap,
    /// True until the first poll or push completes
    pub loading: bool,
}

impl Default for UnreadSnapshot {
    fn default() -> Self {
        Self {
            counts: UnreadCountMap::new(),
            loading: true,
        }
    }
}

/// Keeps per-section unread counts in sync with the backend
///
/// Cheap to clone; clones share state.
pub struct UnreadReconciler<S, C> {
    inner: Arc<ReconcilerInner<S, C>>,
}

impl<S, C> Clone for UnreadReconciler<S, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct ReconcilerInner<S, C> {
    store: S,
    source: C,
    state: watch::Sender<UnreadSnapshot>,
    alive: AtomicBool,
    attachment: Mutex<Option<Subscription>>,
    /// Last read state loaded from or written to `store`
    read_state: Mutex<Option<ReadStateMap>>,
    /// Serializes store writes
    persist: Mutex<()>,
}

impl<S: ReadStateStore, C> ReconcilerInner<S, C> {
    /// Cached read state, loading it on first use
    fn cached_read_state(&self) -> ReadStateMap {
        let mut cached = self.read_state.lock();
        cached.get_or_insert_with(|| self.store.get()).clone()
    }

    /// Record a new cursor and write the whole mapping through to the store
    fn persist_cursor(&self, id: SectionId, cursor: SectionReadState) {
        let _writing = self.persist.lock();
        let snapshot = {
            let mut cached = self.read_state.lock();
            let state = cached.get_or_insert_with(|| self.store.get());
            state.insert(id, cursor);
            state.clone()
        };
        self.store.set(&snapshot);
    }
}

impl<S: ReadStateStore, C: CountSource> UnreadReconciler<S, C> {
    /// Create a reconciler over a read-state store and a count source
    ///
    /// Nothing is fetched until [`refresh_counts`](Self::refresh_counts) or a
    /// push arrives; until then [`is_loading`](Self::is_loading) is true.
    pub fn new(store: S, source: C) -> Self {
        let (state, _) = watch::channel(UnreadSnapshot::default());
        Self {
            inner: Arc::new(ReconcilerInner {
                store,
                source,
                state,
                alive: AtomicBool::new(true),
                attachment: Mutex::new(None),
                read_state: Mutex::new(None),
                persist: Mutex::new(()),
            }),
        }
    }

    /// Unread count of one section; 0 when unknown or not yet computed
    #[must_use]
    pub fn get_unread_count(&self, section_id: &SectionId) -> u64 {
        self.inner
            .state
            .borrow()
            .counts
            .get(section_id)
            .copied()
            .unwrap_or(0)
    }

    /// Current unread map
    #[must_use]
    pub fn unread_counts(&self) -> UnreadCountMap {
        self.inner.state.borrow().counts.clone()
    }

    /// Whether no computation has completed yet
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().loading
    }

    /// Watch every published change
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<UnreadSnapshot> {
        self.inner.state.subscribe()
    }

    /// Poll every known section and publish the recomputed map
    ///
    /// Fetches run concurrently; a failed fetch counts as 0 for that section
    /// only. The store is read once, after all fetches complete, on the
    /// blocking pool.
    pub async fn refresh_counts(&self) {
        let sections: Vec<_> = known_sections()
            .filter_map(|id| server_section_for(&id).map(|server| (id, server)))
            .collect();

        let totals = join_all(
            sections
                .iter()
                .map(|(_, server)| self.inner.source.fetch_section_count(server)),
        )
        .await;

        let read_state = self.load_read_state().await;
        let counts: UnreadCountMap = sections
            .into_iter()
            .zip(totals)
            .map(|((id, _), current)| {
                let unread = unread_count(current, read_state.get(&id));
                (id, unread)
            })
            .collect();

        log::debug!("Refreshed unread counts: {counts:?}");
        self.publish(counts);
    }

    /// Apply an `unread_counts` push payload
    ///
    /// Accepts `{counts: {serverSection: n}, timestamp}` or a bare mapping.
    /// Unknown server sections and non-integer values are skipped. Runs on the
    /// socket dispatch task, so it reads the cached read state and only
    /// touches the store when nothing has been loaded yet.
    pub fn apply_push(&self, data: &Value) {
        let totals = data.get("counts").unwrap_or(data);
        let Some(totals) = totals.as_object() else {
            log::warn!("Ignoring unread_counts payload without a counts mapping: {data}");
            return;
        };

        let read_state = self.inner.cached_read_state();
        let mut counts = UnreadCountMap::new();
        for (server_name, value) in totals {
            let Some(id) = section_for_server_name(server_name) else {
                log::debug!("Ignoring unread count for unknown section {server_name}");
                continue;
            };
            let Some(current) = value.as_u64() else {
                log::debug!("Ignoring non-integer unread count for {server_name}: {value}");
                continue;
            };
            let unread = unread_count(current, read_state.get(&id));
            counts.insert(id, unread);
        }

        log::debug!("Applied pushed unread counts: {counts:?}");
        self.publish(counts);
    }

    /// Mark a section read
    ///
    /// The section's unread count drops to 0 before this returns; the returned
    /// future then fetches the current total and stores it as the new read
    /// cursor. Unknown section ids are ignored.
    pub fn mark_section_as_read(
        &self,
        section_id: &SectionId,
    ) -> impl Future<Output = ()> + Send + use<S, C> {
        let inner = Arc::clone(&self.inner);
        let target = server_section_for(section_id).map(|server| (section_id.clone(), server));

        match &target {
            Some((id, _)) if inner.alive.load(Ordering::SeqCst) => {
                inner.state.send_modify(|snapshot| {
                    snapshot.counts.insert(id.clone(), 0);
                });
            }
            Some(_) => {}
            None => log::debug!("No server section for {section_id}; nothing to mark"),
        }

        async move {
            let Some((id, server)) = target else {
                return;
            };
            let count = inner.source.fetch_section_count(&server).await;
            let cursor = SectionReadState::seen_now(count);
            let writer = Arc::clone(&inner);
            let written =
                tokio::task::spawn_blocking(move || writer.persist_cursor(id, cursor)).await;
            if let Err(e) = written {
                log::error!("Read-state write task failed: {e}");
            }
        }
    }

    /// Handle navigation to `path`
    ///
    /// Returns whether the path belongs to a section, which is then marked read.
    pub async fn on_route_change(&self, path: &str) -> bool {
        match section_for_path(path) {
            Some(section_id) => {
                self.mark_section_as_read(&section_id).await;
                true
            }
            None => false,
        }
    }

    /// Receive `unread_counts` pushes from `client`
    ///
    /// Subscribes once; the client replays the subscription on every
    /// reconnect. Attaching again replaces the previous attachment.
    pub fn attach<T: Transport>(&self, client: &RealtimeClient<T>) {
        let reconciler = self.clone();
        let subscription = client.subscribe(
            SubscriptionChannel::UnreadCounts,
            SubscriptionRegistry::callback(move |data| {
                reconciler.apply_push(data);
                Ok(())
            }),
        );

        let previous = self.inner.attachment.lock().replace(subscription);
        if let Some(previous) = previous {
            previous.unsubscribe();
        }
    }

    /// Stop publishing and detach from the client
    ///
    /// Fetches still in flight finish but their results are discarded.
    pub fn shutdown(&self) {
        self.inner.alive.store(false, Ordering::SeqCst);
        let attachment = self.inner.attachment.lock().take();
        if let Some(subscription) = attachment {
            subscription.unsubscribe();
        }
    }

    /// Whether [`shutdown`](Self::shutdown) has not been called
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.inner.alive.load(Ordering::SeqCst)
    }

    /// Reload the read state from the store off the async worker
    async fn load_read_state(&self) -> ReadStateMap {
        let inner = Arc::clone(&self.inner);
        let loaded = tokio::task::spawn_blocking(move || {
            let _writing = inner.persist.lock();
            let state = inner.store.get();
            *inner.read_state.lock() = Some(state.clone());
            state
        })
        .await;
        loaded.unwrap_or_else(|e| {
            log::error!("Read-state load task failed: {e}");
            self.inner.cached_read_state()
        })
    }

    fn publish(&self, counts: UnreadCountMap) {
        if !self.is_alive() {
            log::debug!("Reconciler shut down; discarding unread counts");
            return;
        }
        self.inner.state.send_replace(UnreadSnapshot {
            counts,
            loading: false,
        });
    }
}
