//! Persistent read-state storage
//!
//! The reconciler keeps one read cursor per section. Where it lives is up to
//! the embedder: a JSON file under a storage key, an in-memory map, or any
//! other key-value backend implementing [`ReadStateStore`].
//!
//! Both operations are fail-soft. A store that cannot be read behaves as an
//! empty one, and a failed write is logged and dropped.

mod file;
mod memory;

pub use file::FileReadStateStore;
pub use memory::MemoryReadStateStore;

use crate::types::ReadStateMap;

/// Durable mapping from section to its last read state
///
/// Both methods may block. The reconciler calls them from the blocking pool,
/// except for the first [`get`](Self::get) of a push that arrives before any
/// refresh, which runs on the socket dispatch task.
pub trait ReadStateStore: Send + Sync + 'static {
    /// Load the whole mapping; returns an empty mapping on any failure
    fn get(&self) -> ReadStateMap;

    /// Replace the whole mapping; failures are logged, never returned
    fn set(&self, state: &ReadStateMap);
}

impl<S: ReadStateStore> ReadStateStore for std::sync::Arc<S> {
    fn get(&self) -> ReadStateMap {
        (**self).get()
    }

    fn set(&self, state: &ReadStateMap) {
        (**self).set(state);
    }
}
