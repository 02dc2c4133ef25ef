//! In-process read-state store

use parking_lot::Mutex;

use crate::types::ReadStateMap;

use super::ReadStateStore;

/// Keeps the read-state mapping in memory for the life of the process
#[derive(Debug, Default)]
pub struct MemoryReadStateStore {
    state: Mutex<ReadStateMap>,
}

impl MemoryReadStateStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with existing state
    #[must_use]
    pub fn with_state(state: ReadStateMap) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }
}

impl ReadStateStore for MemoryReadStateStore {
    fn get(&self) -> ReadStateMap {
        self.state.lock().clone()
    }

    fn set(&self, state: &ReadStateMap) {
        *self.state.lock() = state.clone();
    }
}
