//! Read cursors and derived unread counts

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::identifiers::SectionId;

/// Last observed state of a section when the user visited it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionReadState {
    /// Chat count at the time of the visit
    pub last_seen_count: u64,
    /// When the section was visited
    pub last_visited: DateTime<Utc>,
}

impl SectionReadState {
    /// Read state for a visit happening now
    #[must_use]
    pub fn seen_now(count: u64) -> Self {
        Self {
            last_seen_count: count,
            last_visited: Utc::now(),
        }
    }

    /// Unread count for this section given its current total
    #[must_use]
    pub const fn unread(&self, current: u64) -> u64 {
        current.saturating_sub(self.last_seen_count)
    }
}

/// Persisted read state, keyed by section
pub type ReadStateMap = BTreeMap<SectionId, SectionReadState>;

/// Derived unread counts, keyed by section
pub type UnreadCountMap = HashMap<SectionId, u64>;

/// Unread count for a section; a never-visited section is entirely unread
#[must_use]
pub fn unread_count(current: u64, state: Option<&SectionReadState>) -> u64 {
    state.map_or(current, |s| s.unread(current))
}
