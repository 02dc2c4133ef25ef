//! Users/chats snapshot and per-section counting

use serde::Deserialize;

use crate::types::sections::Categorization;

/// Body of `GET /api/debug/users-chats`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UsersChatsSnapshot {
    /// Every customer with their chats
    #[serde(default)]
    pub users: Vec<UserChats>,
}

/// One customer entry of the snapshot
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserChats {
    /// Inbox category (`human-chats`, `agent-inbox`)
    #[serde(default)]
    pub category: Option<String>,
    /// Conversation status (`active`, `escalated`, `resolved`)
    #[serde(default)]
    pub status: Option<String>,
    /// The user's chats; only their number matters here
    #[serde(default)]
    pub chats: Vec<serde_json::Value>,
}

impl UserChats {
    /// Whether this user's chats belong to a section
    #[must_use]
    pub fn matches(&self, criteria: &Categorization) -> bool {
        let category_match = criteria
            .category
            .is_none_or(|wanted| self.category.as_deref() == Some(wanted));

        let status_match = match (criteria.status, self.status.as_deref()) {
            (Some(wanted), Some(actual)) => actual.eq_ignore_ascii_case(wanted),
            (Some(_), None) => false,
            (None, _) => true,
        };

        category_match && status_match
    }
}

impl UsersChatsSnapshot {
    /// Number of chats that fall into a section
    #[must_use]
    pub fn count(&self, criteria: &Categorization) -> u64 {
        self.users
            .iter()
            .filter(|user| !user.chats.is_empty() && user.matches(criteria))
            .map(|user| user.chats.len() as u64)
            .sum()
    }
}
