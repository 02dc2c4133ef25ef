//! Static section tables
//!
//! Four hand-maintained tables tie the inbox together:
//!
//! - navigation id → server section (used when polling and marking read)
//! - server section → navigation id (used when applying pushed counts)
//! - route path → navigation id (used on client-side navigation)
//! - server section → categorization criteria (used by the count source)
//!
//! The first two are kept separate on purpose and only agree by convention.

use super::identifiers::{SectionId, ServerSection};

/// Navigation id → server section, in sidebar order
pub const SECTION_MAPPING: &[(&str, &str)] = &[
    ("human-chats", "my-inbox-chats"),
    ("escalated-chats", "my-inbox-escalated"),
    ("resolved-chats", "my-inbox-resolved"),
    ("active-chats", "agent-inbox-active"),
    ("resolved-agent-chats", "agent-inbox-resolved"),
];

/// Server section → navigation id, for `unread_counts` pushes
pub const PUSH_SECTION_MAPPING: &[(&str, &str)] = &[
    ("my-inbox-chats", "human-chats"),
    ("my-inbox-escalated", "escalated-chats"),
    ("my-inbox-resolved", "resolved-chats"),
    ("agent-inbox-active", "active-chats"),
    ("agent-inbox-resolved", "resolved-agent-chats"),
];

/// Route path → navigation id
pub const PATH_TO_SECTION_ID: &[(&str, &str)] = &[
    ("/inbox/my-inbox/chats", "human-chats"),
    ("/inbox/my-inbox/escalated", "escalated-chats"),
    ("/inbox/my-inbox/resolved", "resolved-chats"),
    ("/inbox/agent-inbox/active-chats", "active-chats"),
    ("/inbox/agent-inbox/resolved-chats", "resolved-agent-chats"),
];

/// Filter applied to a user's chats when counting a section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Categorization {
    /// Required user category, if any
    pub category: Option<&'static str>,
    /// Required user status (case-insensitive), if any
    pub status: Option<&'static str>,
}

impl Categorization {
    const fn new(category: &'static str, status: &'static str) -> Self {
        Self {
            category: Some(category),
            status: Some(status),
        }
    }
}

/// Server section → categorization criteria
pub const CHAT_CATEGORIZATION: &[(&str, Categorization)] = &[
    ("unified-inbox", Categorization { category: None, status: None }),
    ("agent-inbox-active", Categorization::new("agent-inbox", "active")),
    ("agent-inbox-resolved", Categorization::new("agent-inbox", "resolved")),
    ("my-inbox-chats", Categorization::new("human-chats", "active")),
    ("my-inbox-escalated", Categorization::new("human-chats", "escalated")),
    ("my-inbox-resolved", Categorization::new("human-chats", "resolved")),
];

fn lookup<'a, V: Copy>(table: &'a [(&'a str, V)], key: &str) -> Option<V> {
    table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

/// All navigation ids known to the reconciler
pub fn known_sections() -> impl Iterator<Item = SectionId> {
    SECTION_MAPPING.iter().map(|(id, _)| SectionId::from(*id))
}

/// Server section backing a navigation id
#[must_use]
pub fn server_section_for(section_id: &SectionId) -> Option<ServerSection> {
    lookup(SECTION_MAPPING, section_id.as_str()).map(ServerSection::from)
}

/// Navigation id for a pushed server section name
#[must_use]
pub fn section_for_server_name(name: &str) -> Option<SectionId> {
    lookup(PUSH_SECTION_MAPPING, name).map(SectionId::from)
}

/// Navigation id for a route path
#[must_use]
pub fn section_for_path(path: &str) -> Option<SectionId> {
    lookup(PATH_TO_SECTION_ID, path).map(SectionId::from)
}

/// Categorization for a server section; unknown sections are unfiltered
#[must_use]
pub fn categorization_for(section: &ServerSection) -> Categorization {
    lookup(CHAT_CATEGORIZATION, section.as_str()).unwrap_or_default()
}
