//! Chat count sources
//!
//! A count source answers "how many chats are in this section right now".
//! The production source derives the answer from the REST users/chats
//! snapshot; tests and embedders can plug in anything implementing
//! [`CountSource`].

pub mod categorize;
mod http;

pub use categorize::{UserChats, UsersChatsSnapshot};
pub use http::HttpCountSource;

use std::sync::Arc;

use crate::types::ServerSection;

/// Source of current per-section chat counts
///
/// Implementations never fail: anything that goes wrong is reported as 0.
pub trait CountSource: Send + Sync + 'static {
    /// Current number of chats in a server section
    fn fetch_section_count(
        &self,
        section: &ServerSection,
    ) -> impl std::future::Future<Output = u64> + Send;
}

impl<C: CountSource> CountSource for Arc<C> {
    fn fetch_section_count(
        &self,
        section: &ServerSection,
    ) -> impl std::future::Future<Output = u64> + Send {
        (**self).fetch_section_count(section)
    }
}
