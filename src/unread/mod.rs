//! Unread-count reconciliation
//!
//! Unread counts come from two places that must agree:
//! - the poll path, which asks a [`CountSource`](crate::counts::CountSource)
//!   for every known section
//! - the push path, where the notification service sends fresh totals on
//!   the `unread_counts` channel
//!
//! Both feed the same formula against the persisted read cursors and replace
//! the published map; the last write wins.

mod reconciler;
mod scheduler;

pub use reconciler::{UnreadReconciler, UnreadSnapshot};
pub use scheduler::RefreshScheduler;
