//! Type definitions for the inbox real-time layer
//!
//! This module contains the type definitions used throughout the crate,
//! organized into logical submodules:
//!
//! - [`identifiers`] - Type-safe id wrappers (`SectionId`, `ServerSection`, `SubscriberId`)
//! - [`messages`] - Socket frames and subscription channels
//! - [`options`] - Main configuration options
//! - [`sections`] - Static section lookup tables
//! - [`read_state`] - Persisted per-section read cursors

pub mod identifiers;
pub mod messages;
pub mod options;
pub mod read_state;
pub mod sections;

// Re-export commonly used types
pub use identifiers::{SectionId, ServerSection, SubscriberId};
pub use messages::{ClientFrame, ServerMessage, SubscriptionChannel};
pub use options::{RealtimeOptions, RealtimeOptionsBuilder};
pub use read_state::{ReadStateMap, SectionReadState, UnreadCountMap};
