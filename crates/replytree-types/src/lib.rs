//! Shared domain types for replytree.
//!
//! Bots, reply messages, the three shapes of a reply tree (validated forest,
//! flat arena, nested wire form), configuration, and error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod bot;
pub mod config;
pub mod error;
pub mod message;
pub mod tree;
