//! Infrastructure layer for replytree.
//!
//! Contains implementations of the ports defined in `replytree-core`:
//! SQLite storage for bots and message trees, the configuration loader,
//! and the HTML mind-map renderer.

pub mod config;
pub mod export;
pub mod sqlite;
