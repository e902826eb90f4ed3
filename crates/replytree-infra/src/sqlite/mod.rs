//! SQLite storage for bots and their message trees.

pub mod bot;
pub mod pool;
