//! Business logic and repository trait definitions for replytree.
//!
//! This crate defines the "ports" (repository and renderer traits) that the
//! infrastructure layer implements, plus the tree codec and bot use cases. It
//! depends only on `replytree-types` -- never on `replytree-infra` or any
//! database/IO crate.

pub mod export;
pub mod repository;
pub mod service;
pub mod tree;
