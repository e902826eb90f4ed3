//! Reply-tree handling independent of storage.

pub mod codec;
