//! Index module.
//!
//! This module provides index entries, the transactional writer and store
//! traits, and the in-memory store with snapshot persistence.

pub mod entry;
pub mod snapshot;
pub mod store;
pub mod writer;

// Re-export commonly used types
pub use entry::IndexEntry;
pub use store::{MemoryIndexStore, MemoryIndexWriter};
pub use writer::{IndexStore, IndexWriter};
