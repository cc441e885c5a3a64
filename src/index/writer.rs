//! Index writer and store traits.
//!
//! An [`IndexStore`] owns the committed entries of one index and hands out
//! transactional [`IndexWriter`]s. Changes made through a writer are only
//! visible after [`IndexWriter::commit`]; dropping a writer without
//! committing discards them.

use crate::error::Result;
use crate::index::entry::IndexEntry;

/// A write transaction against an index.
pub trait IndexWriter: std::fmt::Debug {
    /// Add an entry.
    fn add_document(&mut self, entry: IndexEntry) -> Result<()>;

    /// Delete every entry holding one of `terms` in the text field `field`.
    fn delete_documents(&mut self, field: &str, terms: &[String]) -> Result<()>;

    /// Make all pending changes visible and end the transaction.
    fn commit(&mut self) -> Result<()>;

    /// Discard all pending changes and end the transaction.
    fn rollback(&mut self) -> Result<()>;

    /// Number of adds and deletes since the transaction began.
    fn pending_operations(&self) -> usize;
}

/// The committed state of an index.
pub trait IndexStore: Send + Sync + std::fmt::Debug {
    /// Begin a write transaction. Concurrent writers wait for each other.
    fn begin_write(&self) -> Result<Box<dyn IndexWriter + '_>>;

    /// Number of committed entries.
    fn num_docs(&self) -> usize;

    /// Committed entries holding `term` in the text field `field`.
    fn documents_with_term(&self, field: &str, term: &str) -> Vec<IndexEntry>;

    /// Whether any committed entry holds `term` in the text field `field`.
    fn contains_term(&self, field: &str, term: &str) -> bool;
}
