//! In-memory index store with optional snapshot persistence.

use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard, RwLock};

use crate::error::{Result, TesseraError};
use crate::index::entry::IndexEntry;
use crate::index::snapshot;
use crate::index::writer::{IndexStore, IndexWriter};
use crate::storage::Storage;

/// An index store keeping committed entries in memory.
///
/// When opened over a [`Storage`], every commit writes a snapshot of the
/// committed entries and opening the store loads it back.
pub struct MemoryIndexStore {
    name: String,
    entries: RwLock<Vec<IndexEntry>>,
    write_lock: Mutex<()>,
    storage: Option<Arc<dyn Storage>>,
}

impl fmt::Debug for MemoryIndexStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryIndexStore")
            .field("name", &self.name)
            .field("entries", &self.entries.read().len())
            .field("persistent", &self.storage.is_some())
            .finish()
    }
}

impl MemoryIndexStore {
    /// Create an empty, non-persistent store.
    pub fn new<S: Into<String>>(name: S) -> Self {
        MemoryIndexStore {
            name: name.into(),
            entries: RwLock::new(Vec::new()),
            write_lock: Mutex::new(()),
            storage: None,
        }
    }

    /// Open a store persisted in `storage`, loading its last snapshot.
    pub fn open<S: Into<String>>(name: S, storage: Arc<dyn Storage>) -> Result<Self> {
        let name = name.into();
        let entries = snapshot::load(storage.as_ref(), &Self::snapshot_name(&name))?
            .unwrap_or_default();
        log::debug!("Opened index store '{}' with {} entries", name, entries.len());

        Ok(MemoryIndexStore {
            name,
            entries: RwLock::new(entries),
            write_lock: Mutex::new(()),
            storage: Some(storage),
        })
    }

    /// Name of the store.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// A copy of every committed entry.
    pub fn entries(&self) -> Vec<IndexEntry> {
        self.entries.read().clone()
    }

    fn snapshot_name(name: &str) -> String {
        format!("{name}.snapshot")
    }
}

impl IndexStore for MemoryIndexStore {
    fn begin_write(&self) -> Result<Box<dyn IndexWriter + '_>> {
        Ok(Box::new(MemoryIndexWriter {
            store: self,
            _guard: self.write_lock.lock(),
            pending: Vec::new(),
            finished: false,
        }))
    }

    fn num_docs(&self) -> usize {
        self.entries.read().len()
    }

    fn documents_with_term(&self, field: &str, term: &str) -> Vec<IndexEntry> {
        self.entries
            .read()
            .iter()
            .filter(|entry| entry.has_term(field, term))
            .cloned()
            .collect()
    }

    fn contains_term(&self, field: &str, term: &str) -> bool {
        self.entries
            .read()
            .iter()
            .any(|entry| entry.has_term(field, term))
    }
}

#[derive(Debug)]
enum PendingOperation {
    Add(IndexEntry),
    Delete { field: String, terms: Vec<String> },
}

/// Write transaction of a [`MemoryIndexStore`].
///
/// Holds the store's write lock for its whole lifetime.
pub struct MemoryIndexWriter<'a> {
    store: &'a MemoryIndexStore,
    _guard: MutexGuard<'a, ()>,
    pending: Vec<PendingOperation>,
    finished: bool,
}

impl fmt::Debug for MemoryIndexWriter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryIndexWriter")
            .field("store", &self.store.name)
            .field("pending", &self.pending.len())
            .field("finished", &self.finished)
            .finish()
    }
}

impl MemoryIndexWriter<'_> {
    fn check_open(&self) -> Result<()> {
        if self.finished {
            Err(TesseraError::index(format!(
                "Write transaction on '{}' has already finished",
                self.store.name
            )))
        } else {
            Ok(())
        }
    }
}

impl IndexWriter for MemoryIndexWriter<'_> {
    fn add_document(&mut self, entry: IndexEntry) -> Result<()> {
        self.check_open()?;
        self.pending.push(PendingOperation::Add(entry));
        Ok(())
    }

    fn delete_documents(&mut self, field: &str, terms: &[String]) -> Result<()> {
        self.check_open()?;
        if !terms.is_empty() {
            self.pending.push(PendingOperation::Delete {
                field: field.to_string(),
                terms: terms.to_vec(),
            });
        }
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.check_open()?;

        let mut entries = self.store.entries.read().clone();
        for operation in self.pending.drain(..) {
            match operation {
                PendingOperation::Add(entry) => entries.push(entry),
                PendingOperation::Delete { field, terms } => {
                    entries.retain(|entry| !terms.iter().any(|term| entry.has_term(&field, term)));
                }
            }
        }

        if let Some(storage) = &self.store.storage {
            snapshot::save(
                storage.as_ref(),
                &MemoryIndexStore::snapshot_name(&self.store.name),
                &entries,
            )?;
        }

        log::debug!(
            "Committed index '{}': {} entries",
            self.store.name,
            entries.len()
        );
        *self.store.entries.write() = entries;
        self.finished = true;
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        self.check_open()?;
        self.pending.clear();
        self.finished = true;
        Ok(())
    }

    fn pending_operations(&self) -> usize {
        self.pending.len()
    }
}

impl Drop for MemoryIndexWriter<'_> {
    fn drop(&mut self) {
        if !self.finished && !self.pending.is_empty() {
            log::debug!(
                "Discarding {} uncommitted operations on '{}'",
                self.pending.len(),
                self.store.name
            );
        }
    }
}
