//! Work context shared by indexing operations.
//!
//! The [`WorkContext`] holds the registered index update triggers and the
//! error log that isolated failures are reported to. Triggers hand out one
//! [`IndexUpdateBatcher`] per batch; batchers observe entries being created
//! and deleted and are disposed when the batch ends.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::index::IndexEntry;

/// Number of recent errors kept by a [`WorkContext`].
pub const MAX_RECORDED_ERRORS: usize = 50;

/// An isolated failure recorded during indexing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexingError {
    /// Name of the index being updated.
    pub index: String,
    /// Id of the document involved, when known.
    pub document: Option<String>,
    /// Error message.
    pub error: String,
    /// When the error was recorded.
    pub timestamp: DateTime<Utc>,
}

/// Sink for failures that must not abort the operation that hit them.
pub trait ErrorSink {
    /// Record a failure for an index and, when known, a document.
    fn add_error(&self, index: &str, document: Option<&str>, message: &str);
}

/// Observer of index entry lifecycle events within one batch.
///
/// Every hook defaults to doing nothing.
pub trait IndexUpdateBatcher {
    /// Called after an entry has been assembled, before it is added.
    fn on_entry_created(
        &mut self,
        _index: &str,
        _entry_key: &str,
        _entry: &IndexEntry,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called before the entries of a document are deleted.
    fn on_entry_deleted(&mut self, _index: &str, _entry_key: &str) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called once after the batch has processed every document.
    fn dispose(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Factory of per-batch observers.
pub trait IndexUpdateTrigger: Send + Sync {
    /// Create a batcher for a batch against `index`, or `None` to sit it out.
    fn create_batcher(&self, index: &str) -> Option<Box<dyn IndexUpdateBatcher>>;
}

/// Registered triggers and the error log of the indexing process.
#[derive(Default)]
pub struct WorkContext {
    triggers: Vec<Arc<dyn IndexUpdateTrigger>>,
    errors: Mutex<VecDeque<IndexingError>>,
}

impl fmt::Debug for WorkContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkContext")
            .field("triggers", &self.triggers.len())
            .field("errors", &self.errors.lock().len())
            .finish()
    }
}

impl WorkContext {
    /// Create a context with no triggers.
    pub fn new() -> Self {
        WorkContext::default()
    }

    /// Register a trigger.
    pub fn with_trigger(mut self, trigger: Arc<dyn IndexUpdateTrigger>) -> Self {
        self.triggers.push(trigger);
        self
    }

    /// Create the batchers of every trigger that takes part in a batch.
    pub fn create_batchers(&self, index: &str) -> Vec<Box<dyn IndexUpdateBatcher>> {
        self.triggers
            .iter()
            .filter_map(|trigger| trigger.create_batcher(index))
            .collect()
    }

    /// Recorded errors, oldest first.
    pub fn errors(&self) -> Vec<IndexingError> {
        self.errors.lock().iter().cloned().collect()
    }

    /// Recorded errors for one index, oldest first.
    pub fn errors_for(&self, index: &str) -> Vec<IndexingError> {
        self.errors
            .lock()
            .iter()
            .filter(|e| e.index == index)
            .cloned()
            .collect()
    }

    /// Forget all recorded errors.
    pub fn clear_errors(&self) {
        self.errors.lock().clear();
    }
}

impl ErrorSink for WorkContext {
    fn add_error(&self, index: &str, document: Option<&str>, message: &str) {
        let mut errors = self.errors.lock();
        errors.push_back(IndexingError {
            index: index.to_string(),
            document: document.map(str::to_string),
            error: message.to_string(),
            timestamp: Utc::now(),
        });
        while errors.len() > MAX_RECORDED_ERRORS {
            errors.pop_front();
        }
    }
}

/// Run `action` on every batcher, handing failures to `on_error` instead of
/// stopping.
pub fn apply_and_ignore_all_errors<A, E>(
    batchers: &mut [Box<dyn IndexUpdateBatcher>],
    mut on_error: E,
    mut action: A,
) where
    A: FnMut(&mut dyn IndexUpdateBatcher) -> anyhow::Result<()>,
    E: FnMut(&anyhow::Error),
{
    for batcher in batchers.iter_mut() {
        if let Err(err) = action(batcher.as_mut()) {
            on_error(&err);
        }
    }
}
