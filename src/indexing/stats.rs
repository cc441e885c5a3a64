//! Per-index indexing statistics.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Accessor for the indexing statistics of the storage engine.
///
/// The orchestrator selects the index being updated once per batch and then
/// reports successes and failures against it.
pub trait IndexingStatsAccessor {
    /// Direct subsequent increments at `index`.
    fn set_current_index_stats_to(&mut self, index: &str);

    /// Count one successfully indexed entry.
    fn increment_success_indexing(&mut self);

    /// Count one document the map transform failed on.
    fn increment_indexing_failure(&mut self) {}
}

/// Counters of one index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Entries indexed successfully.
    pub successes: u64,
    /// Documents whose map transform failed.
    pub failures: u64,
}

impl IndexStats {
    /// Total number of attempts.
    pub fn attempts(&self) -> u64 {
        self.successes + self.failures
    }
}

/// [`IndexingStatsAccessor`] keeping counters in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryIndexingStats {
    current: Option<String>,
    stats: HashMap<String, IndexStats>,
}

impl InMemoryIndexingStats {
    /// Create an empty set of counters.
    pub fn new() -> Self {
        InMemoryIndexingStats::default()
    }

    /// Counters of `index`, zero if it was never updated.
    pub fn get(&self, index: &str) -> IndexStats {
        self.stats.get(index).copied().unwrap_or_default()
    }

    fn current_mut(&mut self) -> Option<&mut IndexStats> {
        let index = self.current.as_ref()?;
        Some(self.stats.entry(index.clone()).or_default())
    }
}

impl IndexingStatsAccessor for InMemoryIndexingStats {
    fn set_current_index_stats_to(&mut self, index: &str) {
        self.current = Some(index.to_string());
    }

    fn increment_success_indexing(&mut self) {
        match self.current_mut() {
            Some(stats) => stats.successes += 1,
            None => log::warn!("Indexing success reported with no current index"),
        }
    }

    fn increment_indexing_failure(&mut self) {
        match self.current_mut() {
            Some(stats) => stats.failures += 1,
            None => log::warn!("Indexing failure reported with no current index"),
        }
    }
}
