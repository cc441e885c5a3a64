//! Indexing module.
//!
//! This module turns documents into index entries: the field converter, the
//! fault-isolating enumeration of map results, the observer hooks of the work
//! context, and the transactional [`SimpleIndex`] orchestrator that ties
//! them together.

pub mod context;
pub mod converter;
pub mod robust;
pub mod simple_index;
pub mod stats;

// Re-export commonly used types
pub use context::{
    ErrorSink, IndexUpdateBatcher, IndexUpdateTrigger, IndexingError, WorkContext,
    apply_and_ignore_all_errors,
};
pub use converter::{FieldConverter, normalize_field_name};
pub use robust::RobustEnumerator;
pub use simple_index::{IdentityMap, IndexingOutcome, MapTransform, SimpleIndex};
pub use stats::{InMemoryIndexingStats, IndexStats, IndexingStatsAccessor};
