//! Per-index field configuration.
//!
//! An [`IndexDefinition`] tells the field converter how each field name is
//! indexed, stored, and sorted. Fields without explicit configuration fall
//! back to the caller's defaults.
//!
//! Definitions are plain serde types and are usually loaded from JSON:
//!
//! ```json
//! {
//!   "indexes": { "Name": "NotAnalyzed" },
//!   "stores": { "Name": "Yes" },
//!   "sort_options": { "Age": "Long" }
//! }
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::document::field::{FieldIndex, FieldStore};
use crate::error::{Result, TesseraError};

/// Configured indexing mode of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldIndexing {
    /// Do not index the field.
    No,
    /// Index through the analyzer.
    Analyzed,
    /// Index the whole value as one term.
    NotAnalyzed,
}

impl From<FieldIndexing> for FieldIndex {
    fn from(indexing: FieldIndexing) -> Self {
        match indexing {
            FieldIndexing::No => FieldIndex::No,
            FieldIndexing::Analyzed => FieldIndex::Analyzed,
            FieldIndexing::NotAnalyzed => FieldIndex::NotAnalyzed,
        }
    }
}

/// Configured storage mode of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldStorage {
    /// Store the original value.
    Yes,
    /// Index only.
    No,
}

impl From<FieldStorage> for FieldStore {
    fn from(storage: FieldStorage) -> Self {
        match storage {
            FieldStorage::Yes => FieldStore::Yes,
            FieldStorage::No => FieldStore::No,
        }
    }
}

/// Declared sort type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOptions {
    /// No explicit sort type.
    #[default]
    None,
    /// Sort as string.
    String,
    /// Sort as 16-bit integer.
    Short,
    /// Sort as 32-bit integer.
    Int,
    /// Sort as 64-bit integer.
    Long,
    /// Sort as single precision float.
    Float,
    /// Sort as double precision float.
    Double,
}

/// Field configuration of one index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexDefinition {
    /// Indexing mode per field name.
    #[serde(default)]
    pub indexes: HashMap<String, FieldIndexing>,

    /// Storage mode per field name.
    #[serde(default)]
    pub stores: HashMap<String, FieldStorage>,

    /// Sort type per field name.
    #[serde(default)]
    pub sort_options: HashMap<String, SortOptions>,
}

impl IndexDefinition {
    /// Create an empty definition: every field uses the defaults.
    pub fn new() -> Self {
        IndexDefinition::default()
    }

    /// Load a definition from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            TesseraError::schema(format!(
                "Failed to read index definition {}: {e}",
                path.display()
            ))
        })?;
        Self::from_json(&content)
    }

    /// Parse a definition from JSON text.
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| TesseraError::schema(format!("Invalid index definition: {e}")))
    }

    /// Set the indexing mode of a field.
    pub fn with_index<S: Into<String>>(mut self, field: S, indexing: FieldIndexing) -> Self {
        self.indexes.insert(field.into(), indexing);
        self
    }

    /// Set the storage mode of a field.
    pub fn with_store<S: Into<String>>(mut self, field: S, storage: FieldStorage) -> Self {
        self.stores.insert(field.into(), storage);
        self
    }

    /// Set the sort type of a field.
    pub fn with_sort<S: Into<String>>(mut self, field: S, sort: SortOptions) -> Self {
        self.sort_options.insert(field.into(), sort);
        self
    }

    /// Indexing mode of a field, or `default` when it is not configured.
    pub fn get_index(&self, field: &str, default: Option<FieldIndex>) -> Option<FieldIndex> {
        self.indexes
            .get(field)
            .map(|&indexing| indexing.into())
            .or(default)
    }

    /// Storage mode of a field, or `default` when it is not configured.
    pub fn get_storage(&self, field: &str, default: FieldStore) -> FieldStore {
        self.stores
            .get(field)
            .map(|&storage| storage.into())
            .unwrap_or(default)
    }

    /// Sort type of a field.
    pub fn get_sort_option(&self, field: &str) -> SortOptions {
        self.sort_options.get(field).copied().unwrap_or_default()
    }

    /// Check if a field is explicitly configured as not analyzed.
    pub fn is_not_analyzed(&self, field: &str) -> bool {
        matches!(self.indexes.get(field), Some(FieldIndexing::NotAnalyzed))
    }
}
