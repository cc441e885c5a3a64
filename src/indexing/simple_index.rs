//! Transactional maintenance of a map-only index.
//!
//! A [`SimpleIndex`] runs batches of raw documents through a map transform
//! and the field converter and writes the resulting entries to its
//! [`IndexStore`]. Each batch is one write transaction:
//!
//! - the entries a document id produced earlier are deleted before its new
//!   entry is added, so re-indexing a document replaces it; ids compare
//!   case-insensitively, deletion hooks fire on the first occurrence of an id
//!   in a batch and only its last occurrence is mapped and added;
//! - map failures are isolated per document and recorded in the
//!   [`WorkContext`];
//! - batcher hooks are isolated per hook;
//! - the transaction commits only when something was deleted or added.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::document::{DOCUMENT_ID_FIELD, Document, MappedDocument};
use crate::document::field::{Field, FieldIndex, FieldStore};
use crate::error::Result;
use crate::index::{IndexEntry, IndexStore, IndexWriter};
use crate::indexing::context::{
    ErrorSink, IndexUpdateBatcher, WorkContext, apply_and_ignore_all_errors,
};
use crate::indexing::converter::FieldConverter;
use crate::indexing::robust::RobustEnumerator;
use crate::indexing::stats::IndexingStatsAccessor;
use crate::schema::IndexDefinition;

/// A map transform: turns a raw document into at most one mapped document.
pub trait MapTransform {
    /// Map one document. `Ok(None)` drops it from the batch.
    fn map(&self, document: &Document) -> anyhow::Result<Option<MappedDocument>>;
}

impl<F> MapTransform for F
where
    F: Fn(&Document) -> anyhow::Result<Option<MappedDocument>>,
{
    fn map(&self, document: &Document) -> anyhow::Result<Option<MappedDocument>> {
        self(document)
    }
}

/// Map transform indexing the document body as is, keyed by the document id.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityMap;

impl MapTransform for IdentityMap {
    fn map(&self, document: &Document) -> anyhow::Result<Option<MappedDocument>> {
        let mut data = document.data.clone();
        data.insert(
            DOCUMENT_ID_FIELD.to_string(),
            Value::String(document.id.clone()),
        );
        Ok(Some(MappedDocument::Structured(data)))
    }
}

/// Result of one [`SimpleIndex::index_documents`] batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexingOutcome {
    /// Mapped documents that reached field extraction.
    pub processed: usize,
    /// Entries added to the index.
    pub indexed: usize,
    /// Documents the map transform failed on.
    pub failed: usize,
    /// Whether the batch committed.
    pub made_changes: bool,
}

struct Extraction {
    id: Option<String>,
    fields: Vec<Field>,
    skip: bool,
}

/// An index fed by a single map transform.
#[derive(Debug, Clone)]
pub struct SimpleIndex {
    name: String,
    definition: IndexDefinition,
    store: Arc<dyn IndexStore>,
}

impl SimpleIndex {
    /// Create an index writing to `store`.
    pub fn new<S: Into<String>>(
        name: S,
        definition: IndexDefinition,
        store: Arc<dyn IndexStore>,
    ) -> Self {
        SimpleIndex {
            name: name.into(),
            definition,
            store,
        }
    }

    /// Name of the index.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Field configuration of the index.
    pub fn definition(&self) -> &IndexDefinition {
        &self.definition
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<dyn IndexStore> {
        &self.store
    }

    /// Run `action` inside a write transaction.
    ///
    /// The transaction commits when `action` reports changes and rolls back
    /// when it reports none. If `action` fails the writer is dropped
    /// uncommitted and the error is returned.
    pub fn write<F>(&self, action: F) -> Result<bool>
    where
        F: FnOnce(&mut dyn IndexWriter) -> Result<bool>,
    {
        let mut writer = self.store.begin_write()?;
        let made_changes = action(writer.as_mut())?;
        if made_changes {
            writer.commit()?;
        } else {
            writer.rollback()?;
        }
        Ok(made_changes)
    }

    /// Index a batch of documents.
    ///
    /// `minimum_timestamp` is the oldest modification time the batch was
    /// selected with; it is only logged.
    pub fn index_documents<I, M, S>(
        &self,
        documents: I,
        map: &M,
        context: &WorkContext,
        stats: &mut S,
        minimum_timestamp: DateTime<Utc>,
    ) -> Result<IndexingOutcome>
    where
        I: IntoIterator<Item = Document>,
        M: MapTransform + ?Sized,
        S: IndexingStatsAccessor + ?Sized,
    {
        let name = self.name.as_str();
        stats.set_current_index_stats_to(name);
        log::debug!(
            "Indexing documents for '{}' modified since {}",
            name,
            minimum_timestamp.to_rfc3339()
        );

        let mut outcome = IndexingOutcome::default();
        let made_changes = self.write(|writer| {
            let writer = RefCell::new(writer);
            let batchers = RefCell::new(context.create_batchers(name));
            let made_changes = Cell::new(false);
            let mut processed_keys = HashSet::new();
            let mut converter = FieldConverter::new(&self.definition);

            let documents: Vec<(String, Document)> = documents
                .into_iter()
                .map(|document| (document.id.to_lowercase(), document))
                .collect();
            let mut last_occurrence = HashMap::with_capacity(documents.len());
            for (position, (key, _)) in documents.iter().enumerate() {
                last_occurrence.insert(key.clone(), position);
            }

            let deduplicated = documents.into_iter().enumerate().filter_map(
                |(position, (key, document))| -> Option<Result<Document>> {
                    if processed_keys.insert(key.clone()) {
                        if self.store.contains_term(DOCUMENT_ID_FIELD, &key) {
                            made_changes.set(true);
                        }
                        self.apply_hooks(
                            &mut batchers.borrow_mut(),
                            context,
                            Some(document.id.as_str()),
                            "OnIndexEntryDeleted",
                            |batcher| batcher.on_entry_deleted(name, &document.id),
                        );
                        if let Err(err) = writer
                            .borrow_mut()
                            .delete_documents(DOCUMENT_ID_FIELD, &[key.clone()])
                        {
                            return Some(Err(err));
                        }
                    }
                    // Only the last occurrence of an id is mapped and added.
                    if last_occurrence.get(&key) != Some(&position) {
                        log::debug!(
                            "Skipping '{}' in index '{}', superseded later in the batch",
                            document.id,
                            name
                        );
                        return None;
                    }
                    Some(Ok(document))
                },
            );

            let mut robust = RobustEnumerator::new(
                deduplicated,
                |document: &Document| map.map(document),
                name,
                context,
            );

            for mapped in robust.by_ref() {
                let mapped = mapped?;
                outcome.processed += 1;

                let extraction = Self::extract(&mut converter, &mapped)?;
                let id = match extraction.id {
                    Some(id) if !id.is_empty() && !extraction.skip => id,
                    _ => continue,
                };

                let mut fields = Vec::with_capacity(extraction.fields.len() + 1);
                fields.push(Field::text(
                    DOCUMENT_ID_FIELD,
                    id.to_lowercase(),
                    FieldIndex::NotAnalyzed,
                    FieldStore::Yes,
                ));
                fields.extend(extraction.fields);
                let entry = IndexEntry::from_fields(fields);

                made_changes.set(true);
                self.apply_hooks(
                    &mut batchers.borrow_mut(),
                    context,
                    Some(id.as_str()),
                    "OnIndexEntryCreated",
                    |batcher| batcher.on_entry_created(name, &id, &entry),
                );
                log::trace!("Index '{}' resulted in: {:?}", name, entry);

                writer.borrow_mut().add_document(entry)?;
                stats.increment_success_indexing();
                outcome.indexed += 1;
            }

            outcome.failed = robust.failures();
            for _ in 0..outcome.failed {
                stats.increment_indexing_failure();
            }

            self.dispose_batchers(&mut batchers.borrow_mut(), context);
            Ok(made_changes.get())
        })?;
        outcome.made_changes = made_changes;

        log::debug!(
            "Indexed {} documents for {} ({} failed)",
            outcome.processed,
            name,
            outcome.failed
        );
        Ok(outcome)
    }

    /// Delete the entries produced by the documents `keys`.
    ///
    /// Always commits, even when no entry matched.
    pub fn remove(&self, keys: &[String], context: &WorkContext) -> Result<bool> {
        self.write(|writer| {
            log::debug!("Deleting ({}) from {}", keys.join(", "), self.name);
            let mut batchers = context.create_batchers(&self.name);

            for key in keys {
                self.apply_hooks(
                    &mut batchers,
                    context,
                    Some(key.as_str()),
                    "OnIndexEntryDeleted",
                    |batcher| batcher.on_entry_deleted(&self.name, key),
                );
            }

            let terms: Vec<String> = keys.iter().map(|key| key.to_lowercase()).collect();
            writer.delete_documents(DOCUMENT_ID_FIELD, &terms)?;

            self.dispose_batchers(&mut batchers, context);
            Ok(true)
        })
    }

    fn extract(converter: &mut FieldConverter<'_>, mapped: &MappedDocument) -> Result<Extraction> {
        match mapped {
            MappedDocument::Structured(map) => Ok(Extraction {
                id: mapped.entry_id().map(str::to_string),
                fields: converter.index_json(map, FieldStore::No)?,
                skip: false,
            }),
            MappedDocument::Typed(object) => {
                let fields = converter.index_object(object, FieldStore::No)?;
                // The id property is always present, so an object with more
                // properties that produced nothing has nothing to index.
                let skip = object.len() > 1 && fields.is_empty();
                Ok(Extraction {
                    id: mapped.entry_id().map(str::to_string),
                    fields,
                    skip,
                })
            }
        }
    }

    fn apply_hooks<A>(
        &self,
        batchers: &mut [Box<dyn IndexUpdateBatcher>],
        context: &WorkContext,
        key: Option<&str>,
        trigger: &str,
        action: A,
    ) where
        A: FnMut(&mut dyn IndexUpdateBatcher) -> anyhow::Result<()>,
    {
        apply_and_ignore_all_errors(
            batchers,
            |err| {
                log::warn!(
                    "Error when executed {} trigger for index '{}', key: '{}': {:#}",
                    trigger,
                    self.name,
                    key.unwrap_or_default(),
                    err
                );
                context.add_error(&self.name, key, &err.to_string());
            },
            action,
        );
    }

    fn dispose_batchers(&self, batchers: &mut [Box<dyn IndexUpdateBatcher>], context: &WorkContext) {
        apply_and_ignore_all_errors(
            batchers,
            |err| {
                log::warn!("Failed to dispose on index update trigger: {:#}", err);
                context.add_error(&self.name, None, &err.to_string());
            },
            |batcher| batcher.dispose(),
        );
    }
}
