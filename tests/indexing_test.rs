#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use parking_lot::Mutex;
    use serde_json::json;
    use tempfile::TempDir;

    use tessera::document::{
        DOCUMENT_ID_FIELD, Document, FieldValue, MappedDocument, NumericValue, TypedObject,
    };
    use tessera::error::{Result, TesseraError};
    use tessera::index::{IndexEntry, IndexStore, IndexWriter, MemoryIndexStore};
    use tessera::indexing::{
        IdentityMap, InMemoryIndexingStats, IndexUpdateBatcher, IndexUpdateTrigger, MapTransform,
        SimpleIndex, WorkContext,
    };
    use tessera::schema::{IndexDefinition, SortOptions};
    use tessera::storage::{FileStorage, Storage, StorageConfig};

    fn documents(count: usize) -> Vec<Document> {
        (0..count)
            .map(|i| {
                Document::from_value(
                    format!("users/{i}"),
                    json!({ "Name": format!("user {i}"), "Age": i }),
                )
            })
            .collect()
    }

    fn memory_index(name: &str) -> (SimpleIndex, Arc<MemoryIndexStore>) {
        let store = Arc::new(MemoryIndexStore::new(name));
        (
            SimpleIndex::new(name, IndexDefinition::new(), store.clone()),
            store,
        )
    }

    #[test]
    fn test_one_map_failure_in_ten() {
        let (index, store) = memory_index("Users");
        let context = WorkContext::new();
        let mut stats = InMemoryIndexingStats::new();

        let map = |doc: &Document| -> anyhow::Result<Option<MappedDocument>> {
            if doc.id == "users/4" {
                anyhow::bail!("cannot map {}", doc.id);
            }
            IdentityMap.map(doc)
        };

        let outcome = index
            .index_documents(documents(10), &map, &context, &mut stats, Utc::now())
            .unwrap();

        assert_eq!(outcome.processed, 9);
        assert_eq!(outcome.indexed, 9);
        assert_eq!(outcome.failed, 1);
        assert!(outcome.made_changes);
        assert_eq!(store.num_docs(), 9);

        let errors = context.errors_for("Users");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].document.as_deref(), Some("users/4"));
        assert_eq!(errors[0].error, "cannot map users/4");

        assert_eq!(stats.get("Users").successes, 9);
        assert_eq!(stats.get("Users").failures, 1);
    }

    #[test]
    fn test_all_failing_batch_makes_no_changes() {
        let (index, store) = memory_index("Users");
        let context = WorkContext::new();
        let mut stats = InMemoryIndexingStats::new();

        let map = |_: &Document| -> anyhow::Result<Option<MappedDocument>> {
            anyhow::bail!("always fails")
        };

        let outcome = index
            .index_documents(documents(5), &map, &context, &mut stats, Utc::now())
            .unwrap();

        assert!(!outcome.made_changes);
        assert_eq!(outcome.indexed, 0);
        assert_eq!(outcome.failed, 5);
        assert_eq!(store.num_docs(), 0);
        assert_eq!(context.errors().len(), 5);
        assert_eq!(stats.get("Users").successes, 0);
    }

    #[test]
    fn test_all_failing_batch_still_deletes_prior_entries() {
        let (index, store) = memory_index("Users");
        let context = WorkContext::new();
        let mut stats = InMemoryIndexingStats::new();

        index
            .index_documents(documents(2), &IdentityMap, &context, &mut stats, Utc::now())
            .unwrap();
        assert_eq!(store.num_docs(), 2);

        let map = |_: &Document| -> anyhow::Result<Option<MappedDocument>> {
            anyhow::bail!("always fails")
        };
        let outcome = index
            .index_documents(documents(3), &map, &context, &mut stats, Utc::now())
            .unwrap();

        assert!(outcome.made_changes);
        assert_eq!(outcome.failed, 3);
        assert_eq!(store.num_docs(), 0);
    }

    #[test]
    fn test_empty_batch_rolls_back() {
        let (index, store) = memory_index("Users");
        let context = WorkContext::new();
        let mut stats = InMemoryIndexingStats::new();

        let outcome = index
            .index_documents(Vec::new(), &IdentityMap, &context, &mut stats, Utc::now())
            .unwrap();

        assert!(!outcome.made_changes);
        assert_eq!(store.num_docs(), 0);
    }

    #[test]
    fn test_reindexing_replaces_previous_entries() {
        let (index, store) = memory_index("Users");
        let context = WorkContext::new();
        let mut stats = InMemoryIndexingStats::new();

        index
            .index_documents(documents(3), &IdentityMap, &context, &mut stats, Utc::now())
            .unwrap();
        let updated = vec![Document::from_value("Users/1", json!({ "Name": "renamed" }))];
        index
            .index_documents(updated, &IdentityMap, &context, &mut stats, Utc::now())
            .unwrap();

        assert_eq!(store.num_docs(), 3);
        let entries = store.documents_with_term(DOCUMENT_ID_FIELD, "users/1");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].get("Name").unwrap().text_value(), Some("renamed"));
        assert!(entries[0].get("Age").is_none());
    }

    #[derive(Clone, Default)]
    struct Flaky(Arc<Mutex<Vec<String>>>);

    struct FlakyBatcher(Flaky);

    impl IndexUpdateBatcher for FlakyBatcher {
        fn on_entry_created(
            &mut self,
            _index: &str,
            key: &str,
            _entry: &IndexEntry,
        ) -> anyhow::Result<()> {
            if key == "users/2" {
                anyhow::bail!("created hook failed for {key}");
            }
            self.0.0.lock().push(key.to_string());
            Ok(())
        }

        fn dispose(&mut self) -> anyhow::Result<()> {
            anyhow::bail!("dispose failed")
        }
    }

    impl IndexUpdateTrigger for Flaky {
        fn create_batcher(&self, _index: &str) -> Option<Box<dyn IndexUpdateBatcher>> {
            Some(Box::new(FlakyBatcher(self.clone())))
        }
    }

    #[test]
    fn test_hook_failures_are_isolated() {
        let (index, store) = memory_index("Users");
        let flaky = Flaky::default();
        let context = WorkContext::new().with_trigger(Arc::new(flaky.clone()));
        let mut stats = InMemoryIndexingStats::new();

        let outcome = index
            .index_documents(documents(4), &IdentityMap, &context, &mut stats, Utc::now())
            .unwrap();

        assert_eq!(outcome.indexed, 4);
        assert_eq!(store.num_docs(), 4);
        assert_eq!(*flaky.0.lock(), vec!["users/0", "users/1", "users/3"]);

        let errors = context.errors();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].document.as_deref(), Some("users/2"));
        assert_eq!(errors[0].error, "created hook failed for users/2");
        assert_eq!(errors[1].document, None);
        assert_eq!(errors[1].error, "dispose failed");
    }

    #[derive(Debug)]
    struct FailingStore {
        inner: MemoryIndexStore,
        fail_on_add: usize,
    }

    #[derive(Debug)]
    struct FailingWriter<'a> {
        inner: Box<dyn IndexWriter + 'a>,
        adds: usize,
        fail_on_add: usize,
    }

    impl IndexWriter for FailingWriter<'_> {
        fn add_document(&mut self, entry: IndexEntry) -> Result<()> {
            self.adds += 1;
            if self.adds == self.fail_on_add {
                return Err(TesseraError::index("disk full"));
            }
            self.inner.add_document(entry)
        }

        fn delete_documents(&mut self, field: &str, terms: &[String]) -> Result<()> {
            self.inner.delete_documents(field, terms)
        }

        fn commit(&mut self) -> Result<()> {
            self.inner.commit()
        }

        fn rollback(&mut self) -> Result<()> {
            self.inner.rollback()
        }

        fn pending_operations(&self) -> usize {
            self.inner.pending_operations()
        }
    }

    impl IndexStore for FailingStore {
        fn begin_write(&self) -> Result<Box<dyn IndexWriter + '_>> {
            Ok(Box::new(FailingWriter {
                inner: self.inner.begin_write()?,
                adds: 0,
                fail_on_add: self.fail_on_add,
            }))
        }

        fn num_docs(&self) -> usize {
            self.inner.num_docs()
        }

        fn documents_with_term(&self, field: &str, term: &str) -> Vec<IndexEntry> {
            self.inner.documents_with_term(field, term)
        }

        fn contains_term(&self, field: &str, term: &str) -> bool {
            self.inner.contains_term(field, term)
        }
    }

    #[test]
    fn test_writer_failure_rolls_back_the_batch() {
        let store = Arc::new(FailingStore {
            inner: MemoryIndexStore::new("Users"),
            fail_on_add: 2,
        });
        let index = SimpleIndex::new("Users", IndexDefinition::new(), store.clone());
        let context = WorkContext::new();
        let mut stats = InMemoryIndexingStats::new();

        index
            .index_documents(documents(1), &IdentityMap, &context, &mut stats, Utc::now())
            .unwrap();
        assert_eq!(store.num_docs(), 1);

        let err = index
            .index_documents(documents(3), &IdentityMap, &context, &mut stats, Utc::now())
            .unwrap_err();
        assert_eq!(err.to_string(), "Index error: disk full");

        assert_eq!(store.num_docs(), 1);
        assert_eq!(store.documents_with_term(DOCUMENT_ID_FIELD, "users/0").len(), 1);
    }

    #[test]
    fn test_typed_documents_produce_range_fields() {
        let store = Arc::new(MemoryIndexStore::new("Orders"));
        let definition = IndexDefinition::new().with_sort("Total", SortOptions::Long);
        let index = SimpleIndex::new("Orders", definition, store.clone());
        let context = WorkContext::new();
        let mut stats = InMemoryIndexingStats::new();

        let map = |doc: &Document| -> anyhow::Result<Option<MappedDocument>> {
            let total = doc.data["Total"].as_i64().unwrap_or_default() as i32;
            Ok(Some(MappedDocument::Typed(
                TypedObject::new()
                    .with_id(doc.id.clone())
                    .with("Total", total)
                    .with("Lines", FieldValue::Array(vec!["a".into(), "b".into()])),
            )))
        };

        let orders = vec![Document::from_value("orders/1", json!({ "Total": 42 }))];
        index
            .index_documents(orders, &map, &context, &mut stats, Utc::now())
            .unwrap();

        let entry = &store.documents_with_term(DOCUMENT_ID_FIELD, "orders/1")[0];
        assert_eq!(entry.get("Total").unwrap().text_value(), Some("42"));
        assert_eq!(
            entry.get("Total_Range").unwrap().numeric_value(),
            Some(NumericValue::Long(42))
        );
        assert_eq!(entry.get("Lines_IsArray").unwrap().text_value(), Some("true"));
        assert_eq!(entry.get_all("Lines").count(), 2);
    }

    #[test]
    fn test_file_backed_index_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let context = WorkContext::new();
        let mut stats = InMemoryIndexingStats::new();

        {
            let storage =
                Arc::new(FileStorage::new(temp_dir.path(), StorageConfig::default()).unwrap());
            let store = Arc::new(MemoryIndexStore::open("Users", storage).unwrap());
            let index = SimpleIndex::new("Users", IndexDefinition::new(), store);
            index
                .index_documents(documents(4), &IdentityMap, &context, &mut stats, Utc::now())
                .unwrap();
            assert!(index.remove(&["users/3".to_string()], &context).unwrap());
        }

        let storage =
            Arc::new(FileStorage::new(temp_dir.path(), StorageConfig::default()).unwrap());
        assert_eq!(storage.list_files().unwrap(), vec!["Users.snapshot"]);

        let store = MemoryIndexStore::open("Users", storage).unwrap();
        assert_eq!(store.num_docs(), 3);
        assert!(store.documents_with_term(DOCUMENT_ID_FIELD, "users/3").is_empty());
        let entry = &store.documents_with_term(DOCUMENT_ID_FIELD, "users/2")[0];
        assert_eq!(
            entry.get("Age_Range").unwrap().numeric_value(),
            Some(NumericValue::Long(2))
        );
    }
}
