//! Fault-isolating enumeration of mapped documents.

use crate::document::document::DocumentKey;
use crate::error::Result;
use crate::indexing::context::ErrorSink;

/// Lazily applies a transform to each source item, skipping items whose
/// transform fails.
///
/// A failing item is logged, reported to the [`ErrorSink`] under the index
/// name and the item's document key, and counted; iteration then moves on to
/// the next source item. Errors produced by the source itself are not
/// isolated and are yielded to the caller.
pub struct RobustEnumerator<'a, I, F> {
    source: I,
    transform: F,
    index: &'a str,
    errors: &'a dyn ErrorSink,
    failures: usize,
}

impl<'a, I, F> RobustEnumerator<'a, I, F> {
    /// Wrap a source of items.
    pub fn new(source: I, transform: F, index: &'a str, errors: &'a dyn ErrorSink) -> Self {
        RobustEnumerator {
            source,
            transform,
            index,
            errors,
            failures: 0,
        }
    }

    /// Number of items whose transform failed so far.
    pub fn failures(&self) -> usize {
        self.failures
    }
}

impl<I, F, T, U> Iterator for RobustEnumerator<'_, I, F>
where
    I: Iterator<Item = Result<T>>,
    T: DocumentKey,
    F: FnMut(&T) -> anyhow::Result<Option<U>>,
{
    type Item = Result<U>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let item = match self.source.next()? {
                Ok(item) => item,
                Err(err) => return Some(Err(err)),
            };

            match (self.transform)(&item) {
                Ok(Some(mapped)) => return Some(Ok(mapped)),
                Ok(None) => continue,
                Err(err) => {
                    let key = item.document_key();
                    log::warn!(
                        "Failed to execute indexing function on {} for index '{}': {:#}",
                        key.unwrap_or("<unknown>"),
                        self.index,
                        err
                    );
                    self.errors.add_error(self.index, key, &err.to_string());
                    self.failures += 1;
                }
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.source.size_hint().1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::document::Document;
    use crate::error::TesseraError;
    use crate::indexing::context::WorkContext;
    use serde_json::json;

    fn documents(count: usize) -> Vec<Result<Document>> {
        (0..count)
            .map(|i| Ok(Document::from_value(format!("docs/{i}"), json!({ "n": i }))))
            .collect()
    }

    #[test]
    fn test_failures_are_skipped_and_recorded() {
        let context = WorkContext::new();
        let mut robust = RobustEnumerator::new(
            documents(10).into_iter(),
            |doc: &Document| -> anyhow::Result<Option<String>> {
                if doc.id == "docs/3" {
                    anyhow::bail!("bad document");
                }
                Ok(Some(doc.id.clone()))
            },
            "Docs",
            &context,
        );

        let ids: Vec<String> = robust.by_ref().map(|r| r.unwrap()).collect();
        assert_eq!(ids.len(), 9);
        assert!(!ids.contains(&"docs/3".to_string()));
        assert_eq!(robust.failures(), 1);

        let errors = context.errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].index, "Docs");
        assert_eq!(errors[0].document.as_deref(), Some("docs/3"));
        assert_eq!(errors[0].error, "bad document");
    }

    #[test]
    fn test_transform_may_drop_items() {
        let context = WorkContext::new();
        let robust = RobustEnumerator::new(
            documents(4).into_iter(),
            |doc: &Document| -> anyhow::Result<Option<u64>> {
                Ok(doc.data["n"].as_u64().filter(|n| n % 2 == 0))
            },
            "Docs",
            &context,
        );

        let kept: Vec<u64> = robust.map(|r| r.unwrap()).collect();
        assert_eq!(kept, vec![0, 2]);
        assert!(context.errors().is_empty());
    }

    #[test]
    fn test_source_errors_are_not_isolated() {
        let context = WorkContext::new();
        let source = vec![
            Ok(Document::from_value("docs/1", json!({}))),
            Err(TesseraError::index("writer failed")),
        ];
        let mut robust = RobustEnumerator::new(
            source.into_iter(),
            |doc: &Document| -> anyhow::Result<Option<String>> { Ok(Some(doc.id.clone())) },
            "Docs",
            &context,
        );

        assert_eq!(robust.next().unwrap().unwrap(), "docs/1");
        assert!(robust.next().unwrap().is_err());
        assert!(robust.next().is_none());
        assert!(context.errors().is_empty());
    }
}
