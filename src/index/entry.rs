//! Index entries: the unit the index writer stores.

use serde::{Deserialize, Serialize};

use crate::document::document::DOCUMENT_ID_FIELD;
use crate::document::field::Field;

/// An ordered set of field records describing one indexed document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    fields: Vec<Field>,
}

impl IndexEntry {
    /// Create an empty entry.
    pub fn new() -> Self {
        IndexEntry::default()
    }

    /// Create an entry from a list of fields.
    pub fn from_fields(fields: Vec<Field>) -> Self {
        IndexEntry { fields }
    }

    /// Append a field.
    pub fn add(&mut self, field: Field) {
        self.fields.push(field);
    }

    /// The value of the document id field, if present.
    pub fn id(&self) -> Option<&str> {
        self.get(DOCUMENT_ID_FIELD).and_then(Field::text_value)
    }

    /// All fields in insertion order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// First field with the given name.
    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// All fields with the given name.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Field> + 'a {
        self.fields.iter().filter(move |f| f.name() == name)
    }

    /// Check if any text field named `field` holds exactly `term`.
    pub fn has_term(&self, field: &str, term: &str) -> bool {
        self.get_all(field).any(|f| f.text_value() == Some(term))
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the entry has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::field::{FieldIndex, FieldStore, NumericValue};

    #[test]
    fn test_entry_lookup() {
        let mut entry = IndexEntry::new();
        assert!(entry.is_empty());
        assert_eq!(entry.id(), None);

        entry.add(Field::text(
            DOCUMENT_ID_FIELD,
            "users/1",
            FieldIndex::NotAnalyzed,
            FieldStore::Yes,
        ));
        entry.add(Field::text("Tags", "a", FieldIndex::NotAnalyzed, FieldStore::No));
        entry.add(Field::text("Tags", "b", FieldIndex::NotAnalyzed, FieldStore::No));
        entry.add(Field::numeric(
            "Age_Range",
            NumericValue::Int(3),
            FieldStore::No,
        ));

        assert_eq!(entry.len(), 4);
        assert_eq!(entry.id(), Some("users/1"));
        assert_eq!(entry.get_all("Tags").count(), 2);
        assert!(entry.has_term("Tags", "b"));
        assert!(!entry.has_term("Tags", "c"));
        assert!(!entry.has_term("Age_Range", "3"));
    }
}
