//! Raw and mapped documents.
//!
//! A [`Document`] is what the storage engine hands to an index: an id and a
//! JSON body. A map transform turns it into a [`MappedDocument`], the shape
//! whose properties become index fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::document::field_value::FieldValue;

/// Reserved property carrying the id of the index entry a mapped document
/// produces.
pub const DOCUMENT_ID_FIELD: &str = "__document_id";

/// A raw document as supplied by the storage engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Unique document id.
    pub id: String,
    /// The document body.
    pub data: Map<String, Value>,
    /// Last modification time, if known.
    #[serde(default)]
    pub last_modified: Option<DateTime<Utc>>,
}

impl Document {
    /// Create a document from an id and a JSON body.
    pub fn new<S: Into<String>>(id: S, data: Map<String, Value>) -> Self {
        Document {
            id: id.into(),
            data,
            last_modified: None,
        }
    }

    /// Create a document from a JSON value.
    ///
    /// Non-object values produce an empty body.
    pub fn from_value<S: Into<String>>(id: S, value: Value) -> Self {
        let data = match value {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Document::new(id, data)
    }

    /// Set the last modification time.
    pub fn with_last_modified(mut self, last_modified: DateTime<Utc>) -> Self {
        self.last_modified = Some(last_modified);
        self
    }
}

/// An item whose document key can be reported alongside an error.
pub trait DocumentKey {
    /// The document id, where one can be determined.
    fn document_key(&self) -> Option<&str>;
}

impl DocumentKey for Document {
    fn document_key(&self) -> Option<&str> {
        Some(self.id.as_str())
    }
}

/// A statically shaped object: an ordered list of named property values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypedObject {
    properties: Vec<(String, FieldValue)>,
}

impl TypedObject {
    /// Create an empty object.
    pub fn new() -> Self {
        TypedObject::default()
    }

    /// Add a property.
    pub fn with<S: Into<String>, V: Into<FieldValue>>(mut self, name: S, value: V) -> Self {
        self.properties.push((name.into(), value.into()));
        self
    }

    /// Add the reserved id property.
    pub fn with_id<S: Into<String>>(self, id: S) -> Self {
        self.with(DOCUMENT_ID_FIELD, FieldValue::Text(id.into()))
    }

    /// Get a property value by name.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.properties
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Iterate over properties in declaration order.
    pub fn properties(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.properties.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Number of properties, including the id.
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Check if the object has no properties.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

/// The output of a map transform.
///
/// Both shapes carry the id of the entry they produce in the
/// [`DOCUMENT_ID_FIELD`] property.
#[derive(Debug, Clone, PartialEq)]
pub enum MappedDocument {
    /// A loosely typed JSON object.
    Structured(Map<String, Value>),
    /// A statically shaped object.
    Typed(TypedObject),
}

impl MappedDocument {
    /// The id of the entry this document produces, if any.
    pub fn entry_id(&self) -> Option<&str> {
        match self {
            MappedDocument::Structured(map) => map.get(DOCUMENT_ID_FIELD).and_then(Value::as_str),
            MappedDocument::Typed(object) => match object.get(DOCUMENT_ID_FIELD) {
                Some(FieldValue::Text(id)) => Some(id.as_str()),
                _ => None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_document_from_value() {
        let doc = Document::from_value("users/1", json!({"name": "ayende"}));
        assert_eq!(doc.id, "users/1");
        assert_eq!(doc.data.get("name"), Some(&json!("ayende")));
        assert_eq!(doc.document_key(), Some("users/1"));

        let doc = Document::from_value("users/2", json!([1, 2]));
        assert!(doc.data.is_empty());
    }

    #[test]
    fn test_typed_object_properties_keep_order() {
        let object = TypedObject::new()
            .with_id("users/1")
            .with("name", "ayende")
            .with("age", 30i32);

        let names: Vec<&str> = object.properties().map(|(n, _)| n).collect();
        assert_eq!(names, vec![DOCUMENT_ID_FIELD, "name", "age"]);
        assert_eq!(object.len(), 3);
        assert_eq!(object.get("age"), Some(&FieldValue::Int(30)));
    }

    #[test]
    fn test_entry_id() {
        let typed = MappedDocument::Typed(TypedObject::new().with_id("a/1"));
        assert_eq!(typed.entry_id(), Some("a/1"));

        let typed = MappedDocument::Typed(TypedObject::new().with(DOCUMENT_ID_FIELD, FieldValue::Null));
        assert_eq!(typed.entry_id(), None);

        let mut map = Map::new();
        map.insert(DOCUMENT_ID_FIELD.to_string(), json!("b/2"));
        assert_eq!(MappedDocument::Structured(map).entry_id(), Some("b/2"));

        let mut map = Map::new();
        map.insert(DOCUMENT_ID_FIELD.to_string(), Value::Null);
        assert_eq!(MappedDocument::Structured(map).entry_id(), None);
    }
}
