//! Conversion of document values into index field records.
//!
//! Given a field name and a [`FieldValue`], the [`FieldConverter`] produces the
//! field records the index needs:
//!
//! - null values become a single not-analyzed `NULL_VALUE` term, implicit
//!   nulls produce nothing
//! - arrays emit a `<name>_IsArray` marker and index every item under the
//!   same name
//! - strings are analyzed unless the definition says otherwise
//! - dates, booleans and other scalars are indexed as invariant strings
//! - structured values emit a `<name>_ConvertToJson` marker followed by
//!   their compact JSON text
//! - numbers additionally get a `<name>_Range` field for range queries
//!
//! One converter serves one indexing batch. It caches field name templates
//! keyed by name, options and array depth so repeated documents in the batch
//! share them.

use std::borrow::Cow;
use std::sync::Arc;

use ahash::AHashMap;
use serde_json::{Map, Value};

use crate::document::document::{DOCUMENT_ID_FIELD, TypedObject};
use crate::document::field::{Field, FieldIndex, FieldStore, NumericValue};
use crate::document::field_value::FieldValue;
use crate::error::{Result, TesseraError};
use crate::schema::{IndexDefinition, SortOptions};

/// Reserved term indexed for null values.
pub const NULL_VALUE: &str = "NULL_VALUE";

/// Suffix of the marker field emitted for array values.
pub const IS_ARRAY_SUFFIX: &str = "_IsArray";

/// Suffix of the marker field emitted for structured values.
pub const CONVERT_TO_JSON_SUFFIX: &str = "_ConvertToJson";

/// Suffix of the numeric range companion field.
pub const RANGE_SUFFIX: &str = "_Range";

/// Validate a field name and make it start with a letter or underscore.
///
/// Names not starting with a letter or `_` get a `_` prefix, so normalizing
/// an already normalized name returns it unchanged.
pub fn normalize_field_name(name: &str) -> Result<Cow<'_, str>> {
    if name.trim().is_empty() {
        return Err(TesseraError::invalid_argument(
            "Field must be not null, not empty and cannot contain whitespace",
        ));
    }

    match name.chars().next() {
        Some(c) if c.is_alphabetic() || c == '_' => Ok(Cow::Borrowed(name)),
        _ => Ok(Cow::Owned(format!("_{name}"))),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FieldCacheKey {
    name: String,
    index: FieldIndex,
    store: FieldStore,
    depth: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct NumericCacheKey {
    name: String,
    store: FieldStore,
    depth: usize,
}

/// Converts document values into field records for one indexing batch.
///
/// Not meant to be shared between batches: the template cache and the array
/// depth markers are batch state.
#[derive(Debug)]
pub struct FieldConverter<'a> {
    definition: &'a IndexDefinition,
    /// Position markers of the arrays currently being flattened.
    depth_markers: Vec<usize>,
    fields_cache: AHashMap<FieldCacheKey, Arc<str>>,
    numeric_fields_cache: AHashMap<NumericCacheKey, Arc<str>>,
}

impl<'a> FieldConverter<'a> {
    /// Create a converter for the given index definition.
    pub fn new(definition: &'a IndexDefinition) -> Self {
        FieldConverter {
            definition,
            depth_markers: Vec::new(),
            fields_cache: AHashMap::new(),
            numeric_fields_cache: AHashMap::new(),
        }
    }

    /// Convert one named value into field records.
    ///
    /// Fails only when `name` is empty or whitespace.
    pub fn convert(
        &mut self,
        name: &str,
        value: &FieldValue,
        default_storage: FieldStore,
    ) -> Result<Vec<Field>> {
        let mut fields = Vec::new();
        self.create_fields(name, value, default_storage, &mut fields)?;
        Ok(fields)
    }

    /// Convert every property of a typed object except the reserved id.
    pub fn index_object(
        &mut self,
        object: &TypedObject,
        default_storage: FieldStore,
    ) -> Result<Vec<Field>> {
        let mut fields = Vec::new();
        for (name, value) in object.properties() {
            if name == DOCUMENT_ID_FIELD {
                continue;
            }
            self.create_fields(name, value, default_storage, &mut fields)?;
        }
        Ok(fields)
    }

    /// Convert every property of a JSON object except the reserved id.
    ///
    /// Nested arrays and objects are indexed as their compact JSON text.
    pub fn index_json(
        &mut self,
        document: &Map<String, Value>,
        default_storage: FieldStore,
    ) -> Result<Vec<Field>> {
        let mut fields = Vec::new();
        for (name, value) in document {
            if name == DOCUMENT_ID_FIELD {
                continue;
            }
            let value = match value {
                Value::Array(_) | Value::Object(_) => FieldValue::Text(value.to_string()),
                other => FieldValue::from_json(other),
            };
            self.create_fields(name, &value, default_storage, &mut fields)?;
        }
        Ok(fields)
    }

    /// Number of cached field templates.
    pub fn cached_templates(&self) -> usize {
        self.fields_cache.len() + self.numeric_fields_cache.len()
    }

    /// Sum of the array position markers currently pushed.
    pub fn depth_signature(&self) -> usize {
        self.depth_markers.iter().sum()
    }

    fn create_fields(
        &mut self,
        name: &str,
        value: &FieldValue,
        default_storage: FieldStore,
        out: &mut Vec<Field>,
    ) -> Result<()> {
        let name = normalize_field_name(name)?;
        let name = name.as_ref();
        let definition = self.definition;

        match value {
            FieldValue::Null => {
                let store = definition.get_storage(name, default_storage);
                out.push(self.cached_field(
                    name,
                    NULL_VALUE.to_string(),
                    FieldIndex::NotAnalyzed,
                    store,
                ));
                return Ok(());
            }
            FieldValue::Undefined => return Ok(()),
            FieldValue::Field(field) => {
                out.push(field.clone());
                return Ok(());
            }
            FieldValue::Array(items) => {
                let marker = format!("{name}{IS_ARRAY_SUFFIX}");
                let store = definition.get_storage(&marker, FieldStore::Yes);
                out.push(self.cached_field(
                    &marker,
                    "true".to_string(),
                    FieldIndex::NotAnalyzedNoNorms,
                    store,
                ));

                for (position, item) in items.iter().enumerate() {
                    self.depth_markers.push(position + 1);
                    let result = self.create_fields(name, item, default_storage, out);
                    self.depth_markers.pop();
                    result?;
                }
                return Ok(());
            }
            _ => {}
        }

        let store = definition.get_storage(name, default_storage);

        if definition.is_not_analyzed(name) {
            out.push(self.cached_field(
                name,
                value.to_invariant_string(),
                FieldIndex::NotAnalyzed,
                store,
            ));
            return Ok(());
        }

        if let FieldValue::Text(text) = value {
            let index = definition
                .get_index(name, Some(FieldIndex::Analyzed))
                .unwrap_or(FieldIndex::Analyzed);
            out.push(self.cached_field(name, text.clone(), index, store));
            return Ok(());
        }

        let index = definition
            .get_index(name, Some(FieldIndex::NotAnalyzed))
            .unwrap_or(FieldIndex::NotAnalyzed);

        match value {
            FieldValue::Json(json) => {
                let marker = format!("{name}{CONVERT_TO_JSON_SUFFIX}");
                let marker_store = definition.get_storage(&marker, FieldStore::Yes);
                out.push(self.cached_field(
                    &marker,
                    "true".to_string(),
                    FieldIndex::NotAnalyzedNoNorms,
                    marker_store,
                ));
                out.push(self.cached_field(name, json.to_string(), index, store));
            }
            FieldValue::Map(_) | FieldValue::Opaque(_) => {
                let marker = format!("{name}{CONVERT_TO_JSON_SUFFIX}");
                out.push(self.cached_field(
                    &marker,
                    "true".to_string(),
                    FieldIndex::NotAnalyzedNoNorms,
                    FieldStore::Yes,
                ));
                out.push(self.cached_field(name, value.to_invariant_string(), index, store));
            }
            _ => {
                out.push(self.cached_field(name, value.to_invariant_string(), index, store));
            }
        }

        if let Some(numeric) = self.range_value(name, value) {
            out.push(self.cached_numeric_field(name, numeric, store));
        }

        Ok(())
    }

    /// Range encoding of a numeric value, honoring the field's sort type.
    fn range_value(&self, name: &str, value: &FieldValue) -> Option<NumericValue> {
        let sort = self.definition.get_sort_option(name);
        match value {
            FieldValue::Int(v) if sort == SortOptions::Long => Some(NumericValue::Long(i64::from(*v))),
            FieldValue::Int(v) => Some(NumericValue::Int(*v)),
            FieldValue::Long(v) => Some(NumericValue::Long(*v)),
            FieldValue::Decimal(d) => Some(NumericValue::Double(d.to_f64())),
            FieldValue::Float(v) if sort == SortOptions::Double => {
                Some(NumericValue::Double(f64::from(*v)))
            }
            FieldValue::Float(v) => Some(NumericValue::Float(*v)),
            FieldValue::Double(v) => Some(NumericValue::Double(*v)),
            _ => None,
        }
    }

    fn cached_field(
        &mut self,
        name: &str,
        value: String,
        index: FieldIndex,
        store: FieldStore,
    ) -> Field {
        let key = FieldCacheKey {
            name: name.to_string(),
            index,
            store,
            depth: self.depth_signature(),
        };
        let shared = self
            .fields_cache
            .entry(key)
            .or_insert_with_key(|key| Arc::from(key.name.as_str()));
        Field::text(Arc::clone(shared), value, index, store)
    }

    fn cached_numeric_field(&mut self, name: &str, value: NumericValue, store: FieldStore) -> Field {
        let key = NumericCacheKey {
            name: format!("{name}{RANGE_SUFFIX}"),
            store,
            depth: self.depth_signature(),
        };
        let shared = self
            .numeric_fields_cache
            .entry(key)
            .or_insert_with_key(|key| Arc::from(key.name.as_str()));
        Field::numeric(Arc::clone(shared), value, store)
    }
}
