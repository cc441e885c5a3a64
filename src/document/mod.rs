//! Document module.
//!
//! This module provides the raw and mapped document shapes, the runtime
//! values a document property can hold, and the field records produced for
//! the index.

#[allow(clippy::module_inception)]
pub mod document;
pub mod field;
pub mod field_value;

// Re-export commonly used types
pub use document::{DOCUMENT_ID_FIELD, Document, DocumentKey, MappedDocument, TypedObject};
pub use field::{Field, FieldData, FieldIndex, FieldStore, NumericValue};
pub use field_value::{Decimal, FieldValue, date_to_string};
