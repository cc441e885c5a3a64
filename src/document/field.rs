//! Field records produced by the field converter.
//!
//! A [`Field`] is the unit the index writer consumes: a name, a value, and the
//! options that decide how the value is indexed and stored. Values are either
//! text or a numeric value carried for range queries (see [`NumericValue`]).

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use byteorder::{BigEndian, ByteOrder};
use serde::{Deserialize, Serialize};

/// How a field value is indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldIndex {
    /// Not indexed; the value can only be stored.
    No,
    /// Indexed through the analyzer.
    Analyzed,
    /// Indexed as a single exact term.
    NotAnalyzed,
    /// Indexed as a single exact term without length norms.
    NotAnalyzedNoNorms,
}

/// Whether the original field value is stored in the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldStore {
    /// Store the value so it can be retrieved.
    Yes,
    /// Index only.
    No,
}

impl FieldStore {
    /// Check if the value is stored.
    pub fn is_stored(&self) -> bool {
        matches!(self, FieldStore::Yes)
    }
}

/// A numeric value carried by a range field.
///
/// The variant decides the precision of the range encoding, which is why a
/// 32-bit integer configured for long sorting becomes [`NumericValue::Long`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum NumericValue {
    /// 32-bit signed integer.
    Int(i32),
    /// 64-bit signed integer.
    Long(i64),
    /// Single precision float.
    Float(f32),
    /// Double precision float.
    Double(f64),
}

impl NumericValue {
    /// Encode the value so that byte-wise comparison matches numeric order.
    ///
    /// Integers have their sign bit flipped; floats use the IEEE-754 total
    /// order trick (flip everything for negatives, only the sign otherwise).
    /// Values of different widths are not comparable with each other.
    pub fn to_sortable_bytes(&self) -> Vec<u8> {
        match *self {
            NumericValue::Int(v) => {
                let mut buf = vec![0u8; 4];
                BigEndian::write_u32(&mut buf, (v as u32) ^ 0x8000_0000);
                buf
            }
            NumericValue::Long(v) => {
                let mut buf = vec![0u8; 8];
                BigEndian::write_u64(&mut buf, (v as u64) ^ (1 << 63));
                buf
            }
            NumericValue::Float(v) => {
                let bits = v.to_bits();
                let sortable = if bits & 0x8000_0000 != 0 {
                    !bits
                } else {
                    bits | 0x8000_0000
                };
                let mut buf = vec![0u8; 4];
                BigEndian::write_u32(&mut buf, sortable);
                buf
            }
            NumericValue::Double(v) => {
                let bits = v.to_bits();
                let sortable = if bits & (1 << 63) != 0 {
                    !bits
                } else {
                    bits | (1 << 63)
                };
                let mut buf = vec![0u8; 8];
                BigEndian::write_u64(&mut buf, sortable);
                buf
            }
        }
    }

    /// Invariant textual form of the value.
    pub fn to_invariant_string(&self) -> String {
        match *self {
            NumericValue::Int(v) => v.to_string(),
            NumericValue::Long(v) => v.to_string(),
            NumericValue::Float(v) => invariant_float(v as f64, v.to_string()),
            NumericValue::Double(v) => invariant_float(v, v.to_string()),
        }
    }
}

/// Render a float the same way on every platform and locale.
pub(crate) fn invariant_float(value: f64, finite: String) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "Infinity".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else {
        finite
    }
}

/// The value held by a field record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldData {
    /// String-encoded value.
    Text(String),
    /// Range-encoded numeric value.
    Numeric(NumericValue),
}

/// A named, typed unit of searchable and storable data.
///
/// Field names are shared [`Arc<str>`] values so that records cloned from a
/// cached template do not allocate a new name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    name: Arc<str>,
    data: FieldData,
    index: FieldIndex,
    store: FieldStore,
}

impl Field {
    /// Create a text field.
    pub fn text<N: Into<Arc<str>>, V: Into<String>>(
        name: N,
        value: V,
        index: FieldIndex,
        store: FieldStore,
    ) -> Self {
        Field {
            name: name.into(),
            data: FieldData::Text(value.into()),
            index,
            store,
        }
    }

    /// Create a numeric range field.
    pub fn numeric<N: Into<Arc<str>>>(name: N, value: NumericValue, store: FieldStore) -> Self {
        Field {
            name: name.into(),
            data: FieldData::Numeric(value),
            index: FieldIndex::NotAnalyzedNoNorms,
            store,
        }
    }

    /// Get the field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the shared field name.
    pub fn shared_name(&self) -> &Arc<str> {
        &self.name
    }

    /// Get the field value.
    pub fn data(&self) -> &FieldData {
        &self.data
    }

    /// Get the indexing mode.
    pub fn index(&self) -> FieldIndex {
        self.index
    }

    /// Get the storage mode.
    pub fn store(&self) -> FieldStore {
        self.store
    }

    /// Check if this is a numeric range field.
    pub fn is_numeric(&self) -> bool {
        matches!(self.data, FieldData::Numeric(_))
    }

    /// Get the text value, if this is a text field.
    pub fn text_value(&self) -> Option<&str> {
        match &self.data {
            FieldData::Text(s) => Some(s.as_str()),
            FieldData::Numeric(_) => None,
        }
    }

    /// Get the numeric value, if this is a range field.
    pub fn numeric_value(&self) -> Option<NumericValue> {
        match self.data {
            FieldData::Numeric(v) => Some(v),
            FieldData::Text(_) => None,
        }
    }

    /// String form of the value, as used for term matching.
    pub fn string_value(&self) -> Cow<'_, str> {
        match &self.data {
            FieldData::Text(s) => Cow::Borrowed(s.as_str()),
            FieldData::Numeric(v) => Cow::Owned(v.to_invariant_string()),
        }
    }

    /// Replace the text value, keeping name and options.
    pub fn set_text(&mut self, value: String) {
        self.data = FieldData::Text(value);
    }

    /// Replace the numeric value, keeping name and options.
    pub fn set_numeric(&mut self, value: NumericValue) {
        self.data = FieldData::Numeric(value);
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let store = if self.store.is_stored() { "stored" } else { "unstored" };
        let index = match self.index {
            FieldIndex::No => "unindexed",
            FieldIndex::Analyzed => "analyzed",
            FieldIndex::NotAnalyzed => "not_analyzed",
            FieldIndex::NotAnalyzedNoNorms => "not_analyzed_no_norms",
        };
        write!(f, "{},{}<{}:{}>", store, index, self.name, self.string_value())
    }
}
