//! Values accepted by the field converter.
//!
//! [`FieldValue`] is the closed set of runtime shapes a document property can
//! take before it is turned into [`Field`] records. Besides plain scalars it
//! distinguishes an explicit `null` from an implicit one ([`FieldValue::Undefined`]),
//! wrapped JSON from arbitrary mappings, and carries pre-built fields through
//! untouched.
//!
//! ```
//! use tessera::document::field_value::FieldValue;
//!
//! let tags: FieldValue = vec!["rust", "search"].into();
//! assert!(tags.is_array());
//!
//! let age: FieldValue = 42i32.into();
//! assert!(age.is_numeric());
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::document::field::{Field, invariant_float};
use crate::error::{Result, TesseraError};

/// Fixed-point decimal number kept in its canonical textual form.
///
/// Decimals are exact in their string form and approximate once encoded for
/// range queries, where they always become doubles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decimal(String);

impl Decimal {
    /// Approximate the decimal as a double.
    pub fn to_f64(&self) -> f64 {
        // The text is validated on construction.
        self.0.parse::<f64>().unwrap_or(f64::NAN)
    }

    /// Canonical textual form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Decimal {
    type Err = TesseraError;

    fn from_str(s: &str) -> Result<Self> {
        let digits = s.strip_prefix('-').unwrap_or(s);
        let (int_part, frac_part) = match digits.split_once('.') {
            Some((i, f)) => (i, Some(f)),
            None => (digits, None),
        };

        let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(int_part) || !frac_part.is_none_or(all_digits) {
            return Err(TesseraError::invalid_argument(format!(
                "'{s}' is not a decimal number"
            )));
        }

        let int_part = int_part.trim_start_matches('0');
        let int_part = if int_part.is_empty() { "0" } else { int_part };
        let frac_part = frac_part.map(|f| f.trim_end_matches('0')).unwrap_or("");
        let negative = s.starts_with('-') && !(int_part == "0" && frac_part.is_empty());

        let mut canonical = String::with_capacity(s.len());
        if negative {
            canonical.push('-');
        }
        canonical.push_str(int_part);
        if !frac_part.is_empty() {
            canonical.push('.');
            canonical.push_str(frac_part);
        }
        Ok(Decimal(canonical))
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A runtime value to be converted into field records.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Explicit null.
    Null,
    /// Implicit null: the value is absent and produces no fields.
    Undefined,
    /// A field record built by the caller, passed through as-is.
    Field(Field),
    /// Multiple values indexed under the same field name.
    Array(Vec<FieldValue>),
    /// Text value.
    Text(String),
    /// Date and time, indexed at millisecond resolution.
    DateTime(DateTime<Utc>),
    /// Boolean value.
    Boolean(bool),
    /// 32-bit signed integer.
    Int(i32),
    /// 64-bit signed integer.
    Long(i64),
    /// 64-bit unsigned integer (no range companion).
    ULong(u64),
    /// Single precision float.
    Float(f32),
    /// Double precision float.
    Double(f64),
    /// Fixed-point decimal.
    Decimal(Decimal),
    /// Single character.
    Char(char),
    /// A JSON value that is already structured.
    Json(Value),
    /// A mapping of names to values.
    Map(BTreeMap<String, FieldValue>),
    /// Any other serialisable object, captured as JSON.
    Opaque(Value),
}

impl FieldValue {
    /// Capture an arbitrary serialisable object.
    pub fn opaque<T: Serialize>(value: &T) -> Result<Self> {
        Ok(FieldValue::Opaque(serde_json::to_value(value)?))
    }

    /// Convert a JSON scalar the way the structured document path reads it.
    ///
    /// Integers become 64-bit integers, other numbers doubles, strings that
    /// parse as RFC 3339 timestamps become dates. Arrays and objects stay
    /// wrapped as [`FieldValue::Json`].
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Boolean(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    FieldValue::Long(i)
                } else if let Some(u) = n.as_u64() {
                    FieldValue::ULong(u)
                } else {
                    FieldValue::Double(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::String(s) => match DateTime::parse_from_rfc3339(s) {
                Ok(date) => FieldValue::DateTime(date.with_timezone(&Utc)),
                Err(_) => FieldValue::Text(s.clone()),
            },
            Value::Array(_) | Value::Object(_) => FieldValue::Json(value.clone()),
        }
    }

    /// Check if the value is flattened as an array.
    pub fn is_array(&self) -> bool {
        matches!(self, FieldValue::Array(_))
    }

    /// Check if the value gets a range companion field.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            FieldValue::Int(_)
                | FieldValue::Long(_)
                | FieldValue::Float(_)
                | FieldValue::Double(_)
                | FieldValue::Decimal(_)
        )
    }

    /// Render the value as JSON.
    ///
    /// Pre-built fields render as their string value, undefined as null.
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Null | FieldValue::Undefined => Value::Null,
            FieldValue::Field(field) => Value::String(field.string_value().into_owned()),
            FieldValue::Array(items) => Value::Array(items.iter().map(|v| v.to_json()).collect()),
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::DateTime(d) => Value::String(d.to_rfc3339()),
            FieldValue::Boolean(b) => Value::Bool(*b),
            FieldValue::Int(i) => Value::from(*i),
            FieldValue::Long(i) => Value::from(*i),
            FieldValue::ULong(u) => Value::from(*u),
            FieldValue::Float(f) => Value::from(*f as f64),
            FieldValue::Double(f) => Value::from(*f),
            FieldValue::Decimal(d) => serde_json::Number::from_str(d.as_str())
                .map(Value::Number)
                .unwrap_or_else(|_| Value::String(d.to_string())),
            FieldValue::Char(c) => Value::String(c.to_string()),
            FieldValue::Json(v) | FieldValue::Opaque(v) => v.clone(),
            FieldValue::Map(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }

    /// Culture-invariant string form of a scalar value.
    ///
    /// Dates use the sortable millisecond format, structured values their
    /// compact JSON text.
    pub fn to_invariant_string(&self) -> String {
        match self {
            FieldValue::Null | FieldValue::Undefined => String::new(),
            FieldValue::Field(field) => field.string_value().into_owned(),
            FieldValue::Text(s) => s.clone(),
            FieldValue::DateTime(d) => date_to_string(d),
            FieldValue::Boolean(b) => b.to_string(),
            FieldValue::Int(i) => i.to_string(),
            FieldValue::Long(i) => i.to_string(),
            FieldValue::ULong(u) => u.to_string(),
            FieldValue::Float(f) => invariant_float(*f as f64, f.to_string()),
            FieldValue::Double(f) => invariant_float(*f, f.to_string()),
            FieldValue::Decimal(d) => d.to_string(),
            FieldValue::Char(c) => c.to_string(),
            FieldValue::Array(_) | FieldValue::Json(_) | FieldValue::Map(_) | FieldValue::Opaque(_) => {
                self.to_json().to_string()
            }
        }
    }
}

/// Format a date at millisecond resolution (`yyyyMMddHHmmssSSS`, UTC).
///
/// The format sorts lexicographically in time order.
pub fn date_to_string(date: &DateTime<Utc>) -> String {
    date.format("%Y%m%d%H%M%S%3f").to_string()
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Int(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Long(value)
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        FieldValue::ULong(value)
    }
}

impl From<f32> for FieldValue {
    fn from(value: f32) -> Self {
        FieldValue::Float(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Double(value)
    }
}

impl From<char> for FieldValue {
    fn from(value: char) -> Self {
        FieldValue::Char(value)
    }
}

impl From<Decimal> for FieldValue {
    fn from(value: Decimal) -> Self {
        FieldValue::Decimal(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::DateTime(value)
    }
}

impl From<Field> for FieldValue {
    fn from(value: Field) -> Self {
        FieldValue::Field(value)
    }
}

impl<T: Into<FieldValue>> From<Vec<T>> for FieldValue {
    fn from(values: Vec<T>) -> Self {
        FieldValue::Array(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_decimal_parsing() {
        let d: Decimal = "0012.5000".parse().unwrap();
        assert_eq!(d.as_str(), "12.5");
        assert_eq!(d.to_f64(), 12.5);

        let d: Decimal = "-0.0".parse().unwrap();
        assert_eq!(d.as_str(), "0");

        let d: Decimal = "-3".parse().unwrap();
        assert_eq!(d.to_string(), "-3");

        assert!("1e5".parse::<Decimal>().is_err());
        assert!("".parse::<Decimal>().is_err());
        assert!("1.".parse::<Decimal>().is_err());
    }

    #[test]
    fn test_from_json_scalars() {
        assert_eq!(FieldValue::from_json(&json!(null)), FieldValue::Null);
        assert_eq!(FieldValue::from_json(&json!(3)), FieldValue::Long(3));
        assert_eq!(FieldValue::from_json(&json!(1.5)), FieldValue::Double(1.5));
        assert_eq!(
            FieldValue::from_json(&json!(u64::MAX)),
            FieldValue::ULong(u64::MAX)
        );
        assert_eq!(
            FieldValue::from_json(&json!("plain")),
            FieldValue::Text("plain".to_string())
        );

        let date = Utc.with_ymd_and_hms(2010, 5, 1, 12, 30, 0).unwrap();
        assert_eq!(
            FieldValue::from_json(&json!("2010-05-01T12:30:00Z")),
            FieldValue::DateTime(date)
        );
        assert!(matches!(
            FieldValue::from_json(&json!({"a": 1})),
            FieldValue::Json(_)
        ));
    }

    #[test]
    fn test_date_to_string_millisecond_resolution() {
        let date = Utc
            .with_ymd_and_hms(2010, 5, 1, 12, 30, 5)
            .unwrap()
            .checked_add_signed(chrono::Duration::milliseconds(42))
            .unwrap();
        assert_eq!(date_to_string(&date), "20100501123005042");
    }

    #[test]
    fn test_invariant_strings() {
        assert_eq!(FieldValue::Boolean(true).to_invariant_string(), "true");
        assert_eq!(FieldValue::Double(0.5).to_invariant_string(), "0.5");
        assert_eq!(FieldValue::Float(f32::INFINITY).to_invariant_string(), "Infinity");
        assert_eq!(FieldValue::Char('x').to_invariant_string(), "x");

        let mut map = BTreeMap::new();
        map.insert("b".to_string(), FieldValue::Int(2));
        map.insert("a".to_string(), FieldValue::from("x"));
        assert_eq!(
            FieldValue::Map(map).to_invariant_string(),
            r#"{"a":"x","b":2}"#
        );
    }

    #[test]
    fn test_conversions() {
        let value: FieldValue = Some(5i64).into();
        assert_eq!(value, FieldValue::Long(5));

        let value: FieldValue = None::<i64>.into();
        assert_eq!(value, FieldValue::Null);

        let value: FieldValue = vec![1i32, 2].into();
        assert_eq!(
            value,
            FieldValue::Array(vec![FieldValue::Int(1), FieldValue::Int(2)])
        );
    }

    #[test]
    fn test_opaque_capture() {
        #[derive(Serialize)]
        struct Point {
            x: i32,
            y: i32,
        }

        let value = FieldValue::opaque(&Point { x: 1, y: 2 }).unwrap();
        assert_eq!(value.to_invariant_string(), r#"{"x":1,"y":2}"#);
    }
}
