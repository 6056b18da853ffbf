//! Runtime variable values compared by variable conditions.

use rkyv::{Archive, Deserialize, Serialize};
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

/// A runtime variable value as it enters a query.
///
/// This is the closed set of value kinds the engine knows about. Raw input
/// (JSON, caller arguments) is resolved into one of these variants once, at
/// the boundary, and everything downstream matches on [`ValueKind`].
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize)]
#[serde(tag = "type", content = "value")]
pub enum VariableValue {
    /// Null value.
    Null,
    /// Boolean value.
    Boolean(bool),
    /// UTF-8 string.
    String(String),
    /// 16-bit signed integer.
    Short(i16),
    /// 32-bit signed integer.
    Integer(i32),
    /// 64-bit signed integer.
    Long(i64),
    /// 64-bit floating point.
    Double(f64),
    /// Date as milliseconds since Unix epoch.
    Date(i64),
    /// Binary payload.
    Bytes(Vec<u8>),
    /// File reference with inline content.
    File {
        name: String,
        mime_type: Option<String>,
        content: Vec<u8>,
    },
    /// Opaque serialized object.
    Object { type_name: String, serialized: String },
}

/// Payload-free tag of a [`VariableValue`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize,
)]
pub enum ValueKind {
    Null,
    Boolean,
    String,
    Short,
    Integer,
    Long,
    Double,
    Date,
    Bytes,
    File,
    Object,
}

impl ValueKind {
    /// Primitive kinds can be projected into a normalized value.
    pub fn is_primitive(self) -> bool {
        !matches!(self, ValueKind::Bytes | ValueKind::File | ValueKind::Object)
    }

    /// Integral and floating point kinds.
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            ValueKind::Short | ValueKind::Integer | ValueKind::Long | ValueKind::Double
        )
    }

    /// Lowercase type name as used by serializers and saved filters.
    pub fn as_str(self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Boolean => "boolean",
            ValueKind::String => "string",
            ValueKind::Short => "short",
            ValueKind::Integer => "integer",
            ValueKind::Long => "long",
            ValueKind::Double => "double",
            ValueKind::Date => "date",
            ValueKind::Bytes => "bytes",
            ValueKind::File => "file",
            ValueKind::Object => "object",
        }
    }
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ValueKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.to_ascii_lowercase().as_str() {
            "null" => ValueKind::Null,
            "boolean" => ValueKind::Boolean,
            "string" => ValueKind::String,
            "short" => ValueKind::Short,
            "integer" => ValueKind::Integer,
            "long" => ValueKind::Long,
            "double" => ValueKind::Double,
            "date" => ValueKind::Date,
            "bytes" => ValueKind::Bytes,
            "file" => ValueKind::File,
            "object" => ValueKind::Object,
            _ => {
                return Err(crate::Error::UnknownName {
                    kind: "value kind",
                    value: s.to_string(),
                })
            }
        };
        Ok(kind)
    }
}

impl VariableValue {
    /// The closed kind of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            VariableValue::Null => ValueKind::Null,
            VariableValue::Boolean(_) => ValueKind::Boolean,
            VariableValue::String(_) => ValueKind::String,
            VariableValue::Short(_) => ValueKind::Short,
            VariableValue::Integer(_) => ValueKind::Integer,
            VariableValue::Long(_) => ValueKind::Long,
            VariableValue::Double(_) => ValueKind::Double,
            VariableValue::Date(_) => ValueKind::Date,
            VariableValue::Bytes(_) => ValueKind::Bytes,
            VariableValue::File { .. } => ValueKind::File,
            VariableValue::Object { .. } => ValueKind::Object,
        }
    }

    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, VariableValue::Null)
    }

    /// Try to get as string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            VariableValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Integral value widened to i64. Dates yield their epoch millis.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            VariableValue::Short(v) => Some(i64::from(*v)),
            VariableValue::Integer(v) => Some(i64::from(*v)),
            VariableValue::Long(v) | VariableValue::Date(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric value widened to f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            VariableValue::Double(v) => Some(*v),
            VariableValue::Short(_) | VariableValue::Integer(_) | VariableValue::Long(_) => {
                self.as_i64().map(|v| v as f64)
            }
            _ => None,
        }
    }

    /// Resolve a raw JSON value into a variable value.
    ///
    /// Integral numbers become `Long`, fractional numbers `Double`. Arrays and
    /// objects have no primitive counterpart and are kept as an opaque
    /// `Object` carrying their JSON text.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => VariableValue::Null,
            serde_json::Value::Bool(b) => VariableValue::Boolean(*b),
            serde_json::Value::String(s) => VariableValue::String(s.clone()),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => VariableValue::Long(i),
                None => VariableValue::Double(n.as_f64().unwrap_or(f64::NAN)),
            },
            other => VariableValue::Object {
                type_name: "json".to_string(),
                serialized: other.to_string(),
            },
        }
    }

    /// Render this value as raw JSON.
    ///
    /// Returns `None` for kinds that have no raw JSON form (binary, file).
    pub fn to_json(&self) -> Option<serde_json::Value> {
        let json = match self {
            VariableValue::Null => serde_json::Value::Null,
            VariableValue::Boolean(b) => serde_json::Value::Bool(*b),
            VariableValue::String(s) => serde_json::Value::String(s.clone()),
            VariableValue::Short(_)
            | VariableValue::Integer(_)
            | VariableValue::Long(_)
            | VariableValue::Date(_) => serde_json::Value::from(self.as_i64()?),
            VariableValue::Double(d) => serde_json::Number::from_f64(*d)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            VariableValue::Object { serialized, .. } => serde_json::from_str(serialized).ok()?,
            VariableValue::Bytes(_) | VariableValue::File { .. } => return None,
        };
        Some(json)
    }
}

// Conversion implementations
impl From<bool> for VariableValue {
    fn from(v: bool) -> Self {
        VariableValue::Boolean(v)
    }
}

impl From<i16> for VariableValue {
    fn from(v: i16) -> Self {
        VariableValue::Short(v)
    }
}

impl From<i32> for VariableValue {
    fn from(v: i32) -> Self {
        VariableValue::Integer(v)
    }
}

impl From<i64> for VariableValue {
    fn from(v: i64) -> Self {
        VariableValue::Long(v)
    }
}

impl From<f64> for VariableValue {
    fn from(v: f64) -> Self {
        VariableValue::Double(v)
    }
}

impl From<String> for VariableValue {
    fn from(v: String) -> Self {
        VariableValue::String(v)
    }
}

impl From<&str> for VariableValue {
    fn from(v: &str) -> Self {
        VariableValue::String(v.to_string())
    }
}

impl From<Vec<u8>> for VariableValue {
    fn from(v: Vec<u8>) -> Self {
        VariableValue::Bytes(v)
    }
}

impl<T: Into<VariableValue>> From<Option<T>> for VariableValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(VariableValue::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_primitive() {
        assert!(VariableValue::Null.kind().is_primitive());
        assert!(VariableValue::from("x").kind().is_primitive());
        assert!(!VariableValue::Bytes(vec![1]).kind().is_primitive());
        assert!(!VariableValue::Object {
            type_name: "x".into(),
            serialized: "{}".into()
        }
        .kind()
        .is_primitive());
    }

    #[test]
    fn test_from_json() {
        assert_eq!(VariableValue::from_json(&json!(null)), VariableValue::Null);
        assert_eq!(VariableValue::from_json(&json!(true)), VariableValue::Boolean(true));
        assert_eq!(VariableValue::from_json(&json!(42)), VariableValue::Long(42));
        assert_eq!(VariableValue::from_json(&json!(1.5)), VariableValue::Double(1.5));
        assert_eq!(VariableValue::from_json(&json!("a")), VariableValue::from("a"));
        assert_eq!(VariableValue::from_json(&json!([1, 2])).kind(), ValueKind::Object);
    }

    #[test]
    fn test_to_json() {
        assert_eq!(VariableValue::Integer(7).to_json(), Some(json!(7)));
        assert_eq!(VariableValue::Bytes(vec![1]).to_json(), None);
        assert_eq!(VariableValue::from_json(&json!({"a": 1})).to_json(), Some(json!({"a": 1})));
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("Long".parse::<ValueKind>().unwrap(), ValueKind::Long);
        assert!("decimal".parse::<ValueKind>().is_err());
    }

    #[test]
    fn test_numeric_widening() {
        assert_eq!(VariableValue::Short(3).as_i64(), Some(3));
        assert_eq!(VariableValue::Integer(3).as_f64(), Some(3.0));
        assert_eq!(VariableValue::Date(10).as_f64(), None);
    }
}
