//! Scalar values exchanged with the storage backend.
//!
//! The backend is SQLite, so `Value` covers its five storage classes plus a
//! boolean, which SQLite itself stores as an integer 0/1. Records are flat
//! maps of column name to `Value`; nothing nested ever crosses the wire.

use crate::error::TypeError;
use serde::{Deserialize, Serialize};

/// A single scalar cell.
///
/// Serializes untagged, so a record's JSON form is the plain wire shape
/// (`"Ann"`, `42`, `true`, `null`) rather than an enum encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// SQL NULL
    Null,
    /// Boolean (stored as INTEGER 0/1 by the backend)
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// 8-byte IEEE floating point
    Real(f64),
    /// UTF-8 string
    Text(String),
    /// Binary data
    Bytes(Vec<u8>),
}

impl Value {
    /// Check if this value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Human-readable name of the value's type, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Real(_) => "real",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
        }
    }

    /// SQLite column affinity for this value, used when a column is first
    /// created from a record field. NULL carries no affinity.
    pub fn affinity(&self) -> Option<&'static str> {
        match self {
            Value::Null => None,
            Value::Bool(_) | Value::Int(_) => Some("INTEGER"),
            Value::Real(_) => Some("REAL"),
            Value::Text(_) => Some("TEXT"),
            Value::Bytes(_) => Some("BLOB"),
        }
    }

    /// Extract a boolean. Accepts INTEGER 0/1 since that is how the backend
    /// round-trips booleans.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Int(0) => Some(false),
            Value::Int(1) => Some(true),
            _ => None,
        }
    }

    /// Extract an integer.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    /// Extract a float. Integers widen, since SQLite may hand back an
    /// INTEGER for a column that elsewhere holds REALs.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Real(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Borrow the string contents.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow the binary contents.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Convert to the JSON wire shape: string/number/boolean/null.
    ///
    /// Bytes have no JSON scalar form and are rendered as a lowercase hex
    /// string; non-finite floats become null, which is what `serde_json`
    /// would do anyway.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(v) => serde_json::Value::Number((*v).into()),
            Value::Real(v) => serde_json::Number::from_f64(*v)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::Bytes(b) => {
                let mut s = String::with_capacity(b.len() * 2);
                for byte in b {
                    s.push_str(&format!("{:02x}", byte));
                }
                serde_json::Value::String(s)
            }
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl TryFrom<Value> for bool {
    type Error = TypeError;

    fn try_from(v: Value) -> Result<Self, Self::Error> {
        v.as_bool().ok_or_else(|| TypeError {
            expected: "bool",
            actual: v.type_name().to_string(),
            column: None,
        })
    }
}

impl TryFrom<Value> for i64 {
    type Error = TypeError;

    fn try_from(v: Value) -> Result<Self, Self::Error> {
        v.as_i64().ok_or_else(|| TypeError {
            expected: "int",
            actual: v.type_name().to_string(),
            column: None,
        })
    }
}

impl TryFrom<Value> for f64 {
    type Error = TypeError;

    fn try_from(v: Value) -> Result<Self, Self::Error> {
        v.as_f64().ok_or_else(|| TypeError {
            expected: "real",
            actual: v.type_name().to_string(),
            column: None,
        })
    }
}

impl TryFrom<Value> for String {
    type Error = TypeError;

    fn try_from(v: Value) -> Result<Self, Self::Error> {
        match v {
            Value::Text(s) => Ok(s),
            other => Err(TypeError {
                expected: "text",
                actual: other.type_name().to_string(),
                column: None,
            }),
        }
    }
}

impl TryFrom<Value> for Vec<u8> {
    type Error = TypeError;

    fn try_from(v: Value) -> Result<Self, Self::Error> {
        match v {
            Value::Bytes(b) => Ok(b),
            other => Err(TypeError {
                expected: "bytes",
                actual: other.type_name().to_string(),
                column: None,
            }),
        }
    }
}

impl TryFrom<serde_json::Value> for Value {
    type Error = TypeError;

    /// Accepts only the scalar wire shape; arrays and objects are rejected.
    fn try_from(v: serde_json::Value) -> Result<Self, Self::Error> {
        match v {
            serde_json::Value::Null => Ok(Value::Null),
            serde_json::Value::Bool(b) => Ok(Value::Bool(b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Value::Int(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(Value::Real(f))
                } else {
                    Err(TypeError {
                        expected: "scalar number",
                        actual: n.to_string(),
                        column: None,
                    })
                }
            }
            serde_json::Value::String(s) => Ok(Value::Text(s)),
            serde_json::Value::Array(_) => Err(TypeError {
                expected: "scalar",
                actual: "array".to_string(),
                column: None,
            }),
            serde_json::Value::Object(_) => Err(TypeError {
                expected: "scalar",
                actual: "object".to_string(),
                column: None,
            }),
        }
    }
}
