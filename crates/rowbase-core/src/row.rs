//! Query result rows.
//!
//! One `Row` holds the values of a single result row. Column metadata is
//! shared across all rows of a result set through an `Arc`, so a large
//! result pays for its column names once.

use crate::error::{Result, TypeError};
use crate::value::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Column metadata for a result set.
#[derive(Debug, Clone, Default)]
pub struct ColumnInfo {
    names: Vec<String>,
    name_to_index: HashMap<String, usize>,
}

impl ColumnInfo {
    /// Build column metadata from column names in result order.
    pub fn new(names: Vec<String>) -> Self {
        let name_to_index = names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.clone(), i))
            .collect();
        Self {
            names,
            name_to_index,
        }
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True if the result set has no columns.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Column name at an index.
    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Index of a named column.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.name_to_index.get(name).copied()
    }

    /// All column names in result order.
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// One result row.
#[derive(Debug, Clone)]
pub struct Row {
    values: Vec<Value>,
    columns: Arc<ColumnInfo>,
}

impl Row {
    /// Create a row from values and shared column metadata.
    pub fn new(values: Vec<Value>, columns: Arc<ColumnInfo>) -> Self {
        Self { values, columns }
    }

    /// Value at a column index.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Value of a named column.
    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        self.columns.index_of(name).and_then(|i| self.values.get(i))
    }

    /// Named column converted to a concrete Rust type.
    pub fn get_as<T: FromValue>(&self, name: &str) -> Result<T> {
        let value = self.get_by_name(name).unwrap_or(&Value::Null);
        T::from_value(value).map_err(|mut e| {
            e.column = Some(name.to_string());
            e.into()
        })
    }

    /// Column metadata shared by this row's result set.
    pub fn columns(&self) -> &ColumnInfo {
        &self.columns
    }

    /// Number of values in the row.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if the row holds no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate (column name, value) pairs in result order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns
            .names()
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    /// Consume the row, returning its values in result order.
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

/// Conversion from a borrowed `Value` into a concrete Rust type.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> std::result::Result<Self, TypeError>;
}

impl FromValue for Value {
    fn from_value(value: &Value) -> std::result::Result<Self, TypeError> {
        Ok(value.clone())
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> std::result::Result<Self, TypeError> {
        value.as_bool().ok_or_else(|| TypeError {
            expected: "bool",
            actual: value.type_name().to_string(),
            column: None,
        })
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> std::result::Result<Self, TypeError> {
        value.as_i64().ok_or_else(|| TypeError {
            expected: "int",
            actual: value.type_name().to_string(),
            column: None,
        })
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> std::result::Result<Self, TypeError> {
        value.as_f64().ok_or_else(|| TypeError {
            expected: "real",
            actual: value.type_name().to_string(),
            column: None,
        })
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> std::result::Result<Self, TypeError> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| TypeError {
                expected: "text",
                actual: value.type_name().to_string(),
                column: None,
            })
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &Value) -> std::result::Result<Self, TypeError> {
        value
            .as_bytes()
            .map(<[u8]>::to_vec)
            .ok_or_else(|| TypeError {
                expected: "bytes",
                actual: value.type_name().to_string(),
                column: None,
            })
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> std::result::Result<Self, TypeError> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_value(value).map(Some)
        }
    }
}
