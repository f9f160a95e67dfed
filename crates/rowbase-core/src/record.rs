//! In-memory representation of one persisted row.
//!
//! A `Record` is a flat column-to-value mapping plus an `id` slot. The id is
//! absent until the backend assigns one on insert and is immutable from then
//! on; it is kept out of the ordinary field map so nothing can overwrite it.
//! Field iteration is sorted by column name, which keeps generated SQL
//! stable.

use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One row's worth of in-memory state.
///
/// Serializes to the flat wire shape: the id (when assigned) and the fields
/// in a single JSON object, scalars only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<i64>,
    #[serde(flatten)]
    fields: BTreeMap<String, Value>,
}

impl Record {
    /// Create an empty record with no id.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from column/value pairs.
    ///
    /// An `id` pair is routed through [`Record::set`], so it lands in the id
    /// slot rather than the field map.
    pub fn from_fields<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut record = Self::new();
        for (column, value) in pairs {
            record.set(column, value);
        }
        record
    }

    /// The backend-assigned id, if this record has been persisted.
    pub fn id(&self) -> Option<i64> {
        self.id
    }

    /// Assign the backend id. Only the first assignment takes effect; the id
    /// is immutable afterwards.
    pub fn assign_id(&mut self, id: i64) {
        if self.id.is_none() {
            self.id = Some(id);
        }
    }

    /// Set a field. The column name `id` is special: an integer value is
    /// routed to [`Record::assign_id`] and anything else is dropped, so the
    /// field map never shadows the id slot.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        let column = column.into();
        let value = value.into();
        if column == "id" {
            if let Value::Int(id) = value {
                self.assign_id(id);
            }
            return;
        }
        self.fields.insert(column, value);
    }

    /// Builder-style [`Record::set`].
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(column, value);
        self
    }

    /// Look up a field. The id is not a field; use [`Record::id`].
    pub fn field(&self, column: &str) -> Option<&Value> {
        self.fields.get(column)
    }

    /// Look up a field and convert it to a concrete Rust type.
    pub fn get_as<T>(&self, column: &str) -> crate::Result<T>
    where
        T: TryFrom<Value, Error = crate::error::TypeError>,
    {
        let value = self.fields.get(column).cloned().unwrap_or(Value::Null);
        T::try_from(value).map_err(|mut e| {
            e.column = Some(column.to_string());
            e.into()
        })
    }

    /// Remove a field, returning its previous value. The id cannot be
    /// removed.
    pub fn remove(&mut self, column: &str) -> Option<Value> {
        if column == "id" {
            return None;
        }
        self.fields.remove(column)
    }

    /// True if the column is present, counting an assigned id.
    pub fn contains(&self, column: &str) -> bool {
        if column == "id" {
            return self.id.is_some();
        }
        self.fields.contains_key(column)
    }

    /// Iterate fields in sorted column order. The id slot is not included.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of fields, excluding the id slot.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True if the record has no fields (it may still have an id).
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
