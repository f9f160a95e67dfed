//! Read-side machinery: query options, predicate handling, and the lazy
//! result iterator.
//!
//! Predicates are plain records: every field is an equality filter. Two
//! reserved keys, `_orderBy` and `_reverse`, are control parameters carried
//! in the predicate for callers that cannot pass [`FindOptions`]; they are
//! stripped before the predicate reaches the backend.

use std::sync::{Arc, RwLock};

use rowbase_core::{Record, Result, Row, Value, quote_ident};

use crate::registry::{InUseRegistry, RecordHandle, RecordKey};

/// Predicate key naming the sort column.
pub const ORDER_BY_KEY: &str = "_orderBy";
/// Predicate key requesting descending order.
pub const REVERSE_KEY: &str = "_reverse";

/// Options for the read paths.
///
/// `order_by` names the field to sort on; `reverse` flips the direction.
/// `reverse` without `order_by` sorts by descending id. The default is
/// backend natural order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindOptions {
    /// Field to sort by.
    pub order_by: Option<String>,
    /// Sort descending instead of ascending.
    pub reverse: bool,
}

impl FindOptions {
    /// Options requesting backend natural order.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sort by `column`.
    pub fn order_by(mut self, column: impl Into<String>) -> Self {
        self.order_by = Some(column.into());
        self
    }

    /// Flip the sort direction.
    pub fn reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }
}

/// Splits control keys out of `predicate` and folds them into `options`.
///
/// The reserved keys are stripped unconditionally; their values only fill
/// what `options` left unset, so the options struct wins when both are
/// given. An id assigned on the predicate becomes an id filter. Remaining
/// fields become equality filters in sorted column order.
pub(crate) fn split_predicate(
    predicate: &Record,
    options: FindOptions,
) -> (Vec<(String, Value)>, FindOptions) {
    let mut filters = Vec::new();
    let mut options = options;

    if let Some(id) = predicate.id() {
        filters.push(("id".to_string(), Value::Int(id)));
    }
    for (name, value) in predicate.fields() {
        match name {
            ORDER_BY_KEY => {
                if options.order_by.is_none() {
                    if let Value::Text(column) = value {
                        options.order_by = Some(column.clone());
                    }
                }
            }
            REVERSE_KEY => {
                if !options.reverse {
                    options.reverse = match value {
                        Value::Bool(reverse) => *reverse,
                        Value::Int(flag) => *flag != 0,
                        _ => false,
                    };
                }
            }
            _ => filters.push((name.to_string(), value.clone())),
        }
    }

    (filters, options)
}

/// Builds the SELECT for `table`, returning the SQL and its bind values.
///
/// Null filter values compare with `IS NULL` since `= NULL` matches nothing.
pub(crate) fn select_sql(
    table: &str,
    filters: &[(String, Value)],
    options: &FindOptions,
    limit_one: bool,
) -> (String, Vec<Value>) {
    let mut sql = format!("SELECT * FROM {}", quote_ident(table));
    let mut params = Vec::new();

    if !filters.is_empty() {
        let mut clauses = Vec::with_capacity(filters.len());
        for (column, value) in filters {
            if value.is_null() {
                clauses.push(format!("{} IS NULL", quote_ident(column)));
            } else {
                clauses.push(format!("{} = ?", quote_ident(column)));
                params.push(value.clone());
            }
        }
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }

    match (&options.order_by, options.reverse) {
        (Some(column), reverse) => {
            let direction = if reverse { "DESC" } else { "ASC" };
            sql.push_str(&format!(" ORDER BY {} {}", quote_ident(column), direction));
        }
        (None, true) => {
            sql.push_str(&format!(" ORDER BY {} DESC", quote_ident("id")));
        }
        (None, false) => {}
    }

    if limit_one {
        sql.push_str(" LIMIT 1");
    }

    (sql, params)
}

/// Splits a backend row into its id and a record holding the other columns.
pub(crate) fn row_to_record(row: &Row) -> Result<(i64, Record)> {
    let id = row.get_as::<i64>("id")?;
    let mut record = Record::new();
    record.assign_id(id);
    for (name, value) in row.iter() {
        if name == "id" {
            continue;
        }
        record.set(name, value.clone());
    }
    Ok((id, record))
}

/// Returns the live handle for (table, id), registering `record` as the new
/// live instance only when none exists.
///
/// A key that is already live keeps its instance and the fresh row data is
/// discarded; the in-memory state is the current truth for a live record.
pub(crate) fn adopt(
    registry: &InUseRegistry,
    table: &str,
    id: i64,
    record: Record,
) -> RecordHandle {
    let key = RecordKey::new(table, id);
    if let Some(existing) = registry.get(&key) {
        return existing;
    }
    let handle: RecordHandle = Arc::new(RwLock::new(record));
    registry.register(key, Arc::clone(&handle));
    handle
}

/// One-shot iterator over a query's result snapshot.
///
/// The rows were read eagerly; each is adopted as it is produced, so a key
/// that is already live yields the existing handle and anything else is
/// wrapped and registered at that point. Dropping the iterator leaves the
/// remaining rows unadopted. Restarting means issuing a new query.
#[derive(Debug)]
pub struct FindAll<'a> {
    table: String,
    rows: std::vec::IntoIter<Row>,
    registry: &'a InUseRegistry,
}

impl<'a> FindAll<'a> {
    pub(crate) fn new(table: impl Into<String>, rows: Vec<Row>, registry: &'a InUseRegistry) -> Self {
        Self {
            table: table.into(),
            rows: rows.into_iter(),
            registry,
        }
    }

    /// Rows not yet produced.
    pub fn remaining(&self) -> usize {
        self.rows.len()
    }
}

impl Iterator for FindAll<'_> {
    type Item = Result<RecordHandle>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.rows.next()?;
        Some(
            row_to_record(&row)
                .map(|(id, record)| adopt(self.registry, &self.table, id, record)),
        )
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.rows.len();
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for FindAll<'_> {}
