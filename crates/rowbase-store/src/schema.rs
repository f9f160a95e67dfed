//! On-demand schema upkeep.
//!
//! Tables carry no declared schema. Before any insert or upsert the store
//! makes sure the target table exists and has a column for every field on
//! the record, creating or widening it as needed.

use std::collections::HashSet;

use rowbase_core::{Record, Result, Value, quote_ident};
use rowbase_sqlite::SqliteConnection;

/// Returns `true` if `table` exists in the database.
pub fn table_exists(conn: &SqliteConnection, table: &str) -> Result<bool> {
    let row = conn.query_one(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?",
        &[Value::from(table)],
    )?;
    Ok(row.is_some())
}

/// Names of the columns `table` currently has.
pub fn table_columns(conn: &SqliteConnection, table: &str) -> Result<HashSet<String>> {
    // PRAGMA arguments cannot be bound, so the identifier is quoted inline.
    let sql = format!("PRAGMA table_info({})", quote_ident(table));
    let rows = conn.query(&sql, &[])?;
    let mut columns = HashSet::with_capacity(rows.len());
    for row in &rows {
        columns.insert(row.get_as::<String>("name")?);
    }
    Ok(columns)
}

/// Creates `table` if missing and adds any column `record` carries that the
/// table lacks.
///
/// Runs under the store's write lock before every insert and upsert, so a
/// record that gained fields in memory writes back cleanly. The `id` column
/// is the backend-assigned integer primary key; field columns are typed by
/// their value's SQLite affinity, with null-valued fields declared bare.
#[tracing::instrument(level = "debug", skip(conn, record))]
pub fn ensure_table(conn: &SqliteConnection, table: &str, record: &Record) -> Result<()> {
    if !table_exists(conn, table)? {
        let mut defs = vec![format!(
            "{} INTEGER PRIMARY KEY AUTOINCREMENT",
            quote_ident("id")
        )];
        for (name, value) in record.fields() {
            defs.push(column_def(name, value));
        }
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            quote_ident(table),
            defs.join(", ")
        );
        conn.execute_raw(&sql)?;
        tracing::debug!(table = table, columns = record.len() + 1, "Created table");
        return Ok(());
    }

    let existing = table_columns(conn, table)?;
    for (name, value) in record.fields() {
        if existing.contains(name) {
            continue;
        }
        let sql = format!(
            "ALTER TABLE {} ADD COLUMN {}",
            quote_ident(table),
            column_def(name, value)
        );
        conn.execute_raw(&sql)?;
        tracing::debug!(table = table, column = name, "Added column");
    }
    Ok(())
}

fn column_def(name: &str, value: &Value) -> String {
    match value.affinity() {
        Some(affinity) => format!("{} {}", quote_ident(name), affinity),
        None => quote_ident(name),
    }
}
