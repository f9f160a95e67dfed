//! The store: one shared context owning the connection, both registries,
//! and the write lock.
//!
//! Every backend mutation goes through [`Store`] and serializes on its one
//! mutex, so at most one mutation is in flight process-wide no matter how
//! many threads hold the store. Reads flush first, then query without
//! holding the write lock.

use std::fmt;
use std::sync::{Arc, Mutex, RwLock};

use rowbase_core::{Error, Record, RecordError, RecordErrorKind, Result, Value, quote_ident};
use rowbase_sqlite::SqliteConfig;

use crate::find::{self, FindAll, FindOptions};
use crate::manager::ConnectionManager;
use crate::registry::{InUseRegistry, RecordHandle, RecordKey};
use crate::schema;
use crate::tombstone::TombstoneRegistry;

/// Shared context for every record operation.
///
/// Construct one per database and share it across threads behind an `Arc`.
/// The write lock serializes backend mutations; the registries keep live
/// records unique per (table, id) and remember deletes until the next
/// commit attempt. Any operation that touches the backend may block on the
/// write lock indefinitely; nothing here times out or cancels.
pub struct Store {
    manager: ConnectionManager,
    registry: InUseRegistry,
    tombstones: TombstoneRegistry,
    write_lock: Mutex<()>,
}

/// Debug information about store state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreDebugInfo {
    /// Live registered records.
    pub live_records: usize,
    /// Tombstones waiting to be consumed.
    pub pending_tombstones: usize,
    /// Whether the backend connection is open.
    pub connected: bool,
}

impl Store {
    /// Creates a store over the given connection config.
    ///
    /// The connection opens lazily on first use.
    #[must_use]
    pub fn new(config: SqliteConfig) -> Self {
        Self {
            manager: ConnectionManager::new(config),
            registry: InUseRegistry::new(),
            tombstones: TombstoneRegistry::new(),
            write_lock: Mutex::new(()),
        }
    }

    /// Creates a store from an optional location string.
    ///
    /// `None` selects `rowbase.db` in the platform temp directory; see
    /// [`SqliteConfig::from_uri`].
    #[must_use]
    pub fn from_uri(uri: Option<&str>) -> Self {
        Self::new(SqliteConfig::from_uri(uri))
    }

    /// Creates a store over an in-memory database.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(SqliteConfig::memory())
    }

    /// The connection manager, for reconfiguration.
    pub fn manager(&self) -> &ConnectionManager {
        &self.manager
    }

    /// Snapshot of the store's internal counters.
    pub fn debug_info(&self) -> StoreDebugInfo {
        StoreDebugInfo {
            live_records: self.registry.len(),
            pending_tombstones: self.tombstones.len(),
            connected: self.manager.is_connected(),
        }
    }

    /// Inserts a new record into `table` and returns its live handle.
    ///
    /// Ids are backend-assigned: a record that already carries one is
    /// rejected before anything is written. The table is created or widened
    /// to fit the record, the row is inserted under the write lock, and the
    /// handle is registered as the live instance for its new key once the
    /// lock is released. A failed insert propagates the backend error and
    /// registers nothing.
    #[tracing::instrument(level = "debug", skip(self, record))]
    pub fn insert(&self, table: &str, record: Record) -> Result<RecordHandle> {
        if let Some(id) = record.id() {
            return Err(Error::Record(RecordError {
                kind: RecordErrorKind::ClientSuppliedId,
                message: format!(
                    "Cannot insert into '{}': record already has id {}; ids are backend-assigned",
                    table, id
                ),
            }));
        }

        let conn = self.manager.connect()?;
        let id = {
            let _guard = self.write_lock.lock().unwrap();
            schema::ensure_table(&conn, table, &record)?;
            let (sql, params) = insert_sql(table, &record);
            conn.insert(&sql, &params)?
        };

        let mut record = record;
        record.assign_id(id);
        tracing::debug!(table = table, id = id, "Inserted record");

        let handle: RecordHandle = Arc::new(RwLock::new(record));
        self.registry
            .register(RecordKey::new(table, id), Arc::clone(&handle));
        Ok(handle)
    }

    /// Writes a record back and releases it from the live registry.
    ///
    /// The registry entry is removed first, then the tombstone check runs:
    /// a record deleted since its last commit attempt consumes its tombstone
    /// and skips the write, so a stale handle cannot resurrect the row.
    /// Otherwise the record's full field set is upserted by id under the
    /// write lock. Committing an unchanged record twice performs two
    /// identical upserts. A failed upsert still leaves the record released
    /// and surfaces the backend error.
    #[tracing::instrument(level = "debug", skip(self, handle))]
    pub fn commit(&self, table: &str, handle: &RecordHandle) -> Result<()> {
        let record = handle.read().unwrap().clone();
        let Some(id) = record.id() else {
            return Err(Error::Record(RecordError {
                kind: RecordErrorKind::MissingId,
                message: format!(
                    "Cannot commit to '{}': record has no id; insert it first",
                    table
                ),
            }));
        };

        let key = RecordKey::new(table, id);
        self.registry.unregister(&key);

        if self.tombstones.consume(&key) {
            tracing::debug!(table = table, id = id, "Skipped commit of a deleted record");
            return Ok(());
        }

        let conn = self.manager.connect()?;
        {
            let _guard = self.write_lock.lock().unwrap();
            schema::ensure_table(&conn, table, &record)?;
            let (sql, params) = upsert_sql(table, &record, id);
            conn.execute(&sql, &params)?;
        }
        tracing::debug!(table = table, id = id, "Committed record");
        Ok(())
    }

    /// Deletes a record's backend row and remembers the delete.
    ///
    /// Every live record is flushed first so no pending write is lost. The
    /// row is then deleted by id under the write lock. On success the key
    /// is tombstoned and the record leaves the registry; on failure the
    /// record stays registered, no tombstone is marked, and the backend
    /// error propagates.
    #[tracing::instrument(level = "debug", skip(self, handle))]
    pub fn delete(&self, table: &str, handle: &RecordHandle) -> Result<()> {
        let Some(id) = handle.read().unwrap().id() else {
            return Err(Error::Record(RecordError {
                kind: RecordErrorKind::MissingId,
                message: format!(
                    "Cannot delete from '{}': record has no id; it was never inserted",
                    table
                ),
            }));
        };

        self.flush_all()?;

        let conn = self.manager.connect()?;
        {
            let _guard = self.write_lock.lock().unwrap();
            let sql = format!(
                "DELETE FROM {} WHERE {} = ?",
                quote_ident(table),
                quote_ident("id")
            );
            conn.execute(&sql, &[Value::Int(id)])?;
        }

        let key = RecordKey::new(table, id);
        self.tombstones.mark(key.clone());
        self.registry.unregister(&key);
        tracing::debug!(table = table, id = id, "Deleted record");
        Ok(())
    }

    /// Drops `table` and everything the store remembers about it.
    ///
    /// Live records are flushed first so the drop cannot swallow a pending
    /// write silently. Records of the dropped table are then released so a
    /// later commit cannot recreate it, and the table's tombstones go with
    /// them so a record inserted after the drop starts clean.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn drop_table(&self, table: &str) -> Result<()> {
        self.flush_all()?;

        let conn = self.manager.connect()?;
        {
            let _guard = self.write_lock.lock().unwrap();
            let sql = format!("DROP TABLE IF EXISTS {}", quote_ident(table));
            conn.execute_raw(&sql)?;
        }

        let keys = self.registry.keys_for_table(table);
        let released = keys.len();
        for key in &keys {
            self.registry.unregister(key);
        }
        self.tombstones.clear_table(table);
        tracing::debug!(table = table, released = released, "Dropped table");
        Ok(())
    }

    /// Writes every live record's current state back to the backend.
    ///
    /// The consistency barrier for reads and deletes. Works from a registry
    /// snapshot, acquiring and releasing the write lock once per record, and
    /// releases nothing: the records stay live so repeated lookups keep
    /// returning the same instances. Tombstones are left alone; only an
    /// explicit commit consumes them. The first backend failure aborts the
    /// flush and propagates.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn flush_all(&self) -> Result<()> {
        let live = self.registry.all();
        if live.is_empty() {
            return Ok(());
        }

        let conn = self.manager.connect()?;
        for (key, handle) in &live {
            let record = handle.read().unwrap().clone();
            {
                let _guard = self.write_lock.lock().unwrap();
                schema::ensure_table(&conn, &key.table, &record)?;
                // The key is the identity; the record's own id slot is not
                // consulted here.
                let (sql, params) = upsert_sql(&key.table, &record, key.id);
                conn.execute(&sql, &params)?;
            }
        }
        tracing::debug!(count = live.len(), "Flushed live records");
        Ok(())
    }

    /// Finds the first record matching `predicate`, reusing the live
    /// instance when one exists.
    ///
    /// Live records are flushed first so the query observes every in-memory
    /// edit. A missing table reads as no match, not an error, and a miss
    /// registers nothing. The predicate's fields are equality filters; an
    /// assigned id filters by id; the reserved [`ORDER_BY_KEY`] and
    /// [`REVERSE_KEY`] entries are stripped and applied as options.
    ///
    /// [`ORDER_BY_KEY`]: crate::find::ORDER_BY_KEY
    /// [`REVERSE_KEY`]: crate::find::REVERSE_KEY
    pub fn find_one(&self, table: &str, predicate: &Record) -> Result<Option<RecordHandle>> {
        self.find_one_with(table, predicate, FindOptions::new())
    }

    /// [`find_one`](Self::find_one) with explicit options.
    ///
    /// Options given here win over reserved predicate keys.
    #[tracing::instrument(level = "debug", skip(self, predicate))]
    pub fn find_one_with(
        &self,
        table: &str,
        predicate: &Record,
        options: FindOptions,
    ) -> Result<Option<RecordHandle>> {
        self.flush_all()?;

        let conn = self.manager.connect()?;
        if !schema::table_exists(&conn, table)? {
            return Ok(None);
        }

        let (filters, options) = find::split_predicate(predicate, options);
        let (sql, params) = find::select_sql(table, &filters, &options, true);
        tracing::trace!(sql = %sql, "Querying one row");
        match conn.query_one(&sql, &params)? {
            Some(row) => {
                let (id, record) = find::row_to_record(&row)?;
                Ok(Some(find::adopt(&self.registry, table, id, record)))
            }
            None => Ok(None),
        }
    }

    /// Finds every record matching `predicate` as a lazy one-shot iterator.
    ///
    /// Live records are flushed once up front, then the backend rows are
    /// read eagerly as the snapshot the iterator walks. Each row is adopted
    /// into the registry as it is produced; see [`FindAll`]. A missing
    /// table yields an empty iterator.
    pub fn find_all(&self, table: &str, predicate: &Record) -> Result<FindAll<'_>> {
        self.find_all_with(table, predicate, FindOptions::new())
    }

    /// [`find_all`](Self::find_all) with explicit options.
    ///
    /// Options given here win over reserved predicate keys.
    #[tracing::instrument(level = "debug", skip(self, predicate))]
    pub fn find_all_with(
        &self,
        table: &str,
        predicate: &Record,
        options: FindOptions,
    ) -> Result<FindAll<'_>> {
        self.flush_all()?;

        let conn = self.manager.connect()?;
        if !schema::table_exists(&conn, table)? {
            return Ok(FindAll::new(table, Vec::new(), &self.registry));
        }

        let (filters, options) = find::split_predicate(predicate, options);
        let (sql, params) = find::select_sql(table, &filters, &options, false);
        tracing::trace!(sql = %sql, "Querying all rows");
        let rows = conn.query(&sql, &params)?;
        tracing::debug!(table = table, count = rows.len(), "Query matched rows");
        Ok(FindAll::new(table, rows, &self.registry))
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("path", &self.manager.path())
            .field("live_records", &self.registry.len())
            .field("pending_tombstones", &self.tombstones.len())
            .finish_non_exhaustive()
    }
}

/// Builds the INSERT for a record's fields. A record with no fields inserts
/// a bare row so the backend still assigns an id.
fn insert_sql(table: &str, record: &Record) -> (String, Vec<Value>) {
    let mut columns = Vec::with_capacity(record.len());
    let mut params = Vec::with_capacity(record.len());
    for (name, value) in record.fields() {
        columns.push(quote_ident(name));
        params.push(value.clone());
    }

    if columns.is_empty() {
        return (
            format!("INSERT INTO {} DEFAULT VALUES", quote_ident(table)),
            params,
        );
    }

    let placeholders = vec!["?"; columns.len()].join(", ");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(table),
        columns.join(", "),
        placeholders
    );
    (sql, params)
}

/// Builds the upsert writing a record's full field set keyed by id.
fn upsert_sql(table: &str, record: &Record, id: i64) -> (String, Vec<Value>) {
    let mut columns = vec![quote_ident("id")];
    let mut params = vec![Value::Int(id)];
    let mut updates = Vec::with_capacity(record.len());
    for (name, value) in record.fields() {
        columns.push(quote_ident(name));
        params.push(value.clone());
        updates.push(format!("{0} = excluded.{0}", quote_ident(name)));
    }

    let placeholders = vec!["?"; columns.len()].join(", ");
    let mut sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(table),
        columns.join(", "),
        placeholders
    );
    if updates.is_empty() {
        sql.push_str(&format!(" ON CONFLICT({}) DO NOTHING", quote_ident("id")));
    } else {
        sql.push_str(&format!(
            " ON CONFLICT({}) DO UPDATE SET {}",
            quote_ident("id"),
            updates.join(", ")
        ));
    }
    (sql, params)
}
