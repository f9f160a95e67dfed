//! Synchronous SQLite connection.
//!
//! Safe wrapper around a single sqlite3 handle. Every call locks an
//! internal mutex, and the handle itself is opened in serialized mode,
//! so one connection can be shared freely across threads.

// FFI code needs casts that match C types exactly
#![allow(clippy::cast_possible_truncation)]

use crate::ffi;
use crate::types;
use rowbase_core::{
    BackendError, BackendErrorKind, ColumnInfo, ConfigError, Error, Result, Row, Value,
};
use std::ffi::{CStr, CString, c_int};
use std::ptr;
use std::sync::{Arc, Mutex};

/// Configuration for opening SQLite connections.
#[derive(Debug, Clone)]
pub struct SqliteConfig {
    /// Path to the database file, or ":memory:" for an in-memory database.
    pub path: String,
    /// Open flags (read-only, read-write, create, etc.)
    pub flags: OpenFlags,
    /// Busy timeout in milliseconds.
    pub busy_timeout_ms: u32,
}

/// Flags controlling how the database is opened.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenFlags {
    /// Open for reading only.
    pub read_only: bool,
    /// Open for reading and writing.
    pub read_write: bool,
    /// Create the database if it doesn't exist.
    pub create: bool,
    /// Enable URI filename interpretation.
    pub uri: bool,
    /// Open in multi-thread mode (handle not shared between threads).
    pub no_mutex: bool,
    /// Open in serialized mode (handle can be shared).
    pub full_mutex: bool,
}

impl OpenFlags {
    /// Flags for read-only access.
    pub fn read_only() -> Self {
        Self {
            read_only: true,
            ..Self::default()
        }
    }

    /// Flags for read-write access with creation if needed.
    ///
    /// Serialized mode is included because these handles are built to be
    /// shared across caller threads.
    pub fn create_read_write() -> Self {
        Self {
            read_write: true,
            create: true,
            full_mutex: true,
            ..Self::default()
        }
    }

    fn to_sqlite_flags(self) -> c_int {
        let mut flags = 0;

        if self.read_only {
            flags |= ffi::SQLITE_OPEN_READONLY;
        }
        if self.read_write {
            flags |= ffi::SQLITE_OPEN_READWRITE;
        }
        if self.create {
            flags |= ffi::SQLITE_OPEN_CREATE;
        }
        if self.uri {
            flags |= ffi::SQLITE_OPEN_URI;
        }
        if self.no_mutex {
            flags |= ffi::SQLITE_OPEN_NOMUTEX;
        }
        if self.full_mutex {
            flags |= ffi::SQLITE_OPEN_FULLMUTEX;
        }

        // Default to read-write if no mode specified
        if flags & (ffi::SQLITE_OPEN_READONLY | ffi::SQLITE_OPEN_READWRITE) == 0 {
            flags |= ffi::SQLITE_OPEN_READWRITE | ffi::SQLITE_OPEN_CREATE;
        }

        flags
    }
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: ":memory:".to_string(),
            flags: OpenFlags::create_read_write(),
            busy_timeout_ms: 5000,
        }
    }
}

impl SqliteConfig {
    /// Create a new config for a file-based database.
    pub fn file(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Create a new config for an in-memory database.
    pub fn memory() -> Self {
        Self::default()
    }

    /// Build a config from an optional connection URI.
    ///
    /// With no URI the database lives at `rowbase.db` under the platform
    /// temporary directory. A `sqlite://` prefix is stripped, `:memory:`
    /// selects an in-memory database, and `file:` names are passed to
    /// SQLite with URI interpretation enabled.
    pub fn from_uri(uri: Option<&str>) -> Self {
        let Some(raw) = uri else {
            let path = std::env::temp_dir().join("rowbase.db");
            return Self::file(path.to_string_lossy().into_owned());
        };

        let trimmed = raw.trim();
        let rest = trimmed.strip_prefix("sqlite://").unwrap_or(trimmed);

        if rest == ":memory:" {
            return Self::memory();
        }

        let mut config = Self::file(rest);
        if rest.starts_with("file:") {
            config.flags.uri = true;
        }
        config
    }

    /// Set open flags.
    pub fn flags(mut self, flags: OpenFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Set busy timeout.
    pub fn busy_timeout(mut self, ms: u32) -> Self {
        self.busy_timeout_ms = ms;
        self
    }
}

/// Inner state of the SQLite connection, protected by a mutex.
struct SqliteInner {
    db: *mut ffi::sqlite3,
}

// SAFETY: SQLite handles can cross threads when opened in serialized mode
// or when access is otherwise synchronized. The Mutex provides that.
unsafe impl Send for SqliteInner {}

/// A connection to a SQLite database.
///
/// This is a thread-safe wrapper around one SQLite database handle.
pub struct SqliteConnection {
    inner: Mutex<SqliteInner>,
    path: String,
}

// SqliteConnection is Send + Sync because all access goes through the Mutex
unsafe impl Send for SqliteConnection {}
unsafe impl Sync for SqliteConnection {}

impl SqliteConnection {
    /// Open a new SQLite connection with the given configuration.
    ///
    /// A failed open is a configuration error: the caller gave us a
    /// location we cannot use, and nothing downstream can recover.
    pub fn open(config: &SqliteConfig) -> Result<Self> {
        let c_path = CString::new(config.path.as_str()).map_err(|_| {
            Error::Config(ConfigError {
                message: format!("Invalid database path {:?}: contains null byte", config.path),
                source: None,
            })
        })?;

        let mut db: *mut ffi::sqlite3 = ptr::null_mut();
        let flags = config.flags.to_sqlite_flags();

        // SAFETY: We pass valid pointers and check the return value
        let rc = unsafe { ffi::sqlite3_open_v2(c_path.as_ptr(), &mut db, flags, ptr::null()) };

        if rc != ffi::SQLITE_OK {
            let msg = if db.is_null() {
                ffi::error_string(rc).to_string()
            } else {
                // SAFETY: db is valid, errmsg returns a valid C string
                unsafe {
                    let err_ptr = ffi::sqlite3_errmsg(db);
                    let msg = CStr::from_ptr(err_ptr).to_string_lossy().into_owned();
                    ffi::sqlite3_close(db);
                    msg
                }
            };

            return Err(Error::Config(ConfigError {
                message: format!("Failed to open database at {}: {}", config.path, msg),
                source: None,
            }));
        }

        if config.busy_timeout_ms > 0 {
            // SAFETY: db is valid
            unsafe {
                ffi::sqlite3_busy_timeout(db, config.busy_timeout_ms as c_int);
            }
        }

        Ok(Self {
            inner: Mutex::new(SqliteInner { db }),
            path: config.path.clone(),
        })
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        Self::open(&SqliteConfig::memory())
    }

    /// Open a file-based database.
    pub fn open_file(path: impl Into<String>) -> Result<Self> {
        Self::open(&SqliteConfig::file(path))
    }

    /// Get the database path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Execute SQL directly without preparing (for DDL, etc.)
    pub fn execute_raw(&self, sql: &str) -> Result<()> {
        let inner = self.inner.lock().unwrap();
        let c_sql = sql_to_cstring(sql)?;

        let mut errmsg: *mut std::ffi::c_char = ptr::null_mut();

        // SAFETY: All pointers are valid
        let rc = unsafe {
            ffi::sqlite3_exec(inner.db, c_sql.as_ptr(), None, ptr::null_mut(), &mut errmsg)
        };

        if rc != ffi::SQLITE_OK {
            let msg = if errmsg.is_null() {
                ffi::error_string(rc).to_string()
            } else {
                // SAFETY: errmsg is valid and owned by SQLite until freed
                let msg = unsafe { CStr::from_ptr(errmsg).to_string_lossy().into_owned() };
                unsafe { ffi::sqlite3_free(errmsg.cast()) };
                msg
            };

            return Err(Error::Backend(BackendError {
                kind: error_code_to_kind(rc),
                message: msg,
                code: Some(rc),
                sql: Some(sql.to_string()),
                source: None,
            }));
        }

        Ok(())
    }

    /// Prepare and execute a query, returning all rows.
    pub fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        let inner = self.inner.lock().unwrap();
        let stmt = prepare_stmt(inner.db, sql)?;

        for (i, param) in params.iter().enumerate() {
            // SAFETY: stmt is valid, index is 1-based
            let rc = unsafe { types::bind_value(stmt, (i + 1) as c_int, param) };
            if rc != ffi::SQLITE_OK {
                // SAFETY: stmt is valid
                unsafe { ffi::sqlite3_finalize(stmt) };
                return Err(bind_error(inner.db, sql, i + 1));
            }
        }

        // SAFETY: stmt is valid
        let col_count = unsafe { ffi::sqlite3_column_count(stmt) };
        let mut names = Vec::with_capacity(col_count as usize);
        for i in 0..col_count {
            let name =
                unsafe { types::column_name(stmt, i) }.unwrap_or_else(|| format!("col{}", i));
            names.push(name);
        }
        let columns = Arc::new(ColumnInfo::new(names));

        let mut rows = Vec::new();
        loop {
            // SAFETY: stmt is valid
            let rc = unsafe { ffi::sqlite3_step(stmt) };
            match rc {
                ffi::SQLITE_ROW => {
                    let mut values = Vec::with_capacity(col_count as usize);
                    for i in 0..col_count {
                        // SAFETY: stmt is valid, we just got SQLITE_ROW
                        values.push(unsafe { types::read_column(stmt, i) });
                    }
                    rows.push(Row::new(values, Arc::clone(&columns)));
                }
                ffi::SQLITE_DONE => break,
                _ => {
                    // SAFETY: stmt is valid
                    unsafe { ffi::sqlite3_finalize(stmt) };
                    return Err(db_error(inner.db, sql));
                }
            }
        }

        // SAFETY: stmt is valid
        unsafe { ffi::sqlite3_finalize(stmt) };
        Ok(rows)
    }

    /// Run a query expected to produce at most one row.
    pub fn query_one(&self, sql: &str, params: &[Value]) -> Result<Option<Row>> {
        self.query(sql, params).map(|mut rows| rows.pop())
    }

    /// Prepare and execute a statement, returning rows affected.
    pub fn execute(&self, sql: &str, params: &[Value]) -> Result<u64> {
        let inner = self.inner.lock().unwrap();
        step_once(inner.db, sql, params)
    }

    /// Execute an INSERT and return the new rowid.
    ///
    /// The statement and the rowid read happen under one lock
    /// acquisition, so the returned id always belongs to this statement
    /// even when the connection is shared.
    pub fn insert(&self, sql: &str, params: &[Value]) -> Result<i64> {
        let inner = self.inner.lock().unwrap();
        step_once(inner.db, sql, params)?;
        // SAFETY: db is valid
        Ok(unsafe { ffi::sqlite3_last_insert_rowid(inner.db) })
    }

    /// Get the last insert rowid.
    pub fn last_insert_rowid(&self) -> i64 {
        let inner = self.inner.lock().unwrap();
        // SAFETY: db is valid
        unsafe { ffi::sqlite3_last_insert_rowid(inner.db) }
    }

    /// Get the number of rows changed by the last statement.
    pub fn changes(&self) -> i64 {
        let inner = self.inner.lock().unwrap();
        // SAFETY: db is valid
        i64::from(unsafe { ffi::sqlite3_changes(inner.db) })
    }
}

impl Drop for SqliteConnection {
    fn drop(&mut self) {
        if let Ok(inner) = self.inner.lock() {
            if !inner.db.is_null() {
                // SAFETY: db is valid
                unsafe {
                    ffi::sqlite3_close_v2(inner.db);
                }
            }
        }
    }
}

impl std::fmt::Debug for SqliteConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteConnection")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

// Helper functions

/// Bind, step once, finalize. Caller holds the connection lock.
fn step_once(db: *mut ffi::sqlite3, sql: &str, params: &[Value]) -> Result<u64> {
    let stmt = prepare_stmt(db, sql)?;

    for (i, param) in params.iter().enumerate() {
        // SAFETY: stmt is valid, index is 1-based
        let rc = unsafe { types::bind_value(stmt, (i + 1) as c_int, param) };
        if rc != ffi::SQLITE_OK {
            // SAFETY: stmt is valid
            unsafe { ffi::sqlite3_finalize(stmt) };
            return Err(bind_error(db, sql, i + 1));
        }
    }

    // SAFETY: stmt is valid
    let rc = unsafe { ffi::sqlite3_step(stmt) };
    // SAFETY: stmt is valid
    unsafe { ffi::sqlite3_finalize(stmt) };

    match rc {
        ffi::SQLITE_DONE | ffi::SQLITE_ROW => {
            // SAFETY: db is valid
            let changes = unsafe { ffi::sqlite3_changes(db) };
            Ok(changes as u64)
        }
        _ => Err(db_error(db, sql)),
    }
}

fn sql_to_cstring(sql: &str) -> Result<CString> {
    CString::new(sql).map_err(|_| {
        Error::Backend(BackendError {
            kind: BackendErrorKind::Database,
            message: "SQL contains null byte".to_string(),
            code: None,
            sql: Some(sql.to_string()),
            source: None,
        })
    })
}

fn prepare_stmt(db: *mut ffi::sqlite3, sql: &str) -> Result<*mut ffi::sqlite3_stmt> {
    let c_sql = sql_to_cstring(sql)?;
    let mut stmt: *mut ffi::sqlite3_stmt = ptr::null_mut();

    // SAFETY: All pointers are valid
    let rc = unsafe {
        ffi::sqlite3_prepare_v2(
            db,
            c_sql.as_ptr(),
            c_sql.as_bytes().len() as c_int,
            &mut stmt,
            ptr::null_mut(),
        )
    };

    if rc != ffi::SQLITE_OK {
        return Err(db_error(db, sql));
    }

    Ok(stmt)
}

/// Build a backend error from the connection's current error state.
fn db_error(db: *mut ffi::sqlite3, sql: &str) -> Error {
    // SAFETY: db is valid, errmsg returns a valid C string
    let (code, msg) = unsafe {
        let msg = CStr::from_ptr(ffi::sqlite3_errmsg(db))
            .to_string_lossy()
            .into_owned();
        (ffi::sqlite3_errcode(db), msg)
    };

    Error::Backend(BackendError {
        kind: error_code_to_kind(code),
        message: msg,
        code: Some(code),
        sql: Some(sql.to_string()),
        source: None,
    })
}

fn bind_error(db: *mut ffi::sqlite3, sql: &str, param_index: usize) -> Error {
    // SAFETY: db is valid
    let msg = unsafe {
        CStr::from_ptr(ffi::sqlite3_errmsg(db))
            .to_string_lossy()
            .into_owned()
    };

    Error::Backend(BackendError {
        kind: BackendErrorKind::Database,
        message: format!("Failed to bind parameter {}: {}", param_index, msg),
        code: None,
        sql: Some(sql.to_string()),
        source: None,
    })
}

fn error_code_to_kind(code: c_int) -> BackendErrorKind {
    match code {
        ffi::SQLITE_CONSTRAINT => BackendErrorKind::Constraint,
        ffi::SQLITE_BUSY | ffi::SQLITE_LOCKED => BackendErrorKind::Busy,
        ffi::SQLITE_PERM | ffi::SQLITE_AUTH | ffi::SQLITE_READONLY => BackendErrorKind::Permission,
        ffi::SQLITE_NOTFOUND => BackendErrorKind::NotFound,
        ffi::SQLITE_TOOBIG => BackendErrorKind::TooBig,
        _ => BackendErrorKind::Database,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_memory_database() {
        let conn = SqliteConnection::open_memory().unwrap();
        assert_eq!(conn.path(), ":memory:");
    }

    #[test]
    fn open_failure_is_a_config_error() {
        let config = SqliteConfig::file("/nonexistent-rowbase-dir/db.sqlite");
        let err = SqliteConnection::open(&config).unwrap_err();
        assert!(err.is_config(), "expected config error, got {}", err);
    }

    #[test]
    fn execute_raw_and_metadata() {
        let conn = SqliteConnection::open_memory().unwrap();
        conn.execute_raw("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT)")
            .unwrap();
        conn.execute_raw("INSERT INTO t (name) VALUES ('Alice')")
            .unwrap();
        assert_eq!(conn.changes(), 1);
        assert_eq!(conn.last_insert_rowid(), 1);
    }

    #[test]
    fn parameterized_query() {
        let conn = SqliteConnection::open_memory().unwrap();
        conn.execute_raw("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT, age INTEGER)")
            .unwrap();

        conn.execute(
            "INSERT INTO t (name, age) VALUES (?, ?)",
            &[Value::Text("Alice".to_string()), Value::Int(30)],
        )
        .unwrap();

        let rows = conn
            .query(
                "SELECT * FROM t WHERE name = ?",
                &[Value::Text("Alice".to_string())],
            )
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get_as::<String>("name").unwrap(), "Alice");
        assert_eq!(rows[0].get_as::<i64>("age").unwrap(), 30);
    }

    #[test]
    fn null_round_trip() {
        let conn = SqliteConnection::open_memory().unwrap();
        conn.execute_raw("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT)")
            .unwrap();

        conn.execute("INSERT INTO t (name) VALUES (?)", &[Value::Null])
            .unwrap();

        let row = conn.query_one("SELECT * FROM t", &[]).unwrap().unwrap();
        assert_eq!(row.get_as::<Option<String>>("name").unwrap(), None);
    }

    #[test]
    fn insert_returns_sequential_rowids() {
        let conn = SqliteConnection::open_memory().unwrap();
        conn.execute_raw("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT)")
            .unwrap();

        let first = conn
            .insert(
                "INSERT INTO t (name) VALUES (?)",
                &[Value::Text("Alice".to_string())],
            )
            .unwrap();
        let second = conn
            .insert(
                "INSERT INTO t (name) VALUES (?)",
                &[Value::Text("Bob".to_string())],
            )
            .unwrap();

        assert_eq!(first, 1);
        assert_eq!(second, 2);
    }

    #[test]
    fn syntax_error_surfaces_sql() {
        let conn = SqliteConnection::open_memory().unwrap();
        let err = conn.query("SELEKT 1", &[]).unwrap_err();
        assert_eq!(err.sql(), Some("SELEKT 1"));
        assert!(err.code().is_some());
    }

    #[test]
    fn read_only_rejects_writes() {
        let tmp = std::env::temp_dir().join("rowbase_flags_test.db");
        let _ = std::fs::remove_file(&tmp);

        let config = SqliteConfig::file(tmp.to_string_lossy().into_owned());
        let conn = SqliteConnection::open(&config).unwrap();
        conn.execute_raw("CREATE TABLE t (id INTEGER)").unwrap();
        drop(conn);

        let config =
            SqliteConfig::file(tmp.to_string_lossy().into_owned()).flags(OpenFlags::read_only());
        let conn = SqliteConnection::open(&config).unwrap();

        let rows = conn.query("SELECT * FROM t", &[]).unwrap();
        assert_eq!(rows.len(), 0);
        assert!(conn.execute_raw("INSERT INTO t VALUES (1)").is_err());

        drop(conn);
        let _ = std::fs::remove_file(&tmp);
    }

    #[test]
    fn config_from_uri_variants() {
        let config = SqliteConfig::from_uri(None);
        assert!(config.path.ends_with("rowbase.db"));
        assert_eq!(config.busy_timeout_ms, 5000);
        assert!(config.flags.full_mutex);

        let config = SqliteConfig::from_uri(Some("sqlite://:memory:"));
        assert_eq!(config.path, ":memory:");

        let config = SqliteConfig::from_uri(Some(":memory:"));
        assert_eq!(config.path, ":memory:");

        let config = SqliteConfig::from_uri(Some("sqlite:///var/data/app.db"));
        assert_eq!(config.path, "/var/data/app.db");
        assert!(!config.flags.uri);

        let config = SqliteConfig::from_uri(Some("file:app.db?mode=memory&cache=shared"));
        assert_eq!(config.path, "file:app.db?mode=memory&cache=shared");
        assert!(config.flags.uri);
    }

    #[test]
    fn shared_connection_across_threads() {
        let conn = Arc::new(SqliteConnection::open_memory().unwrap());
        conn.execute_raw("CREATE TABLE t (id INTEGER PRIMARY KEY, n INTEGER)")
            .unwrap();

        let handles: Vec<_> = (0..4)
            .map(|n| {
                let conn = Arc::clone(&conn);
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        conn.insert("INSERT INTO t (n) VALUES (?)", &[Value::Int(n)])
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let row = conn
            .query_one("SELECT COUNT(*) AS c FROM t", &[])
            .unwrap()
            .unwrap();
        assert_eq!(row.get_as::<i64>("c").unwrap(), 100);
    }
}
