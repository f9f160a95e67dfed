//! Rowbase - a single-writer record cache and persistence worker over SQLite.
//!
//! Rowbase keeps schema-less records as plain column-to-scalar maps and
//! provides:
//!
//! - One live instance per (table, id): repeated loads return the same handle
//! - A single write lock serializing every backend mutation
//! - Tombstones, so a stale handle cannot write a deleted row back
//! - Flush-first reads that observe every in-memory edit
//! - On-demand schema upkeep: tables are created and widened as records need
//!
//! # Quick Start
//!
//! ```ignore
//! use rowbase::prelude::*;
//!
//! // None puts the database file under the platform temp directory.
//! let store = Store::from_uri(None);
//!
//! // Insert; the backend assigns the id.
//! let user = store.insert(
//!     "users",
//!     Record::new().with("name", "ann").with("age", 34i64),
//! )?;
//!
//! // Edit in memory; any find returns the same live instance and sees
//! // the edit before it is committed.
//! user.write().unwrap().set("age", 35i64);
//! let same = store.find_one("users", &Record::new().with("name", "ann"))?;
//!
//! // Write back and release.
//! store.commit("users", &user)?;
//!
//! // Query with options.
//! let adults = store.find_all_with(
//!     "users",
//!     &Record::new(),
//!     FindOptions::new().order_by("age"),
//! )?;
//! for handle in adults {
//!     let record = handle?;
//!     println!("{}", serde_json::to_string(&*record.read().unwrap())?);
//! }
//! ```
//!
//! # Features
//!
//! - **Schema-less records**: a [`Record`] is a flat map of column name to
//!   scalar [`Value`]; tables grow columns as records gain fields
//! - **Identity**: the store hands out [`RecordHandle`]s; `Arc::ptr_eq`
//!   tells you two handles are the same live record
//! - **Explicit release**: only [`Store::commit`] releases a record; flushes
//!   write state back but keep the instance live
//! - **Synchronous and blocking**: no internal threads, no timeouts; share
//!   the store across your own threads behind an `Arc`

pub use rowbase_core::{
    BackendError, BackendErrorKind, ColumnInfo, ConfigError, Error, FromValue, Record,
    RecordError, RecordErrorKind, Result, Row, TypeError, Value, quote_ident,
};

pub use rowbase_sqlite::{
    OpenFlags, SqliteConfig, SqliteConnection, sqlite_version, sqlite_version_number,
};

pub use rowbase_store::{
    ConnectionManager, FindAll, FindOptions, InUseRegistry, ORDER_BY_KEY, REVERSE_KEY,
    RecordHandle, RecordKey, Store, StoreDebugInfo, TombstoneRegistry,
};

/// Prelude module for convenient imports.
///
/// ```ignore
/// use rowbase::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        Error, FindOptions, Record, RecordHandle, Result, Row, SqliteConfig, Store, Value,
    };
}
