//! SQLite driver for Rowbase.
//!
// FFI bindings require unsafe code - this is expected for database drivers
#![allow(unsafe_code)]
//!
//! This crate wraps libsqlite3 behind a synchronous, thread-safe
//! connection type. It is the storage half of the record store: the
//! `rowbase-store` crate decides *what* to write, this crate performs
//! the actual SQL round trips.
//!
//! # Type Mapping
//!
//! | Value variant | SQLite storage |
//! |---------------|----------------|
//! | `Null` | NULL |
//! | `Bool` | INTEGER (0/1) |
//! | `Int` | INTEGER |
//! | `Real` | REAL |
//! | `Text` | TEXT |
//! | `Bytes` | BLOB |
//!
//! # Thread Safety
//!
//! `SqliteConnection` is both `Send` and `Sync`. All calls serialize on
//! an internal mutex and the handle is opened in SQLite's serialized
//! mode, so one connection can back any number of caller threads.

pub mod connection;
pub mod ffi;
pub mod types;

pub use connection::{OpenFlags, SqliteConfig, SqliteConnection};

/// Re-export the SQLite library version.
pub fn sqlite_version() -> &'static str {
    ffi::version()
}

/// Re-export the SQLite library version number.
pub fn sqlite_version_number() -> i32 {
    ffi::version_number()
}
