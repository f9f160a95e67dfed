//! Record store for Rowbase.
//!
//! `rowbase-store` is the **single-writer layer**. It keeps one live
//! instance per (table, id), serializes every backend mutation through one
//! mutex, and remembers deletes so a stale handle cannot write a deleted
//! row back.
//!
//! # Role In The Architecture
//!
//! - **In-use registry**: ensures a single in-memory instance per
//!   (table, id); repeated loads return the same handle.
//! - **Tombstones**: committing a handle whose row was deleted consumes the
//!   tombstone and skips the write.
//! - **Write coordination**: one mutex serializes inserts, upserts, deletes,
//!   and drops across every calling thread.
//! - **Flush-first reads**: queries observe every in-memory edit without
//!   holding the write lock.
//!
//! # Design Philosophy
//!
//! - **Explicit over implicit**: records release only on an explicit
//!   commit; flushing keeps them live.
//! - **One context object**: the [`Store`] owns the connection, the
//!   registries, and the lock; share it behind an `Arc`.
//! - **Backend-assigned ids**: inserts reject a client-supplied id.
//!
//! # Example
//!
//! ```ignore
//! let store = Store::from_uri(Some("sqlite:///var/data/app.db"));
//!
//! // Insert; the backend assigns the id.
//! let user = store.insert("users", Record::new().with("name", "ann"))?;
//!
//! // Edit in memory; reads see the edit immediately, same instance.
//! user.write().unwrap().set("name", "annabel");
//! let same = store.find_one("users", &Record::new().with("name", "annabel"))?;
//!
//! // Write back and release.
//! store.commit("users", &user)?;
//! ```

pub mod find;
pub mod manager;
pub mod registry;
pub mod schema;
pub mod store;
pub mod tombstone;

pub use find::{FindAll, FindOptions, ORDER_BY_KEY, REVERSE_KEY};
pub use manager::ConnectionManager;
pub use registry::{InUseRegistry, RecordHandle, RecordKey};
pub use store::{Store, StoreDebugInfo};
pub use tombstone::TombstoneRegistry;
