//! Registry of live in-memory records.
//!
//! At most one Record per (table, id) is live at a time. Repeated loads
//! of the same row hand back clones of the same `Arc`, so every caller
//! works on one shared instance and sees every field edit immediately.
//!
//! Entries stay until the commit or delete path removes them; there is
//! no eviction.

use rowbase_core::Record;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

/// Key identifying one live record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordKey {
    /// Table the record belongs to.
    pub table: String,
    /// Backend-assigned row id.
    pub id: i64,
}

impl RecordKey {
    /// Create a key from a table name and id.
    pub fn new(table: impl Into<String>, id: i64) -> Self {
        Self {
            table: table.into(),
            id,
        }
    }
}

impl std::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.table, self.id)
    }
}

/// Shared handle to a live record.
///
/// Clones of the same handle point at the same record; use
/// `Arc::ptr_eq` to test identity.
pub type RecordHandle = Arc<RwLock<Record>>;

/// Identity map of live records, keyed by (table, id).
///
/// The registry has its own interior lock, so registration from read
/// paths never contends with the store's write mutex.
#[derive(Default)]
pub struct InUseRegistry {
    entries: Mutex<HashMap<RecordKey, RecordHandle>>,
}

impl InUseRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handle under its key. Last writer wins.
    ///
    /// Two distinct live instances for one key violate the registry's
    /// contract; when observed, the older entry is replaced and a
    /// warning is logged rather than an error raised.
    pub fn register(&self, key: RecordKey, handle: RecordHandle) {
        let mut entries = self.entries.lock().unwrap();
        if let Some(existing) = entries.get(&key) {
            if !Arc::ptr_eq(existing, &handle) {
                tracing::warn!(
                    table = %key.table,
                    id = key.id,
                    "Two live records claim the same key; keeping the newer one"
                );
            }
        }
        entries.insert(key, handle);
    }

    /// Get the live handle for a key.
    ///
    /// The returned `Arc` is a clone of the stored one, not a copy of
    /// the record.
    pub fn get(&self, key: &RecordKey) -> Option<RecordHandle> {
        self.entries.lock().unwrap().get(key).map(Arc::clone)
    }

    /// Remove a key, returning its handle if one was present.
    pub fn unregister(&self, key: &RecordKey) -> Option<RecordHandle> {
        self.entries.lock().unwrap().remove(key)
    }

    /// Snapshot every live (key, handle) pair.
    ///
    /// Callers iterate the snapshot, not the registry, so entries may
    /// be registered or removed while the caller works through it.
    pub fn all(&self) -> Vec<(RecordKey, RecordHandle)> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .map(|(key, handle)| (key.clone(), Arc::clone(handle)))
            .collect()
    }

    /// Snapshot the live keys belonging to one table.
    pub fn keys_for_table(&self, table: &str) -> Vec<RecordKey> {
        self.entries
            .lock()
            .unwrap()
            .keys()
            .filter(|key| key.table == table)
            .cloned()
            .collect()
    }

    /// Check whether a key is live.
    pub fn contains(&self, key: &RecordKey) -> bool {
        self.entries.lock().unwrap().contains_key(key)
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Whether no entries are live.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }
}

impl std::fmt::Debug for InUseRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InUseRegistry")
            .field("len", &self.len())
            .finish()
    }
}
