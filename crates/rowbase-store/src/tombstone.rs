//! Tombstones for deleted records.
//!
//! A successful delete leaves a tombstone under the record's key. The next
//! commit attempt for that key consumes the tombstone and skips its write,
//! so a handle that outlived the delete cannot resurrect the row.

use std::collections::HashSet;
use std::fmt;
use std::sync::Mutex;

use crate::registry::RecordKey;

/// Keys of records deleted since their last commit attempt.
///
/// Shared by reference between the delete and commit paths. All methods
/// take `&self` and synchronize internally.
#[derive(Default)]
pub struct TombstoneRegistry {
    entries: Mutex<HashSet<RecordKey>>,
}

impl TombstoneRegistry {
    /// Creates an empty tombstone registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `key` as deleted.
    ///
    /// Marking an already-marked key is a no-op: one tombstone per key,
    /// consumed by whichever commit attempt gets there first.
    pub fn mark(&self, key: RecordKey) {
        self.entries.lock().unwrap().insert(key);
    }

    /// Removes the tombstone for `key`, reporting whether one was present.
    ///
    /// Returns `true` at most once per `mark`. The tombstone is gone after
    /// this call whether or not the caller's write then succeeds.
    pub fn consume(&self, key: &RecordKey) -> bool {
        self.entries.lock().unwrap().remove(key)
    }

    /// Returns `true` if `key` currently has a tombstone.
    pub fn contains(&self, key: &RecordKey) -> bool {
        self.entries.lock().unwrap().contains(key)
    }

    /// Drops every tombstone whose key belongs to `table`.
    ///
    /// Called when the table itself is dropped. A record inserted into a
    /// recreated table must not inherit a tombstone from before the drop.
    pub fn clear_table(&self, table: &str) {
        self.entries.lock().unwrap().retain(|key| key.table != table);
    }

    /// Number of outstanding tombstones.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Returns `true` if no tombstones are outstanding.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }
}

impl fmt::Debug for TombstoneRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TombstoneRegistry")
            .field("len", &self.len())
            .finish()
    }
}
