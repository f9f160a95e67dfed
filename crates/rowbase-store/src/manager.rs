//! Lazy connection management.
//!
//! The store owns exactly one backend connection. It is opened on first use
//! from the stored config and handed out as clones of the same `Arc` after
//! that. Reconfiguring drops the open connection so the next use reopens at
//! the new location.

use std::fmt;
use std::sync::{Arc, Mutex};

use rowbase_core::Result;
use rowbase_sqlite::{SqliteConfig, SqliteConnection};

/// Holds the one backend connection for a store.
pub struct ConnectionManager {
    config: Mutex<SqliteConfig>,
    connection: Mutex<Option<Arc<SqliteConnection>>>,
}

impl ConnectionManager {
    /// Creates a manager that will open connections with `config`.
    #[must_use]
    pub fn new(config: SqliteConfig) -> Self {
        Self {
            config: Mutex::new(config),
            connection: Mutex::new(None),
        }
    }

    /// Creates a manager from an optional location string.
    ///
    /// See [`SqliteConfig::from_uri`] for how the location resolves. `None`
    /// selects a file named `rowbase.db` in the platform temp directory.
    #[must_use]
    pub fn from_uri(uri: Option<&str>) -> Self {
        Self::new(SqliteConfig::from_uri(uri))
    }

    /// Returns the live connection, opening it on first use.
    ///
    /// A failed open surfaces as a fatal [`rowbase_core::Error::Config`] and
    /// caches nothing, so a later call attempts the open again.
    pub fn connect(&self) -> Result<Arc<SqliteConnection>> {
        let mut slot = self.connection.lock().unwrap();
        if let Some(conn) = slot.as_ref() {
            return Ok(Arc::clone(conn));
        }

        let config = self.config.lock().unwrap().clone();
        let conn = Arc::new(SqliteConnection::open(&config)?);
        tracing::debug!(
            path = %conn.path(),
            sqlite = %rowbase_sqlite::sqlite_version(),
            "Opened backend connection"
        );
        *slot = Some(Arc::clone(&conn));
        Ok(conn)
    }

    /// Replaces the config and drops any open connection.
    ///
    /// The next [`connect`](Self::connect) reopens at the new location.
    /// Calling this twice in a row is allowed; each call starts from a
    /// closed state. Connection clones already handed out keep working
    /// against the old database until they are dropped.
    pub fn reconfigure(&self, config: SqliteConfig) {
        let mut slot = self.connection.lock().unwrap();
        if slot.take().is_some() {
            tracing::debug!(path = %config.path, "Dropped open connection; next use reopens");
        }
        *self.config.lock().unwrap() = config;
    }

    /// Returns `true` if a connection is currently open.
    pub fn is_connected(&self) -> bool {
        self.connection.lock().unwrap().is_some()
    }

    /// The configured backend path.
    pub fn path(&self) -> String {
        self.config.lock().unwrap().path.clone()
    }
}

impl fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("path", &self.path())
            .field("connected", &self.is_connected())
            .finish()
    }
}
