//! Error types for Rowbase operations.

use std::fmt;

/// The primary error type for all Rowbase operations.
#[derive(Debug)]
pub enum Error {
    /// Configuration errors (backend could not be opened, bad location)
    Config(ConfigError),
    /// Backend errors (insert, upsert, delete, drop, query)
    Backend(BackendError),
    /// Record misuse errors (client-supplied id, missing id)
    Record(RecordError),
    /// Type conversion errors
    Type(TypeError),
    /// Custom error with message
    Custom(String),
}

/// The backend connection could not be opened or configured.
///
/// Fatal: surfaced immediately to the caller, never retried.
#[derive(Debug)]
pub struct ConfigError {
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

/// A failure reported by the storage backend.
///
/// Propagated verbatim: the message and raw result code are preserved and
/// nothing is retried or rolled back on the caller's behalf.
#[derive(Debug)]
pub struct BackendError {
    pub kind: BackendErrorKind,
    pub message: String,
    /// Raw SQLite result code, when the failure came from the library.
    pub code: Option<i32>,
    /// The SQL that was being executed, when known.
    pub sql: Option<String>,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendErrorKind {
    /// Constraint violation (unique, not null, etc.)
    Constraint,
    /// Database file is locked by another handle
    Busy,
    /// Permission denied
    Permission,
    /// Table or column not found
    NotFound,
    /// Data too large for the backend
    TooBig,
    /// Other database error
    Database,
}

/// Caller misuse of the record lifecycle.
#[derive(Debug)]
pub struct RecordError {
    pub kind: RecordErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordErrorKind {
    /// An `id` field was supplied on insert; ids are backend-assigned.
    ClientSuppliedId,
    /// The operation needs an id but the record was never persisted.
    MissingId,
}

/// A value could not be converted to the requested Rust type.
#[derive(Debug)]
pub struct TypeError {
    pub expected: &'static str,
    pub actual: String,
    pub column: Option<String>,
}

impl Error {
    /// Is this a fatal configuration error?
    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config(_))
    }

    /// Get the raw backend result code, if available.
    pub fn code(&self) -> Option<i32> {
        match self {
            Error::Backend(b) => b.code,
            _ => None,
        }
    }

    /// Get the SQL that caused this error, if available.
    pub fn sql(&self) -> Option<&str> {
        match self {
            Error::Backend(b) => b.sql.as_deref(),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "Configuration error: {}", e.message),
            Error::Backend(e) => {
                if let Some(code) = e.code {
                    write!(f, "Backend error (code {}): {}", code, e.message)
                } else {
                    write!(f, "Backend error: {}", e.message)
                }
            }
            Error::Record(e) => write!(f, "Record error: {}", e.message),
            Error::Type(e) => {
                if let Some(col) = &e.column {
                    write!(
                        f,
                        "Type error in column '{}': expected {}, found {}",
                        col, e.expected, e.actual
                    )
                } else {
                    write!(f, "Type error: expected {}, found {}", e.expected, e.actual)
                }
            }
            Error::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Config(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            Error::Backend(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            _ => None,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(code) = self.code {
            write!(f, "{} (code {})", self.message, code)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(col) = &self.column {
            write!(
                f,
                "expected {} for column '{}', found {}",
                self.expected, col, self.actual
            )
        } else {
            write!(f, "expected {}, found {}", self.expected, self.actual)
        }
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Config(err)
    }
}

impl From<BackendError> for Error {
    fn from(err: BackendError) -> Self {
        Error::Backend(err)
    }
}

impl From<RecordError> for Error {
    fn from(err: RecordError) -> Self {
        Error::Record(err)
    }
}

impl From<TypeError> for Error {
    fn from(err: TypeError) -> Self {
        Error::Type(err)
    }
}

/// Result type alias for Rowbase operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_accessors() {
        let err = Error::Backend(BackendError {
            kind: BackendErrorKind::Constraint,
            message: "UNIQUE constraint failed".to_string(),
            code: Some(19),
            sql: Some("INSERT INTO t VALUES (?)".to_string()),
            source: None,
        });

        assert_eq!(err.code(), Some(19));
        assert_eq!(err.sql(), Some("INSERT INTO t VALUES (?)"));
        assert!(!err.is_config());
    }

    #[test]
    fn config_is_fatal() {
        let err = Error::Config(ConfigError {
            message: "unable to open database file".to_string(),
            source: None,
        });

        assert!(err.is_config());
        assert_eq!(err.code(), None);
        assert_eq!(
            err.to_string(),
            "Configuration error: unable to open database file"
        );
    }

    #[test]
    fn display_includes_code() {
        let err = Error::Backend(BackendError {
            kind: BackendErrorKind::Busy,
            message: "database is locked".to_string(),
            code: Some(5),
            sql: None,
            source: None,
        });

        assert_eq!(err.to_string(), "Backend error (code 5): database is locked");
    }

    #[test]
    fn record_error_display() {
        let err = Error::Record(RecordError {
            kind: RecordErrorKind::MissingId,
            message: "record has no id; insert it first".to_string(),
        });

        assert_eq!(
            err.to_string(),
            "Record error: record has no id; insert it first"
        );
    }
}
