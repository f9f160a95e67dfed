//! Core types for Rowbase.
//!
//! This crate provides the shared vocabulary of the workspace:
//!
//! - `Value` for scalar cells and `Record` for flat row state
//! - `Row` for driver-level query results
//! - The error taxonomy and `Result` alias
//! - SQL identifier quoting

pub mod error;
pub mod ident;
pub mod record;
pub mod row;
pub mod value;

pub use error::{
    BackendError, BackendErrorKind, ConfigError, Error, RecordError, RecordErrorKind, Result,
    TypeError,
};
pub use ident::quote_ident;
pub use record::Record;
pub use row::{ColumnInfo, FromValue, Row};
pub use value::Value;
