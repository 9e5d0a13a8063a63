//! Module: driver
//! Responsibility: the synchronous boundary between sluice and a database engine.
//! Does not own: pooling, SQL generation, transaction policy.
//! Boundary: handlers and `Database` talk to engines only through these traits.
//!
//! Invariants:
//! - Column and parameter indices are 1-based.
//! - Every driver call is synchronous; no trait here blocks on another caller.

#[cfg(test)]
pub(crate) mod mock;
#[cfg(feature = "sqlite")]
pub mod sqlite;

use crate::value::SqlValue;
use std::fmt;
use thiserror::Error as ThisError;

///
/// Driver
///
/// Opens connections. One driver is owned by each hosting database.
///

pub trait Driver: Send + Sync + 'static {
    type Connection: Connection;

    fn connect(&self) -> Result<Self::Connection, DriverError>;
}

///
/// Connection
///

pub trait Connection: Send + 'static {
    type Statement: Statement;

    fn prepare(&self, sql: &str) -> Result<Self::Statement, DriverError>;

    fn metadata(&self) -> Result<ConnectionMetadata, DriverError>;

    fn set_auto_commit(&self, auto_commit: bool) -> Result<(), DriverError>;

    fn commit(&self) -> Result<(), DriverError>;

    fn rollback(&self) -> Result<(), DriverError>;

    /// Execute one or more statements with no bound parameters.
    fn execute_batch(&self, sql: &str) -> Result<(), DriverError>;
}

///
/// Statement
///
/// A prepared statement. Bindings persist until `clear_bindings`.
///

pub trait Statement: Send + 'static {
    type Rows: Rows;

    fn bind(&mut self, index: usize, value: SqlValue) -> Result<(), DriverError>;

    fn clear_bindings(&mut self);

    /// Execute a row-modifying statement, returning the affected row count.
    fn execute_update(&mut self) -> Result<u64, DriverError>;

    fn execute_query(&mut self) -> Result<Self::Rows, DriverError>;

    /// Key generated by the most recent `execute_update`, if any.
    fn generated_key(&self) -> Result<Option<i64>, DriverError>;
}

///
/// Rows
///
/// Forward-only cursor. `value` reads from the current row.
///

pub trait Rows {
    fn next_row(&mut self) -> Result<bool, DriverError>;

    /// 1-based index of a named column, `None` when absent.
    fn column_index(&self, name: &str) -> Option<usize>;

    fn value(&self, index: usize) -> Result<SqlValue, DriverError>;
}

///
/// ConnectionMetadata
///
/// Capabilities probed once per handler and cached.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ConnectionMetadata {
    pub supports_transactions: bool,
    pub supports_batch: bool,
}

///
/// DriverError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("{kind}: {message}")]
pub struct DriverError {
    pub kind: DriverErrorKind,
    pub message: String,
}

impl DriverError {
    pub fn new(kind: DriverErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(DriverErrorKind::Other, message)
    }

    #[must_use]
    pub const fn is_already_exists(&self) -> bool {
        matches!(self.kind, DriverErrorKind::AlreadyExists)
    }
}

///
/// DriverErrorKind
///

#[remain::sorted]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DriverErrorKind {
    AlreadyExists,
    Connection,
    Constraint,
    Conversion,
    Other,
    Unsupported,
}

impl fmt::Display for DriverErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::AlreadyExists => "already_exists",
            Self::Connection => "connection",
            Self::Constraint => "constraint",
            Self::Conversion => "conversion",
            Self::Other => "other",
            Self::Unsupported => "unsupported",
        };
        write!(f, "{label}")
    }
}
