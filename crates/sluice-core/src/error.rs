use crate::driver::{DriverError, DriverErrorKind};
use std::fmt;
use thiserror::Error as ThisError;

///
/// DataAccessError
///
/// Structured runtime error returned by every generated Dao method and by
/// the hosting database. Wraps the driver failure when one exists.
///

#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct DataAccessError {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,

    #[source]
    pub source: Option<DriverError>,
}

impl DataAccessError {
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
            source: None,
        }
    }

    /// Wrap a driver failure, classifying it by the driver's error kind.
    #[must_use]
    pub fn driver(origin: ErrorOrigin, err: DriverError) -> Self {
        let class = match err.kind {
            DriverErrorKind::AlreadyExists | DriverErrorKind::Constraint => ErrorClass::Conflict,
            DriverErrorKind::Conversion => ErrorClass::Conversion,
            DriverErrorKind::Unsupported => ErrorClass::Unsupported,
            DriverErrorKind::Connection | DriverErrorKind::Other => ErrorClass::Driver,
        };

        Self {
            class,
            origin,
            message: format!("{origin} failed: {err}"),
            source: Some(err),
        }
    }

    /// Construct a connection-origin driver error.
    pub(crate) fn connection(err: DriverError) -> Self {
        Self::driver(ErrorOrigin::Connection, err)
    }

    /// Construct a transaction-origin driver error.
    pub(crate) fn transaction(err: DriverError) -> Self {
        Self::driver(ErrorOrigin::Transaction, err)
    }

    /// Construct a schema-origin driver error.
    pub(crate) fn schema(err: DriverError) -> Self {
        Self::driver(ErrorOrigin::Schema, err)
    }

    /// Construct a column conversion error.
    pub fn conversion(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Conversion, ErrorOrigin::Column, message)
    }

    /// A single-row result found no rows.
    pub fn no_rows(route: impl Into<String>) -> Self {
        let route = route.into();

        Self::new(
            ErrorClass::NotFound,
            ErrorOrigin::Query,
            format!("query '{route}' returned no rows"),
        )
    }

    /// An insert completed without the driver reporting a generated key.
    #[must_use]
    pub fn no_generated_key() -> Self {
        Self::new(
            ErrorClass::NotFound,
            ErrorOrigin::Statement,
            "insert did not produce a generated key",
        )
    }

    /// A table name was registered twice on one database.
    pub fn duplicate_table(name: impl Into<String>) -> Self {
        let name = name.into();

        Self::new(
            ErrorClass::Conflict,
            ErrorOrigin::Schema,
            format!("table '{name}' is registered more than once"),
        )
    }

    /// A table name was not registered on the database.
    pub fn unknown_table(name: impl Into<String>) -> Self {
        let name = name.into();

        Self::new(
            ErrorClass::NotFound,
            ErrorOrigin::Schema,
            format!("table '{name}' is not registered"),
        )
    }

    /// Construct a query-origin invariant violation.
    pub(crate) fn query_invariant(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::InvariantViolation, ErrorOrigin::Query, message)
    }

    /// Construct a migration-origin error for a failing script.
    pub(crate) fn migration_script(start: u32, end: u32, err: DriverError) -> Self {
        Self {
            class: ErrorClass::Driver,
            origin: ErrorOrigin::Migration,
            message: format!("migration {start} -> {end} failed: {err}"),
            source: Some(err),
        }
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {}", self.origin, self.class, self.message)
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.class, ErrorClass::NotFound)
    }
}

impl From<DriverError> for DataAccessError {
    fn from(err: DriverError) -> Self {
        Self::driver(ErrorOrigin::Statement, err)
    }
}

impl From<MigrationResolutionError> for DataAccessError {
    fn from(err: MigrationResolutionError) -> Self {
        Self::new(ErrorClass::NotFound, ErrorOrigin::Migration, err.to_string())
    }
}

///
/// MigrationResolutionError
///
/// No registered edge continues the walk from `stuck_at` towards `end`.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("no migration path from version {start} to {end} (stuck at {stuck_at})")]
pub struct MigrationResolutionError {
    pub start: u32,
    pub end: u32,
    pub stuck_at: u32,
}

///
/// ErrorClass
/// Runtime error taxonomy.
///

#[remain::sorted]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    Conflict,
    Conversion,
    Driver,
    InvariantViolation,
    NotFound,
    Unsupported,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Conflict => "conflict",
            Self::Conversion => "conversion",
            Self::Driver => "driver",
            Self::InvariantViolation => "invariant_violation",
            Self::NotFound => "not_found",
            Self::Unsupported => "unsupported",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
/// Which runtime layer raised the error.
///

#[remain::sorted]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorOrigin {
    Column,
    Connection,
    Migration,
    Query,
    Schema,
    Statement,
    Transaction,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Column => "column",
            Self::Connection => "connection",
            Self::Migration => "migration",
            Self::Query => "query",
            Self::Schema => "schema",
            Self::Statement => "statement",
            Self::Transaction => "transaction",
        };
        write!(f, "{label}")
    }
}
