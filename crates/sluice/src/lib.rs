//! ## Crate layout
//! - `build`: descriptor compiler and the `build!` build-script macro.
//! - `core`: runtime database, drivers, shared handlers and value binding.
//! - `schema`: descriptor source documents and schema validation.
//!
//! Generated modules name everything through `::sluice`, so a consuming
//! crate depends on this facade only.

pub use sluice_build as build;
pub use sluice_core as core;
pub use sluice_schema as schema;

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//
// Runtime surface
//

pub use sluice_build::build;
pub use sluice_core::{
    config::{DatasourceConfig, SluiceConfig},
    db::{Database, DatabaseBuilder, Script},
    dialect::{Dialect, GenericDialect},
    driver::{Connection, ConnectionMetadata, Driver, DriverError, Rows, Statement},
    error::{DataAccessError, ErrorClass, ErrorOrigin},
    value::SqlValue,
};

#[cfg(feature = "sqlite")]
pub use sluice_core::driver::sqlite::SqliteDriver;

/// Items generated code refers to. Not part of the public API.
#[doc(hidden)]
pub mod __internal {
    pub use sluice_core::{
        column,
        dialect::Dialect,
        driver::{Rows, Statement},
        model::{
            ColumnModel, ConflictStrategy, IndexColumn, IndexModel, Order, PrimaryKeyModel, SqlType,
            TableModel,
        },
        shared::{QueryHandler, Segment, SharedConnection, SharedStatement, SqlTemplate},
    };
}

///
/// Prelude
///

pub mod prelude {
    pub use sluice_core::prelude::*;

    #[cfg(feature = "sqlite")]
    pub use crate::SqliteDriver;
}
