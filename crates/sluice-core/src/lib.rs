//! Runtime for sluice-generated data-access code.
//!
//! Generated Dao implementations call into `shared` for per-handler
//! statement and connection caching and into `column` for value binding.
//! The hosting `Database` owns the driver, dialect, table registry and
//! migration index.

pub mod column;
pub mod config;
pub mod db;
pub mod dialect;
pub mod driver;
pub mod error;
pub mod migration;
pub mod model;
pub mod obs;
pub mod shared;
pub mod value;

mod scalar_registry;

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        db::{Database, DatabaseBuilder, Script},
        dialect::{Dialect, GenericDialect},
        driver::{Connection, Driver, Rows, Statement},
        error::DataAccessError,
        value::SqlValue,
    };
}
