//! Static table descriptions consumed at runtime.
//!
//! Generated code instantiates these as statics and registers them on the
//! hosting database, where dialects turn them into DDL. Their descriptor-time
//! counterparts live in `sluice-schema`.
pub mod column;
pub mod index;
pub mod table;

pub use column::{ColumnModel, SqlType};
pub use index::{IndexColumn, IndexModel, Order};
pub use table::{ConflictStrategy, PrimaryKeyModel, TableModel};
