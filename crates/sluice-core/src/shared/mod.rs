//! Module: shared
//! Responsibility: per-handler resource caching used by generated Dao code.
//! Does not own: SQL shapes (dialect) or value conversion (column).
//!
//! Invariants:
//! - Each handler owns one slot; at most one caller holds its cached resource.
//! - A caller that loses the flag allocates instead of waiting.
//! - Every acquire pairs with exactly one release, on success and error paths.
//! - Transactions run only on cached resources; ephemeral ones stay in
//!   auto-commit mode.

mod connection;
mod query;
mod slot;
mod statement;
mod template;
pub(crate) mod transaction;

#[cfg(test)]
mod tests;

pub use connection::SharedConnection;
pub use query::QueryHandler;
pub use slot::{Lease, ReleaseOnDrop, SharedSlot};
pub use statement::{Prepared, SharedStatement, StatementOf};
pub use template::{Segment, SqlTemplate, TemplateError};
