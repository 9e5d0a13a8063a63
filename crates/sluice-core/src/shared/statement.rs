use crate::{
    db::Database,
    driver::{Connection, ConnectionMetadata, Driver, Statement},
    error::DataAccessError,
    shared::{
        slot::{Lease, SharedSlot},
        transaction,
    },
};
use std::{
    fmt,
    sync::{Arc, OnceLock},
};

/// Statement type of a driver's connections.
pub type StatementOf<D> = <<D as Driver>::Connection as Connection>::Statement;

///
/// Prepared
/// A statement cached together with the connection it was prepared on.
///

pub struct Prepared<C: Connection> {
    pub connection: C,
    pub statement: C::Statement,
}

///
/// SharedStatement
///
/// Per-handler cached prepared statement for SQL that is fixed at
/// construction time (entity insert, update and delete shapes).
///

pub struct SharedStatement<D: Driver> {
    db: Arc<Database<D>>,
    sql: String,
    slot: SharedSlot<Prepared<D::Connection>>,
    metadata: OnceLock<ConnectionMetadata>,
}

impl<D: Driver> SharedStatement<D> {
    #[must_use]
    pub fn new(db: Arc<Database<D>>, sql: impl Into<String>) -> Self {
        Self {
            db,
            sql: sql.into(),
            slot: SharedSlot::new(),
            metadata: OnceLock::new(),
        }
    }

    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn acquire(&self) -> Result<Lease<'_, Prepared<D::Connection>>, DataAccessError> {
        self.slot.acquire(|| {
            let connection = self.db.require_connection()?;
            let statement = connection.prepare(&self.sql)?;
            tracing::debug!(sql = %self.sql, "prepared shared statement");

            Ok(Prepared {
                connection,
                statement,
            })
        })
    }

    pub fn release(&self, lease: Lease<'_, Prepared<D::Connection>>) {
        self.slot.release(lease);
    }

    /// Acquire, clear stale bindings, run `body` (optionally inside a
    /// transaction on the cached connection) and always release.
    pub fn run<T>(
        &self,
        transactional: bool,
        body: impl FnOnce(&mut StatementOf<D>) -> Result<T, DataAccessError>,
    ) -> Result<T, DataAccessError> {
        let mut lease = self.acquire()?;
        let cached = lease.is_cached();

        let result = {
            let Prepared {
                connection,
                statement,
            } = &mut *lease;
            statement.clear_bindings();

            let metadata = (transactional && cached)
                .then(|| transaction::probe(&self.metadata, &*connection));

            transaction::scoped(&*connection, metadata, || body(statement))
        };

        self.release(lease);

        result
    }
}

impl<D: Driver> fmt::Debug for SharedStatement<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedStatement")
            .field("sql", &self.sql)
            .field("slot", &self.slot)
            .finish_non_exhaustive()
    }
}
