use crate::{
    db::Database,
    driver::{ConnectionMetadata, Driver},
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

///
/// SharedConnection
///
/// Per-handler cached connection. Backs query handlers, whose SQL depends
/// on runtime argument counts, and transaction-wrapping Dao methods.
///

pub struct SharedConnection<D: Driver> {
    db: Arc<Database<D>>,
    slot: SharedSlot<D::Connection>,
    metadata: OnceLock<ConnectionMetadata>,
}

impl<D: Driver> SharedConnection<D> {
    #[must_use]
    pub const fn new(db: Arc<Database<D>>) -> Self {
        Self {
            db,
            slot: SharedSlot::new(),
            metadata: OnceLock::new(),
        }
    }

    #[must_use]
    pub const fn database(&self) -> &Arc<Database<D>> {
        &self.db
    }

    pub fn acquire(&self) -> Result<Lease<'_, D::Connection>, DataAccessError> {
        self.slot.acquire(|| self.db.require_connection())
    }

    pub fn release(&self, lease: Lease<'_, D::Connection>) {
        self.slot.release(lease);
    }

    /// Cached capabilities, probed on first use.
    pub fn metadata(&self, connection: &D::Connection) -> ConnectionMetadata {
        transaction::probe(&self.metadata, connection)
    }

    pub fn begin_transaction(&self, lease: &Lease<'_, D::Connection>) -> Result<(), DataAccessError> {
        if !lease.is_cached() {
            tracing::debug!("ephemeral connection stays in auto-commit mode");
            return Ok(());
        }

        transaction::begin(&**lease, self.metadata(lease))
    }

    pub fn commit(&self, lease: &Lease<'_, D::Connection>) -> Result<(), DataAccessError> {
        if !lease.is_cached() {
            return Ok(());
        }

        transaction::commit(&**lease, self.metadata(lease))
    }

    pub fn rollback(&self, lease: &Lease<'_, D::Connection>) -> Result<(), DataAccessError> {
        if !lease.is_cached() {
            return Ok(());
        }

        transaction::rollback(&**lease, self.metadata(lease))
    }

    /// Acquire, optionally wrap `body` in a transaction, and always release.
    pub fn run<T>(
        &self,
        transactional: bool,
        body: impl FnOnce(&D::Connection) -> Result<T, DataAccessError>,
    ) -> Result<T, DataAccessError> {
        let lease = self.acquire()?;

        let metadata = if transactional && lease.is_cached() {
            Some(self.metadata(&lease))
        } else {
            if transactional {
                tracing::debug!("ephemeral connection stays in auto-commit mode");
            }
            None
        };
        let result = transaction::scoped(&*lease, metadata, || body(&lease));

        self.release(lease);

        result
    }
}

impl<D: Driver> fmt::Debug for SharedConnection<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedConnection")
            .field("database", &self.db.name())
            .field("slot", &self.slot)
            .finish_non_exhaustive()
    }
}
