//! Module: db
//! Responsibility: the hosting database. Owns the driver, dialect, table
//! registry and migration index for the process lifetime.
//! Does not own: per-handler caching (see `shared`).
//!
//! Invariants:
//! - Registered table names are unique.
//! - `init` creates every table before any index.
//! - `migrate` resolves its whole path before running a script.

#[cfg(test)]
mod tests;

use crate::{
    config::DatasourceConfig,
    dialect::{Dialect, GenericDialect},
    driver::{Connection, Driver, DriverError},
    error::DataAccessError,
    migration::MigrationIndex,
    model::TableModel,
    obs::sink::{self, MetricsEvent},
    shared::transaction,
};
use std::{collections::BTreeSet, fmt, sync::Arc};

///
/// Script
///
/// Migration body: literal SQL or a function run against the connection.
///

pub enum Script<C> {
    Sql(String),
    Custom(Box<dyn Fn(&C) -> Result<(), DriverError> + Send + Sync>),
}

impl<C: Connection> Script<C> {
    pub fn sql(sql: impl Into<String>) -> Self {
        Self::Sql(sql.into())
    }

    pub fn custom(f: impl Fn(&C) -> Result<(), DriverError> + Send + Sync + 'static) -> Self {
        Self::Custom(Box::new(f))
    }

    fn run(&self, connection: &C) -> Result<(), DriverError> {
        match self {
            Self::Sql(sql) => connection.execute_batch(sql),
            Self::Custom(f) => f(connection),
        }
    }
}

impl<C> fmt::Debug for Script<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sql(sql) => f.debug_tuple("Sql").field(sql).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

///
/// Database
///

pub struct Database<D: Driver> {
    name: String,
    version: u32,
    driver: D,
    dialect: Box<dyn Dialect>,
    tables: Vec<&'static TableModel>,
    migrations: MigrationIndex<Script<D::Connection>>,
    datasource: Option<DatasourceConfig>,
}

impl<D: Driver> Database<D> {
    pub fn builder(name: impl Into<String>, driver: D) -> DatabaseBuilder<D> {
        DatabaseBuilder::new(name, driver)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn version(&self) -> u32 {
        self.version
    }

    #[must_use]
    pub const fn driver(&self) -> &D {
        &self.driver
    }

    #[must_use]
    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    #[must_use]
    pub const fn datasource(&self) -> Option<&DatasourceConfig> {
        self.datasource.as_ref()
    }

    #[must_use]
    pub fn tables(&self) -> &[&'static TableModel] {
        &self.tables
    }

    #[must_use]
    pub fn find_table(&self, name: &str) -> Option<&'static TableModel> {
        self.tables.iter().copied().find(|t| t.name == name)
    }

    #[must_use]
    pub const fn migrations(&self) -> &MigrationIndex<Script<D::Connection>> {
        &self.migrations
    }

    /// Open a connection and apply the dialect's per-connection setup.
    pub fn require_connection(&self) -> Result<D::Connection, DataAccessError> {
        let connection = self.driver.connect().map_err(DataAccessError::connection)?;

        if let Some(sql) = self.dialect.init_connection() {
            connection
                .execute_batch(&sql)
                .map_err(DataAccessError::connection)?;
        }

        Ok(connection)
    }

    /// Run raw SQL on a fresh connection.
    pub fn execute(&self, sql: &str) -> Result<(), DataAccessError> {
        let connection = self.require_connection()?;
        connection.execute_batch(sql)?;

        Ok(())
    }

    /// Create every registered table, then every index.
    ///
    /// An index that already exists is skipped; any other engine error aborts.
    pub fn init(&self) -> Result<(), DataAccessError> {
        let connection = self.require_connection()?;

        // Phase 1: tables
        for table in &self.tables {
            let sql = self.dialect.create_table(table);
            tracing::debug!(table = table.name, sql = %sql, "creating table");

            connection
                .execute_batch(&sql)
                .map_err(DataAccessError::schema)?;
            sink::record(MetricsEvent::TableCreated { table: table.name });
        }

        // Phase 2: indices
        for table in &self.tables {
            for index in table.indices {
                let sql = self.dialect.create_index(table, index);

                match connection.execute_batch(&sql) {
                    Ok(()) => tracing::debug!(index = index.name, "created index"),
                    Err(err) if err.is_already_exists() => {
                        tracing::debug!(index = index.name, "index already exists, skipping");
                    }
                    Err(err) => return Err(DataAccessError::schema(err)),
                }
            }
        }

        Ok(())
    }

    /// Migrate from `from` to `to`, returning the number of steps run.
    ///
    /// The path is resolved first, so a resolution failure leaves the
    /// schema untouched. Steps run on one connection inside one transaction
    /// when the engine supports it.
    pub fn migrate(&self, from: u32, to: u32) -> Result<usize, DataAccessError> {
        let path = self.migrations.find_path(from, to)?;
        if path.is_empty() {
            return Ok(0);
        }

        let connection = self.require_connection()?;
        let metadata = connection.metadata().unwrap_or_default();

        transaction::scoped(&connection, Some(metadata), || {
            for migration in &path {
                let (start, end) = (migration.start(), migration.end());
                tracing::info!(database = %self.name, start, end, "running migration");

                migration
                    .script()
                    .run(&connection)
                    .map_err(|err| DataAccessError::migration_script(start, end, err))?;
                sink::record(MetricsEvent::MigrationStep { start, end });
            }

            Ok(path.len())
        })
    }

    /// Migrate from `from` to the version this database was built with.
    pub fn upgrade(&self, from: u32) -> Result<usize, DataAccessError> {
        self.migrate(from, self.version)
    }

    pub fn drop_table(&self, name: &str) -> Result<(), DataAccessError> {
        let table = self
            .find_table(name)
            .ok_or_else(|| DataAccessError::unknown_table(name))?;
        let connection = self.require_connection()?;

        connection
            .execute_batch(&self.dialect.drop_table(table))
            .map_err(DataAccessError::schema)
    }

    /// Delete every row of every registered table.
    pub fn clear_all_tables(&self) -> Result<(), DataAccessError> {
        let connection = self.require_connection()?;

        for table in &self.tables {
            connection
                .execute_batch(&self.dialect.clear_table(table))
                .map_err(DataAccessError::schema)?;
        }

        Ok(())
    }
}

impl<D: Driver> fmt::Debug for Database<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("tables", &self.tables.iter().map(|t| t.name).collect::<Vec<_>>())
            .field("migrations", &self.migrations)
            .finish_non_exhaustive()
    }
}

///
/// DatabaseBuilder
///

pub struct DatabaseBuilder<D: Driver> {
    name: String,
    version: u32,
    driver: D,
    dialect: Box<dyn Dialect>,
    tables: Vec<&'static TableModel>,
    migrations: MigrationIndex<Script<D::Connection>>,
    datasource: Option<DatasourceConfig>,
}

impl<D: Driver> DatabaseBuilder<D> {
    pub fn new(name: impl Into<String>, driver: D) -> Self {
        Self {
            name: name.into(),
            version: 1,
            driver,
            dialect: Box::new(GenericDialect),
            tables: Vec::new(),
            migrations: MigrationIndex::new(),
            datasource: None,
        }
    }

    #[must_use]
    pub fn dialect(mut self, dialect: impl Dialect + 'static) -> Self {
        self.dialect = Box::new(dialect);
        self
    }

    #[must_use]
    pub const fn version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    #[must_use]
    pub fn table(mut self, table: &'static TableModel) -> Self {
        self.tables.push(table);
        self
    }

    #[must_use]
    pub fn migration(mut self, start: u32, end: u32, script: Script<D::Connection>) -> Self {
        self.migrations.add_migration(start, end, script);
        self
    }

    #[must_use]
    pub fn datasource(mut self, datasource: DatasourceConfig) -> Self {
        self.datasource = Some(datasource);
        self
    }

    pub fn build(self) -> Result<Database<D>, DataAccessError> {
        let mut seen = BTreeSet::new();
        for table in &self.tables {
            if !seen.insert(table.name) {
                return Err(DataAccessError::duplicate_table(table.name));
            }
        }

        Ok(Database {
            name: self.name,
            version: self.version,
            driver: self.driver,
            dialect: self.dialect,
            tables: self.tables,
            migrations: self.migrations,
            datasource: self.datasource,
        })
    }

    /// Build and wrap in the `Arc` that generated handlers share.
    pub fn build_shared(self) -> Result<Arc<Database<D>>, DataAccessError> {
        self.build().map(Arc::new)
    }
}
