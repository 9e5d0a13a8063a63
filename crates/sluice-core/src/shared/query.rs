use crate::{
    db::Database,
    driver::{Connection, Driver},
    error::DataAccessError,
    shared::{connection::SharedConnection, statement::StatementOf, template::SqlTemplate},
};
use std::{fmt, sync::Arc};

///
/// QueryHandler
///
/// Caches a connection, not a statement: the rendered SQL changes with the
/// length of every sequence argument.
///

pub struct QueryHandler<D: Driver> {
    connection: SharedConnection<D>,
    template: SqlTemplate,
}

impl<D: Driver> QueryHandler<D> {
    #[must_use]
    pub const fn new(db: Arc<Database<D>>, template: SqlTemplate) -> Self {
        Self {
            connection: SharedConnection::new(db),
            template,
        }
    }

    #[must_use]
    pub const fn template(&self) -> &SqlTemplate {
        &self.template
    }

    /// Render the template for `counts`, prepare it on the shared
    /// connection, and hand the statement to `body`.
    pub fn run<T>(
        &self,
        counts: &[usize],
        transactional: bool,
        body: impl FnOnce(&mut StatementOf<D>) -> Result<T, DataAccessError>,
    ) -> Result<T, DataAccessError> {
        let sql = self
            .template
            .render(counts, self.connection.database().dialect())?;

        self.connection.run(transactional, |connection| {
            let mut statement = connection.prepare(&sql)?;
            tracing::debug!(sql = %sql, "prepared query");

            body(&mut statement)
        })
    }
}

impl<D: Driver> fmt::Debug for QueryHandler<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryHandler")
            .field("template", &self.template)
            .field("connection", &self.connection)
            .finish()
    }
}
