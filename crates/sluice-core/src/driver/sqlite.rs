//! SQLite driver backed by `rusqlite`.
//!
//! Every `connect` opens a new handle on the same database file, so an
//! in-memory path gives each connection its own database.

use crate::{
    config::DatasourceConfig,
    driver::{Connection, ConnectionMetadata, Driver, DriverError, DriverErrorKind, Rows, Statement},
    value::SqlValue,
};
use rusqlite::{ErrorCode, params_from_iter, types::Value};
use std::{
    path::PathBuf,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

fn driver_error(err: rusqlite::Error) -> DriverError {
    let message = err.to_string();

    let kind = match &err {
        rusqlite::Error::SqliteFailure(code, _) if code.code == ErrorCode::ConstraintViolation => {
            DriverErrorKind::Constraint
        }
        rusqlite::Error::SqliteFailure(code, _) if code.code == ErrorCode::CannotOpen => {
            DriverErrorKind::Connection
        }
        rusqlite::Error::SqliteFailure(..) if message.contains("already exists") => {
            DriverErrorKind::AlreadyExists
        }
        rusqlite::Error::FromSqlConversionFailure(..)
        | rusqlite::Error::InvalidColumnType(..)
        | rusqlite::Error::IntegralValueOutOfRange(..) => DriverErrorKind::Conversion,
        _ => DriverErrorKind::Other,
    };

    DriverError::new(kind, message)
}

fn to_value(value: &SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Integer(v) => Value::Integer(*v),
        SqlValue::Real(v) => Value::Real(*v),
        SqlValue::Text(v) => Value::Text(v.clone()),
        SqlValue::Blob(v) => Value::Blob(v.clone()),
    }
}

fn from_value(value: Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Integer(v) => SqlValue::Integer(v),
        Value::Real(v) => SqlValue::Real(v),
        Value::Text(v) => SqlValue::Text(v),
        Value::Blob(v) => SqlValue::Blob(v),
    }
}

type Shared = Arc<Mutex<rusqlite::Connection>>;

fn lock(inner: &Shared) -> MutexGuard<'_, rusqlite::Connection> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

///
/// SqliteDriver
///

#[derive(Clone, Debug)]
pub struct SqliteDriver {
    path: PathBuf,
    pragmas: Vec<String>,
}

impl SqliteDriver {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pragmas: Vec::new(),
        }
    }

    /// Build from a datasource. `url` may carry a `sqlite:` prefix;
    /// `modifier` is a `;`-separated list of pragma assignments.
    #[must_use]
    pub fn from_config(config: &DatasourceConfig) -> Self {
        let path = config
            .url
            .strip_prefix("sqlite://")
            .or_else(|| config.url.strip_prefix("sqlite:"))
            .unwrap_or(&config.url);

        if config.username.is_some() || config.password.is_some() {
            tracing::debug!("sqlite ignores datasource credentials");
        }

        let pragmas = config
            .modifier
            .iter()
            .flat_map(|m| m.split(';'))
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(ToString::to_string)
            .collect();

        Self {
            path: PathBuf::from(path),
            pragmas,
        }
    }

    #[must_use]
    pub fn pragma(mut self, pragma: impl Into<String>) -> Self {
        self.pragmas.push(pragma.into());
        self
    }
}

impl Driver for SqliteDriver {
    type Connection = SqliteConnection;

    fn connect(&self) -> Result<SqliteConnection, DriverError> {
        let raw = rusqlite::Connection::open(&self.path).map_err(|err| {
            let mut err = driver_error(err);
            err.kind = DriverErrorKind::Connection;
            err
        })?;

        for pragma in &self.pragmas {
            raw.execute_batch(&format!("PRAGMA {pragma};"))
                .map_err(driver_error)?;
        }

        Ok(SqliteConnection {
            inner: Arc::new(Mutex::new(raw)),
        })
    }
}

///
/// SqliteConnection
///

#[derive(Debug)]
pub struct SqliteConnection {
    inner: Shared,
}

impl Connection for SqliteConnection {
    type Statement = SqliteStatement;

    fn prepare(&self, sql: &str) -> Result<SqliteStatement, DriverError> {
        // compile once up front so syntax errors surface at prepare time
        lock(&self.inner).prepare_cached(sql).map_err(driver_error)?;

        Ok(SqliteStatement {
            inner: Arc::clone(&self.inner),
            sql: sql.to_string(),
            params: Vec::new(),
            last_key: None,
        })
    }

    fn metadata(&self) -> Result<ConnectionMetadata, DriverError> {
        Ok(ConnectionMetadata {
            supports_transactions: true,
            supports_batch: true,
        })
    }

    fn set_auto_commit(&self, auto_commit: bool) -> Result<(), DriverError> {
        let conn = lock(&self.inner);

        let result = match (auto_commit, conn.is_autocommit()) {
            (false, true) => conn.execute_batch("BEGIN"),
            (true, false) => conn.execute_batch("COMMIT"),
            _ => Ok(()),
        };

        result.map_err(driver_error)
    }

    fn commit(&self) -> Result<(), DriverError> {
        let conn = lock(&self.inner);
        if conn.is_autocommit() {
            return Ok(());
        }

        conn.execute_batch("COMMIT").map_err(driver_error)
    }

    fn rollback(&self) -> Result<(), DriverError> {
        let conn = lock(&self.inner);
        if conn.is_autocommit() {
            return Ok(());
        }

        conn.execute_batch("ROLLBACK").map_err(driver_error)
    }

    fn execute_batch(&self, sql: &str) -> Result<(), DriverError> {
        lock(&self.inner).execute_batch(sql).map_err(driver_error)
    }
}

///
/// SqliteStatement
///
/// Holds SQL and bindings; execution goes through the connection's
/// prepared-statement cache.
///

#[derive(Debug)]
pub struct SqliteStatement {
    inner: Shared,
    sql: String,
    params: Vec<SqlValue>,
    last_key: Option<i64>,
}

impl SqliteStatement {
    fn is_insert(&self) -> bool {
        self.sql
            .trim_start()
            .get(..6)
            .is_some_and(|verb| verb.eq_ignore_ascii_case("insert"))
    }
}

impl Statement for SqliteStatement {
    type Rows = SqliteRows;

    fn bind(&mut self, index: usize, value: SqlValue) -> Result<(), DriverError> {
        let Some(slot) = index.checked_sub(1) else {
            return Err(DriverError::new(
                DriverErrorKind::Other,
                "bind indices are 1-based",
            ));
        };
        if self.params.len() <= slot {
            self.params.resize(slot + 1, SqlValue::Null);
        }
        self.params[slot] = value;

        Ok(())
    }

    fn clear_bindings(&mut self) {
        self.params.clear();
    }

    fn execute_update(&mut self) -> Result<u64, DriverError> {
        let conn = lock(&self.inner);
        let mut stmt = conn.prepare_cached(&self.sql).map_err(driver_error)?;
        let changed = stmt
            .execute(params_from_iter(self.params.iter().map(to_value)))
            .map_err(driver_error)?;

        self.last_key = (changed > 0 && self.is_insert()).then(|| conn.last_insert_rowid());

        u64::try_from(changed).map_err(|_| DriverError::new(DriverErrorKind::Conversion, "row count overflow"))
    }

    fn execute_query(&mut self) -> Result<SqliteRows, DriverError> {
        let conn = lock(&self.inner);
        let mut stmt = conn.prepare_cached(&self.sql).map_err(driver_error)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(str::to_string).collect();
        let width = columns.len();

        let mut rows = stmt
            .query(params_from_iter(self.params.iter().map(to_value)))
            .map_err(driver_error)?;

        let mut materialized = Vec::new();
        while let Some(row) = rows.next().map_err(driver_error)? {
            let mut values = Vec::with_capacity(width);
            for i in 0..width {
                values.push(from_value(row.get::<_, Value>(i).map_err(driver_error)?));
            }
            materialized.push(values);
        }

        Ok(SqliteRows {
            columns,
            rows: materialized,
            current: None,
        })
    }

    fn generated_key(&self) -> Result<Option<i64>, DriverError> {
        Ok(self.last_key)
    }
}

///
/// SqliteRows
/// Fully materialized result set.
///

#[derive(Debug)]
pub struct SqliteRows {
    columns: Vec<String>,
    rows: Vec<Vec<SqlValue>>,
    current: Option<usize>,
}

impl Rows for SqliteRows {
    fn next_row(&mut self) -> Result<bool, DriverError> {
        let next = self.current.map_or(0, |c| c + 1);
        self.current = Some(next);

        Ok(next < self.rows.len())
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
            .map(|i| i + 1)
    }

    fn value(&self, index: usize) -> Result<SqlValue, DriverError> {
        self.current
            .and_then(|row| self.rows.get(row))
            .and_then(|row| row.get(index.checked_sub(1)?))
            .cloned()
            .ok_or_else(|| {
                DriverError::new(
                    DriverErrorKind::Other,
                    format!("no value at column {index}"),
                )
            })
    }
}
