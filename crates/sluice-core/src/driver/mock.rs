//! In-memory driver that records every call, for handler and database tests.

use crate::{
    driver::{Connection, ConnectionMetadata, Driver, DriverError, DriverErrorKind, Rows, Statement},
    value::SqlValue,
};
use std::{
    collections::BTreeMap,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering},
    },
};

///
/// Execution
/// One executed statement with its bindings in index order.
///

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Execution {
    pub sql: String,
    pub binds: Vec<SqlValue>,
}

///
/// MockLog
///

#[derive(Debug, Default)]
pub(crate) struct MockLog {
    pub connects: AtomicUsize,
    pub closes: AtomicUsize,
    pub commits: AtomicUsize,
    pub rollbacks: AtomicUsize,
    pub metadata_probes: AtomicUsize,
    pub no_transactions: AtomicBool,
    pub fail_connect: AtomicBool,
    pub next_key: AtomicI64,
    pub prepared: Mutex<Vec<String>>,
    pub executions: Mutex<Vec<Execution>>,
    pub auto_commit: Mutex<Vec<bool>>,
    pub fail_on: Mutex<Option<(String, DriverErrorKind)>>,
    pub result: Mutex<(Vec<String>, Vec<Vec<SqlValue>>)>,
}

impl MockLog {
    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    pub fn connects(&self) -> usize {
        Self::count(&self.connects)
    }

    pub fn closes(&self) -> usize {
        Self::count(&self.closes)
    }

    pub fn commits(&self) -> usize {
        Self::count(&self.commits)
    }

    pub fn rollbacks(&self) -> usize {
        Self::count(&self.rollbacks)
    }

    pub fn prepared(&self) -> Vec<String> {
        lock(&self.prepared).clone()
    }

    pub fn executions(&self) -> Vec<Execution> {
        lock(&self.executions).clone()
    }

    pub fn auto_commit_changes(&self) -> Vec<bool> {
        lock(&self.auto_commit).clone()
    }

    /// Fail every execution whose SQL contains `needle`.
    pub fn fail_on(&self, needle: &str, kind: DriverErrorKind) {
        *lock(&self.fail_on) = Some((needle.to_string(), kind));
    }

    /// Rows returned by every query from now on.
    pub fn set_result(&self, columns: &[&str], rows: Vec<Vec<SqlValue>>) {
        *lock(&self.result) = (columns.iter().map(ToString::to_string).collect(), rows);
    }

    fn check(&self, sql: &str) -> Result<(), DriverError> {
        match &*lock(&self.fail_on) {
            Some((needle, kind)) if sql.contains(needle.as_str()) => {
                Err(DriverError::new(*kind, format!("mock failure on '{sql}'")))
            }
            _ => Ok(()),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

///
/// MockDriver
///

#[derive(Debug, Default)]
pub(crate) struct MockDriver {
    pub log: Arc<MockLog>,
}

impl MockDriver {
    pub fn new() -> (Self, Arc<MockLog>) {
        let log = Arc::new(MockLog::default());

        (Self { log: Arc::clone(&log) }, log)
    }
}

impl Driver for MockDriver {
    type Connection = MockConnection;

    fn connect(&self) -> Result<MockConnection, DriverError> {
        if self.log.fail_connect.load(Ordering::SeqCst) {
            return Err(DriverError::new(DriverErrorKind::Connection, "mock refused"));
        }
        self.log.connects.fetch_add(1, Ordering::SeqCst);

        Ok(MockConnection {
            log: Arc::clone(&self.log),
        })
    }
}

///
/// MockConnection
///

#[derive(Debug)]
pub(crate) struct MockConnection {
    log: Arc<MockLog>,
}

impl Drop for MockConnection {
    fn drop(&mut self) {
        self.log.closes.fetch_add(1, Ordering::SeqCst);
    }
}

impl Connection for MockConnection {
    type Statement = MockStatement;

    fn prepare(&self, sql: &str) -> Result<MockStatement, DriverError> {
        lock(&self.log.prepared).push(sql.to_string());

        Ok(MockStatement {
            log: Arc::clone(&self.log),
            sql: sql.to_string(),
            binds: BTreeMap::new(),
            last_key: None,
        })
    }

    fn metadata(&self) -> Result<ConnectionMetadata, DriverError> {
        self.log.metadata_probes.fetch_add(1, Ordering::SeqCst);
        let supports = !self.log.no_transactions.load(Ordering::SeqCst);

        Ok(ConnectionMetadata {
            supports_transactions: supports,
            supports_batch: true,
        })
    }

    fn set_auto_commit(&self, auto_commit: bool) -> Result<(), DriverError> {
        lock(&self.log.auto_commit).push(auto_commit);

        Ok(())
    }

    fn commit(&self) -> Result<(), DriverError> {
        self.log.commits.fetch_add(1, Ordering::SeqCst);

        Ok(())
    }

    fn rollback(&self) -> Result<(), DriverError> {
        self.log.rollbacks.fetch_add(1, Ordering::SeqCst);

        Ok(())
    }

    fn execute_batch(&self, sql: &str) -> Result<(), DriverError> {
        self.log.check(sql)?;
        lock(&self.log.executions).push(Execution {
            sql: sql.to_string(),
            binds: Vec::new(),
        });

        Ok(())
    }
}

///
/// MockStatement
///

#[derive(Debug)]
pub(crate) struct MockStatement {
    log: Arc<MockLog>,
    sql: String,
    binds: BTreeMap<usize, SqlValue>,
    last_key: Option<i64>,
}

impl MockStatement {
    fn record(&self) -> Result<(), DriverError> {
        self.log.check(&self.sql)?;
        lock(&self.log.executions).push(Execution {
            sql: self.sql.clone(),
            binds: self.binds.values().cloned().collect(),
        });

        Ok(())
    }
}

impl Statement for MockStatement {
    type Rows = MockRows;

    fn bind(&mut self, index: usize, value: SqlValue) -> Result<(), DriverError> {
        if index == 0 {
            return Err(DriverError::other("bind indices are 1-based"));
        }
        self.binds.insert(index, value);

        Ok(())
    }

    fn clear_bindings(&mut self) {
        self.binds.clear();
    }

    fn execute_update(&mut self) -> Result<u64, DriverError> {
        self.record()?;
        if self.sql.starts_with("INSERT") {
            self.last_key = Some(self.log.next_key.fetch_add(1, Ordering::SeqCst) + 1);
        }

        Ok(1)
    }

    fn execute_query(&mut self) -> Result<MockRows, DriverError> {
        self.record()?;
        let (columns, rows) = lock(&self.log.result).clone();

        Ok(MockRows::new(columns, rows))
    }

    fn generated_key(&self) -> Result<Option<i64>, DriverError> {
        Ok(self.last_key)
    }
}

///
/// MockRows
///

#[derive(Debug)]
pub(crate) struct MockRows {
    columns: Vec<String>,
    rows: Vec<Vec<SqlValue>>,
    current: Option<usize>,
}

impl MockRows {
    pub const fn new(columns: Vec<String>, rows: Vec<Vec<SqlValue>>) -> Self {
        Self {
            columns,
            rows,
            current: None,
        }
    }
}

impl Rows for MockRows {
    fn next_row(&mut self) -> Result<bool, DriverError> {
        let next = self.current.map_or(0, |c| c + 1);
        self.current = Some(next);

        Ok(next < self.rows.len())
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name).map(|i| i + 1)
    }

    fn value(&self, index: usize) -> Result<SqlValue, DriverError> {
        self.current
            .and_then(|row| self.rows.get(row))
            .and_then(|row| row.get(index.wrapping_sub(1)))
            .cloned()
            .ok_or_else(|| DriverError::other(format!("no value at column {index}")))
    }
}
