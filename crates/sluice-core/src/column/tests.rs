use super::*;
use crate::driver::{
    DriverError,
    mock::{MockDriver, MockRows},
    Connection, Driver,
};

///
/// UntouchableRows
/// Panics if any value is read.
///

struct UntouchableRows;

impl Rows for UntouchableRows {
    fn next_row(&mut self) -> Result<bool, DriverError> {
        Ok(true)
    }

    fn column_index(&self, _name: &str) -> Option<usize> {
        None
    }

    fn value(&self, index: usize) -> Result<SqlValue, DriverError> {
        panic!("row touched at column {index}");
    }
}

fn rows_with(values: Vec<SqlValue>) -> MockRows {
    let columns = (1..=values.len()).map(|i| format!("c{i}")).collect();
    let mut rows = MockRows::new(columns, vec![values]);
    assert!(rows.next_row().unwrap());

    rows
}

// Bind through `write`, then hand the bound values back as one row.
fn round_trip<V: ToColumn + FromColumn>(value: &V) -> V {
    let (driver, log) = MockDriver::new();
    let conn = driver.connect().unwrap();
    let mut stmt = conn.prepare("SELECT ?").unwrap();

    write(&mut stmt, 1, value).unwrap();
    stmt.execute_update().unwrap();

    let binds = log.executions().remove(0).binds;
    read(&rows_with(binds), 1).unwrap()
}

#[test]
fn every_scalar_survives_write_then_read() {
    assert!(round_trip(&true));
    assert!(!round_trip(&false));
    assert_eq!(round_trip(&-7_i8), -7);
    assert_eq!(round_trip(&i16::MAX), i16::MAX);
    assert_eq!(round_trip(&i32::MIN), i32::MIN);
    assert_eq!(round_trip(&i64::MAX), i64::MAX);
    assert!((round_trip(&1.5_f32) - 1.5).abs() < f32::EPSILON);
    assert!((round_trip(&-2.25_f64) + 2.25).abs() < f64::EPSILON);
    assert_eq!(round_trip(&"hello".to_string()), "hello");
    assert_eq!(round_trip(&vec![0_u8, 1, 255]), vec![0, 1, 255]);
}

#[test]
fn negative_index_yields_default_without_touching_row() {
    let rows = UntouchableRows;

    assert_eq!(read::<_, i64>(&rows, -1).unwrap(), 0);
    assert_eq!(read::<_, i8>(&rows, -1).unwrap(), 0);
    assert!(!read::<_, bool>(&rows, -1).unwrap());
    assert!(read::<_, f64>(&rows, -1).unwrap().abs() < f64::EPSILON);
    assert_eq!(read::<_, String>(&rows, -1).unwrap(), String::new());
    assert!(read::<_, Vec<u8>>(&rows, -1).unwrap().is_empty());
    assert_eq!(read_nullable::<_, i32>(&rows, -1, true).unwrap(), None);
    assert_eq!(read_nullable::<_, i32>(&rows, -1, false).unwrap(), Some(0));
}

#[test]
fn nullable_write_binds_null_for_none() {
    let (driver, log) = MockDriver::new();
    let conn = driver.connect().unwrap();
    let mut stmt = conn.prepare("UPDATE t SET a = ?, b = ?").unwrap();

    write_nullable(&mut stmt, 1, &None::<i64>).unwrap();
    write_nullable(&mut stmt, 2, &Some("x")).unwrap();
    stmt.execute_update().unwrap();

    let binds = log.executions().remove(0).binds;
    assert_eq!(binds, vec![SqlValue::Null, SqlValue::Text("x".into())]);
}

#[test]
fn nullable_read_distinguishes_null_only_when_requested() {
    let rows = rows_with(vec![SqlValue::Null]);

    assert_eq!(read_nullable::<_, i64>(&rows, 1, true).unwrap(), None);
    assert_eq!(read_nullable::<_, i64>(&rows, 1, false).unwrap(), Some(0));
}

#[test]
fn out_of_range_integer_is_a_conversion_error() {
    let rows = rows_with(vec![SqlValue::Integer(300)]);
    let err = read::<_, i8>(&rows, 1).unwrap_err();

    assert_eq!(err.class, crate::error::ErrorClass::Conversion);
}

#[test]
fn text_cannot_read_as_integer() {
    let rows = rows_with(vec![SqlValue::Text("nope".into())]);

    assert!(read::<_, i64>(&rows, 1).is_err());
}

#[test]
fn column_index_is_minus_one_when_absent() {
    let rows = rows_with(vec![SqlValue::Integer(1)]);

    assert_eq!(column_index(&rows, "c1"), 1);
    assert_eq!(column_index(&rows, "missing"), -1);
}

#[test]
fn arg_cursor_counts_from_one() {
    let mut args = ArgCursor::new();

    assert_eq!(args.advance(), 1);
    assert_eq!(args.advance(), 2);
    assert_eq!(args.bound(), 2);
}

#[test]
fn scalar_sql_types_follow_the_registry() {
    assert_eq!(<i64 as ColumnScalar>::SQL_TYPE, SqlType::BigInt);
    assert_eq!(<String as ColumnScalar>::SQL_TYPE, SqlType::Text);
    assert_eq!(<Vec<u8> as ColumnScalar>::SQL_TYPE, SqlType::Blob);
}
