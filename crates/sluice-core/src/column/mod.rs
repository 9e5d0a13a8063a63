//! Module: column
//! Responsibility: runtime read/write functions called by generated binders.
//! Does not own: binder resolution (done at generation time).
//!
//! Invariants:
//! - A negative column index reads as the type's default without touching the row.
//! - SQL NULL read through a non-nullable binder yields the default.
//! - Bind indices are handed out by `ArgCursor` in strictly increasing order.

#[cfg(test)]
mod tests;

use crate::{
    driver::{Rows, Statement},
    error::DataAccessError,
    model::SqlType,
    value::SqlValue,
};

///
/// ToColumn
/// Converts a borrowed value into a bindable `SqlValue`.
///

pub trait ToColumn {
    fn to_sql(&self) -> SqlValue;
}

///
/// ColumnScalar
/// Fixed storage class and default for every primitive column type.
///

pub trait ColumnScalar: Sized {
    const SQL_TYPE: SqlType;

    fn default_value() -> Self;
}

///
/// FromColumn
///

pub trait FromColumn: ColumnScalar {
    fn from_sql(value: SqlValue) -> Result<Self, DataAccessError>;
}

macro_rules! impl_column_scalar {
    ($( ($ty:ty, $kind:ident, $sql:ident, [$($name:literal),*], $default:expr) ),* $(,)?) => {
        $(
            impl ColumnScalar for $ty {
                const SQL_TYPE: SqlType = SqlType::$sql;

                fn default_value() -> Self {
                    $default
                }
            }
        )*
    };
}

crate::scalar_registry_entries!(impl_column_scalar);

fn mismatch<T>(expected: &str, value: &SqlValue) -> Result<T, DataAccessError> {
    Err(DataAccessError::conversion(format!(
        "cannot read {} value as {expected}",
        value.kind()
    )))
}

impl<T: ToColumn + ?Sized> ToColumn for &T {
    fn to_sql(&self) -> SqlValue {
        (**self).to_sql()
    }
}

// bool

impl ToColumn for bool {
    fn to_sql(&self) -> SqlValue {
        SqlValue::Integer(i64::from(*self))
    }
}

impl FromColumn for bool {
    fn from_sql(value: SqlValue) -> Result<Self, DataAccessError> {
        match value {
            SqlValue::Null => Ok(Self::default_value()),
            SqlValue::Integer(v) => Ok(v != 0),
            other => mismatch("bool", &other),
        }
    }
}

// integers

macro_rules! impl_integer_column {
    ($($ty:ty),*) => {
        $(
            impl ToColumn for $ty {
                fn to_sql(&self) -> SqlValue {
                    SqlValue::Integer(i64::from(*self))
                }
            }

            impl FromColumn for $ty {
                fn from_sql(value: SqlValue) -> Result<Self, DataAccessError> {
                    match value {
                        SqlValue::Null => Ok(Self::default_value()),
                        SqlValue::Integer(v) => Self::try_from(v).map_err(|_| {
                            DataAccessError::conversion(format!(
                                "integer {v} out of range for {}",
                                stringify!($ty)
                            ))
                        }),
                        other => mismatch(stringify!($ty), &other),
                    }
                }
            }
        )*
    };
}

impl_integer_column!(i8, i16, i32, i64);

// floats

impl ToColumn for f32 {
    fn to_sql(&self) -> SqlValue {
        SqlValue::Real(f64::from(*self))
    }
}

impl ToColumn for f64 {
    fn to_sql(&self) -> SqlValue {
        SqlValue::Real(*self)
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
impl FromColumn for f32 {
    fn from_sql(value: SqlValue) -> Result<Self, DataAccessError> {
        match value {
            SqlValue::Null => Ok(Self::default_value()),
            SqlValue::Real(v) => Ok(v as Self),
            SqlValue::Integer(v) => Ok(v as Self),
            other => mismatch("f32", &other),
        }
    }
}

#[allow(clippy::cast_precision_loss)]
impl FromColumn for f64 {
    fn from_sql(value: SqlValue) -> Result<Self, DataAccessError> {
        match value {
            SqlValue::Null => Ok(Self::default_value()),
            SqlValue::Real(v) => Ok(v),
            SqlValue::Integer(v) => Ok(v as Self),
            other => mismatch("f64", &other),
        }
    }
}

// text

impl ToColumn for str {
    fn to_sql(&self) -> SqlValue {
        SqlValue::Text(self.to_owned())
    }
}

impl ToColumn for String {
    fn to_sql(&self) -> SqlValue {
        SqlValue::Text(self.clone())
    }
}

impl FromColumn for String {
    fn from_sql(value: SqlValue) -> Result<Self, DataAccessError> {
        match value {
            SqlValue::Null => Ok(Self::default_value()),
            SqlValue::Text(v) => Ok(v),
            other => mismatch("text", &other),
        }
    }
}

// blob

impl ToColumn for [u8] {
    fn to_sql(&self) -> SqlValue {
        SqlValue::Blob(self.to_vec())
    }
}

impl ToColumn for Vec<u8> {
    fn to_sql(&self) -> SqlValue {
        SqlValue::Blob(self.clone())
    }
}

impl FromColumn for Vec<u8> {
    fn from_sql(value: SqlValue) -> Result<Self, DataAccessError> {
        match value {
            SqlValue::Null => Ok(Self::default_value()),
            SqlValue::Blob(v) => Ok(v),
            SqlValue::Text(v) => Ok(v.into_bytes()),
            other => mismatch("blob", &other),
        }
    }
}

///
/// ArgCursor
/// Hands out 1-based bind indices across one statement execution.
///

#[derive(Debug)]
pub struct ArgCursor {
    next: usize,
}

impl ArgCursor {
    #[must_use]
    pub const fn new() -> Self {
        Self { next: 1 }
    }

    pub const fn advance(&mut self) -> usize {
        let index = self.next;
        self.next += 1;

        index
    }

    /// Number of indices handed out so far.
    #[must_use]
    pub const fn bound(&self) -> usize {
        self.next - 1
    }
}

impl Default for ArgCursor {
    fn default() -> Self {
        Self::new()
    }
}

/// Bind a value through its primitive binder.
pub fn write<S, V>(statement: &mut S, index: usize, value: &V) -> Result<(), DataAccessError>
where
    S: Statement,
    V: ToColumn + ?Sized,
{
    statement.bind(index, value.to_sql())?;

    Ok(())
}

/// Bind an optional value, writing SQL NULL for `None`.
pub fn write_nullable<S, V>(
    statement: &mut S,
    index: usize,
    value: &Option<V>,
) -> Result<(), DataAccessError>
where
    S: Statement,
    V: ToColumn,
{
    match value {
        Some(value) => write(statement, index, value),
        None => {
            statement.bind(index, SqlValue::Null)?;

            Ok(())
        }
    }
}

/// Read the current row's column, or the default for a negative index.
pub fn read<R, V>(rows: &R, index: isize) -> Result<V, DataAccessError>
where
    R: Rows,
    V: FromColumn,
{
    let Ok(index) = usize::try_from(index) else {
        return Ok(V::default_value());
    };

    V::from_sql(rows.value(index)?)
}

/// Read an optional column.
///
/// When `nullable` is false the read delegates to the primitive binder and
/// wraps the result; otherwise SQL NULL reads as `None`.
pub fn read_nullable<R, V>(rows: &R, index: isize, nullable: bool) -> Result<Option<V>, DataAccessError>
where
    R: Rows,
    V: FromColumn,
{
    if !nullable {
        return read(rows, index).map(Some);
    }

    let Ok(index) = usize::try_from(index) else {
        return Ok(None);
    };

    match rows.value(index)? {
        SqlValue::Null => Ok(None),
        value => V::from_sql(value).map(Some),
    }
}

/// Resolve a column by name, `-1` when the result set lacks it.
pub fn column_index<R: Rows>(rows: &R, name: &str) -> isize {
    rows.column_index(name)
        .and_then(|index| isize::try_from(index).ok())
        .unwrap_or(-1)
}

/// The key generated by the last insert, or a not-found error.
pub fn require_generated_key<S: Statement>(statement: &S) -> Result<i64, DataAccessError> {
    statement
        .generated_key()?
        .ok_or_else(DataAccessError::no_generated_key)
}
