//! Conversion between engine values and SQLite values.
//!
//! Parameters are bound by reference, so text and blobs are never copied on
//! the way in. Text read back is decoded lossily; SQLite does not enforce
//! UTF-8 on stored text.

use protean_core::SqlValue;
use rusqlite::types::{ToSqlOutput, ValueRef};

/// Borrows an engine value as a bindable SQLite value.
pub(crate) fn to_sql(value: &SqlValue) -> ToSqlOutput<'_> {
    ToSqlOutput::Borrowed(match value {
        SqlValue::Null => ValueRef::Null,
        SqlValue::Integer(n) => ValueRef::Integer(*n),
        SqlValue::Real(n) => ValueRef::Real(*n),
        SqlValue::Text(text) => ValueRef::Text(text.as_bytes()),
        SqlValue::Blob(bytes) => ValueRef::Blob(bytes),
    })
}

/// Copies a column value out of a result row.
pub(crate) fn from_sql(value: ValueRef<'_>) -> SqlValue {
    match value {
        ValueRef::Null => SqlValue::Null,
        ValueRef::Integer(n) => SqlValue::Integer(n),
        ValueRef::Real(n) => SqlValue::Real(n),
        ValueRef::Text(bytes) => SqlValue::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => SqlValue::Blob(bytes.to_vec()),
    }
}

/// Reports a driver failure through the engine's error type.
pub(crate) fn driver_error(err: rusqlite::Error) -> protean_core::Error {
    protean_core::Error::database(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn echo(value: SqlValue) -> SqlValue {
        let conn = Connection::open_in_memory().unwrap();
        conn.query_row("SELECT ?1", [to_sql(&value)], |row| Ok(from_sql(row.get_ref(0)?)))
            .unwrap()
    }

    #[test]
    fn test_values_pass_through_sqlite() {
        for value in [
            SqlValue::Null,
            SqlValue::Integer(i64::MIN),
            SqlValue::Real(-0.25),
            SqlValue::Text("héllo \"quoted\" 'single'".to_string()),
            SqlValue::Text(String::new()),
            SqlValue::Blob(vec![0, 255, 7]),
        ] {
            assert_eq!(echo(value.clone()), value);
        }
    }

    #[test]
    fn test_driver_error_is_database_error() {
        let conn = Connection::open_in_memory().unwrap();
        let err = conn.execute_batch("NOT SQL").unwrap_err();
        assert!(matches!(driver_error(err), protean_core::Error::Database(_)));
    }
}
