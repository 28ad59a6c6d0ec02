//! The database adapter contract.
//!
//! The engine never talks to a driver directly. Any SQL engine with
//! parameterized execution and table introspection can back a collection by
//! implementing [`Database`].

use crate::error::Result;
use crate::value::SqlValue;

/// One row of table introspection output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    /// Column name as stored.
    pub name: String,
    /// Declared type text, e.g. `TEXT` or `INTEGER`. May be empty.
    pub declared_type: String,
    /// Whether the column is declared `NOT NULL`.
    pub not_null: bool,
    /// Whether the column is (part of) the primary key.
    pub primary_key: bool,
}

/// Result set of a parameterized statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rows {
    /// Column names in result order.
    pub columns: Vec<String>,
    /// Row tuples, each aligned with `columns`.
    pub rows: Vec<Vec<SqlValue>>,
}

/// Operations a collection needs from its database.
///
/// Errors are reported as [`Error::Database`](crate::Error::Database) and
/// surfaced to the caller unmodified.
pub trait Database {
    /// Executes a statement without parameters or results (DDL).
    fn run(&self, sql: &str) -> Result<()>;

    /// Executes a parameterized statement and returns its rows.
    fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<Rows>;

    /// Describes the columns of `table`. An empty list means the table does
    /// not exist.
    fn table_info(&self, table: &str) -> Result<Vec<ColumnInfo>>;
}

impl<D: Database + ?Sized> Database for &D {
    fn run(&self, sql: &str) -> Result<()> {
        (**self).run(sql)
    }

    fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<Rows> {
        (**self).execute(sql, params)
    }

    fn table_info(&self, table: &str) -> Result<Vec<ColumnInfo>> {
        (**self).table_info(table)
    }
}

impl<D: Database + ?Sized> Database for Box<D> {
    fn run(&self, sql: &str) -> Result<()> {
        (**self).run(sql)
    }

    fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<Rows> {
        (**self).execute(sql, params)
    }

    fn table_info(&self, table: &str) -> Result<Vec<ColumnInfo>> {
        (**self).table_info(table)
    }
}
