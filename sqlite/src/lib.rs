//! SQLite adapter for protean collections.
//!
//! [`SqliteDatabase`] wraps a [`rusqlite::Connection`] and implements
//! [`protean_core::Database`], so any [`Collection`] can store its rows in
//! SQLite.
//!
//! # Quick start
//!
//! ```
//! use protean_core::{Value, record_from_json};
//! use protean_sqlite::SqliteDatabase;
//!
//! let db = SqliteDatabase::open_in_memory().unwrap();
//! let mut people = db.collection("people").unwrap();
//!
//! let ana = record_from_json(serde_json::json!({"name": "Ana", "age": 30})).unwrap();
//! let stored = people.insert(&ana).unwrap();
//! assert_eq!(stored["id"], Value::Integer(1));
//!
//! let found = people.find_by_id(&Value::Integer(1)).unwrap();
//! assert_eq!(found, Some(stored));
//! ```

mod convert;
mod error;

use std::path::Path;

use protean_core::{Collection, CollectionConfig, ColumnInfo, Database, Rows, SqlValue, quote_ident};
use rusqlite::Connection;
use tracing::debug;

use crate::convert::{driver_error, from_sql, to_sql};

pub use error::{Result, SqliteError};

/// A SQLite connection usable as a collection backend.
///
/// The connection is owned; collections borrow the database, so it outlives
/// every collection created from it.
pub struct SqliteDatabase {
    conn: Connection,
}

impl SqliteDatabase {
    /// Wraps an already open connection.
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Opens (or creates) a database file.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::DatabaseError`] if the file cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "opening database");
        Ok(Self::new(Connection::open(path)?))
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::new(Connection::open_in_memory()?))
    }

    /// Creates a collection over `table` with the default configuration.
    pub fn collection(&self, table: &str) -> Result<Collection<'_, Self>> {
        Ok(Collection::new(self, table)?)
    }

    /// Creates a collection over `table` with explicit configuration.
    pub fn collection_with_config(
        &self,
        table: &str,
        config: CollectionConfig,
    ) -> Result<Collection<'_, Self>> {
        Ok(Collection::with_config(self, table, config)?)
    }

    /// The underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Unwraps the underlying connection.
    pub fn into_inner(self) -> Connection {
        self.conn
    }

    fn query(&self, sql: &str, params: &[SqlValue]) -> rusqlite::Result<Rows> {
        let mut stmt = self.conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let mut rows = stmt.query(rusqlite::params_from_iter(params.iter().map(to_sql)))?;
        let mut tuples = Vec::new();
        while let Some(row) = rows.next()? {
            let tuple = (0..columns.len())
                .map(|index| row.get_ref(index).map(from_sql))
                .collect::<rusqlite::Result<Vec<_>>>()?;
            tuples.push(tuple);
        }

        Ok(Rows {
            columns,
            rows: tuples,
        })
    }

    fn columns(&self, table: &str) -> rusqlite::Result<Vec<ColumnInfo>> {
        let mut stmt = self
            .conn
            .prepare(&format!("PRAGMA table_info({})", quote_ident(table)))?;
        let columns = stmt
            .query_map([], |row| {
                Ok(ColumnInfo {
                    name: row.get("name")?,
                    declared_type: row.get("type")?,
                    not_null: row.get("notnull")?,
                    primary_key: row.get::<_, i64>("pk")? > 0,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(columns)
    }
}

impl From<Connection> for SqliteDatabase {
    fn from(conn: Connection) -> Self {
        Self::new(conn)
    }
}

impl std::fmt::Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteDatabase")
            .field("path", &self.conn.path())
            .finish()
    }
}

impl Database for SqliteDatabase {
    fn run(&self, sql: &str) -> protean_core::Result<()> {
        self.conn.execute_batch(sql).map_err(driver_error)
    }

    fn execute(&self, sql: &str, params: &[SqlValue]) -> protean_core::Result<Rows> {
        self.query(sql, params).map_err(driver_error)
    }

    fn table_info(&self, table: &str) -> protean_core::Result<Vec<ColumnInfo>> {
        self.columns(table).map_err(driver_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_info_of_missing_table_is_empty() {
        let db = SqliteDatabase::open_in_memory().unwrap();
        assert!(db.table_info("nothing_here").unwrap().is_empty());
    }

    #[test]
    fn test_table_info_reports_columns() {
        let db = SqliteDatabase::open_in_memory().unwrap();
        db.run(r#"CREATE TABLE "odd ""name""" ("id" INTEGER PRIMARY KEY AUTOINCREMENT, "title" TEXT NOT NULL, "raw")"#)
            .unwrap();

        let columns = db.table_info(r#"odd "name""#).unwrap();
        assert_eq!(
            columns,
            vec![
                ColumnInfo {
                    name: "id".into(),
                    declared_type: "INTEGER".into(),
                    not_null: false,
                    primary_key: true,
                },
                ColumnInfo {
                    name: "title".into(),
                    declared_type: "TEXT".into(),
                    not_null: true,
                    primary_key: false,
                },
                ColumnInfo {
                    name: "raw".into(),
                    declared_type: String::new(),
                    not_null: false,
                    primary_key: false,
                },
            ]
        );
    }

    #[test]
    fn test_execute_binds_parameters_and_names_columns() {
        let db = SqliteDatabase::open_in_memory().unwrap();
        let rows = db
            .execute(
                "SELECT ?1 AS a, ?2 AS b",
                &[SqlValue::Integer(7), SqlValue::Text("x".into())],
            )
            .unwrap();
        assert_eq!(rows.columns, vec!["a", "b"]);
        assert_eq!(
            rows.rows,
            vec![vec![SqlValue::Integer(7), SqlValue::Text("x".into())]]
        );
    }

    #[test]
    fn test_errors_surface_as_database_errors() {
        let db = SqliteDatabase::open_in_memory().unwrap();
        assert!(matches!(
            db.execute("SELECT * FROM missing", &[]),
            Err(protean_core::Error::Database(_))
        ));
        assert!(matches!(db.run("CREATE TABLE"), Err(protean_core::Error::Database(_))));
    }

    #[test]
    fn test_collection_rejects_empty_table_name() {
        let db = SqliteDatabase::open_in_memory().unwrap();
        assert!(matches!(
            db.collection(""),
            Err(SqliteError::Collection(protean_core::Error::InvalidIdentifier(_)))
        ));
    }
}
