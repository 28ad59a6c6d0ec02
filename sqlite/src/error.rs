//! Error types for the SQLite adapter.
//!
//! Collection operations report through [`protean_core::Error`]; this type
//! covers the connection-level calls made before a collection exists.

use thiserror::Error;

/// Errors raised while opening or preparing a SQLite database.
#[derive(Debug, Error)]
pub enum SqliteError {
    /// SQLite database operation failure.
    #[error("database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    /// Failure reported by the collection engine.
    #[error(transparent)]
    Collection(#[from] protean_core::Error),
}

/// Convenience alias for results with [`SqliteError`].
pub type Result<T> = std::result::Result<T, SqliteError>;
