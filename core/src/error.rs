//! Error types for schema inference, reconciliation and querying.
//!
//! A single error type covers the failure modes of the engine: schema
//! sources that cannot be mapped, values that do not fit their column,
//! stored values that cannot be parsed back, adapter failures, unusable
//! identifiers and configuration problems.

use thiserror::Error;

use crate::field::FieldKind;

/// Errors that can occur while reconciling or querying a collection.
#[derive(Debug, Error)]
pub enum Error {
    /// A schema source carries a type tag with no field kind.
    #[error("type not supported: {0}")]
    UnsupportedType(String),

    /// A declarative schema document is malformed.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    /// A stored value could not be parsed back into its declared kind.
    #[error("cannot deserialize {kind} value: {reason}")]
    Deserialization { kind: FieldKind, reason: String },

    /// A value cannot be stored in a column of the given kind.
    #[error("cannot store value as {kind}: {reason}")]
    InvalidValue { kind: FieldKind, reason: String },

    /// The database adapter failed to execute a statement.
    #[error("database error: {0}")]
    Database(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A table or column name cannot be used as an SQL identifier.
    #[error("invalid identifier '{0}': must be non-empty and contain no NUL characters")]
    InvalidIdentifier(String),

    /// Configuration could not be read or parsed.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Wraps an adapter-level failure.
    pub fn database(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Database(err.into())
    }

    pub(crate) fn invalid_value(kind: FieldKind, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            kind,
            reason: reason.into(),
        }
    }

    pub(crate) fn deserialization(kind: FieldKind, reason: impl Into<String>) -> Self {
        Self::Deserialization {
            kind,
            reason: reason.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Config(err.to_string())
    }
}

/// Convenience alias for results with [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
