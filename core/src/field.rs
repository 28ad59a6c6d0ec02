//! Typed column descriptors.
//!
//! A [`Field`] knows the kind of data its column holds and converts values in
//! both directions: [`cast`](Field::cast) turns an application [`Value`] into
//! the [`SqlValue`] that gets bound, and [`parse`](Field::parse) reverses it.
//!
//! # Round-trip guarantees
//!
//! For every kind, `parse(cast(v)) == v` holds for values valid for the kind:
//! - dates are stored as RFC 3339 text in UTC with sub-second digits only when
//!   present, so no precision is lost
//! - objects and arrays are stored as JSON text, and any value written to
//!   them is serialized as JSON, so it reads back as itself
//! - booleans are stored as `0`/`1`

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::value::{SqlValue, Value, format_date, parse_date};

/// Name of the reserved primary-key field.
pub const ID_FIELD: &str = "id";

/// Storage kind of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    String,
    Number,
    Boolean,
    Date,
    Object,
    Array,
    /// Auto-incrementing integer primary key. Never part of a user schema.
    Id,
}

impl FieldKind {
    /// Lowercase tag of the kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Object => "object",
            Self::Array => "array",
            Self::Id => "id",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Descriptor for one column.
///
/// # Examples
///
/// ```
/// use protean_core::{Field, FieldKind, SqlValue, Value};
///
/// let field = Field::new(FieldKind::Boolean);
/// let stored = field.cast(&Value::Bool(true)).unwrap();
/// assert_eq!(stored, SqlValue::Integer(1));
/// assert_eq!(field.parse(stored).unwrap(), Value::Bool(true));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    kind: FieldKind,
    not_null: bool,
    default: Option<Value>,
}

impl Field {
    /// Creates a nullable field of the given kind.
    pub fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            not_null: false,
            default: None,
        }
    }

    /// The reserved primary-key field.
    pub fn id() -> Self {
        Self::new(FieldKind::Id)
    }

    /// Marks the column `NOT NULL`.
    pub fn with_not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    /// Sets the column default.
    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn not_null(&self) -> bool {
        self.not_null
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Converts an application value into the value bound as a parameter.
    ///
    /// Objects and arrays take any non-null value and store its JSON text.
    /// Dates take dates, RFC 3339 text (normalized to UTC) or epoch
    /// milliseconds. Other kinds store the value by shape and let the column
    /// affinity decide.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidValue`] for a date column given anything that
    /// is not a date, so nothing unreadable is ever written.
    pub fn cast(&self, value: &Value) -> Result<SqlValue> {
        match (self.kind, value) {
            (_, Value::Null) => Ok(SqlValue::Null),
            (FieldKind::Object | FieldKind::Array, value) => {
                Ok(SqlValue::Text(value.to_json().to_string()))
            }
            (FieldKind::Date, Value::Date(date)) => Ok(SqlValue::Text(format_date(date))),
            (FieldKind::Date, Value::Text(text)) => parse_date(text)
                .map(|date| SqlValue::Text(format_date(&date)))
                .ok_or_else(|| {
                    Error::invalid_value(FieldKind::Date, format!("not an RFC 3339 date: {text}"))
                }),
            (FieldKind::Date, Value::Integer(millis)) => {
                chrono::DateTime::from_timestamp_millis(*millis)
                    .map(|date| SqlValue::Text(format_date(&date)))
                    .ok_or_else(|| {
                        Error::invalid_value(
                            FieldKind::Date,
                            format!("timestamp out of range: {millis}"),
                        )
                    })
            }
            (FieldKind::Date, other) => Err(Error::invalid_value(
                FieldKind::Date,
                format!("expected a date, found {}", other.to_json()),
            )),
            (_, Value::Bool(b)) => Ok(SqlValue::Integer(i64::from(*b))),
            (_, Value::Integer(n)) => Ok(SqlValue::Integer(*n)),
            (_, Value::Real(n)) => Ok(SqlValue::Real(*n)),
            (_, Value::Text(s)) => Ok(SqlValue::Text(s.clone())),
            (_, Value::Date(d)) => Ok(SqlValue::Text(format_date(d))),
            (_, value @ (Value::Array(_) | Value::Object(_))) => {
                Ok(SqlValue::Text(value.to_json().to_string()))
            }
        }
    }

    /// Converts a stored value back into its application shape.
    ///
    /// Object and array columns hold JSON text; a document of another shape
    /// (written from a mismatched value) comes back as the matching
    /// [`Value`], so the row stays readable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Deserialization`] when a date, object or array column
    /// holds content that does not parse back, or a blob.
    pub fn parse(&self, stored: SqlValue) -> Result<Value> {
        match (self.kind, stored) {
            (_, SqlValue::Null) => Ok(Value::Null),
            (
                kind @ (FieldKind::Date | FieldKind::Object | FieldKind::Array),
                SqlValue::Blob(_),
            ) => Err(Error::deserialization(kind, "unexpected blob")),
            (FieldKind::Date, SqlValue::Text(text)) => parse_date(&text)
                .map(Value::Date)
                .ok_or_else(|| {
                    Error::deserialization(FieldKind::Date, format!("not an RFC 3339 date: {text}"))
                }),
            (FieldKind::Date, SqlValue::Integer(millis)) => {
                chrono::DateTime::from_timestamp_millis(millis)
                    .map(Value::Date)
                    .ok_or_else(|| {
                        Error::deserialization(
                            FieldKind::Date,
                            format!("timestamp out of range: {millis}"),
                        )
                    })
            }
            (FieldKind::Date, SqlValue::Real(n)) => Err(Error::deserialization(
                FieldKind::Date,
                format!("unexpected number {n}"),
            )),
            (kind @ (FieldKind::Object | FieldKind::Array), SqlValue::Text(text)) => {
                Ok(Value::from(parse_json(kind, &text)?))
            }
            (kind @ (FieldKind::Object | FieldKind::Array), other) => Err(Error::deserialization(
                kind,
                format!("expected JSON text, found {other:?}"),
            )),
            (FieldKind::Boolean, SqlValue::Integer(n)) => Ok(Value::Bool(n != 0)),
            (FieldKind::Boolean, SqlValue::Text(text)) => match text.as_str() {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Ok(Value::Text(text)),
            },
            (_, other) => Ok(other.into_value()),
        }
    }
}

fn parse_json(kind: FieldKind, text: &str) -> Result<serde_json::Value> {
    serde_json::from_str(text).map_err(|e| Error::deserialization(kind, e.to_string()))
}
