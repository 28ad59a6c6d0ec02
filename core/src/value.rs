//! Application and stored value representations.
//!
//! [`Value`] is the structural shape a caller hands to a collection and gets
//! back from it. [`SqlValue`] is what actually crosses the adapter boundary:
//! bound parameters going in, row cells coming out. Fields translate between
//! the two (see [`Field::cast`](crate::Field::cast) and
//! [`Field::parse`](crate::Field::parse)).

use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;

/// A record: field name to value, in insertion order.
///
/// Used for models passed to `insert`/`update`, for search objects passed to
/// `find`, and for every row returned by a read.
pub type Record = IndexMap<String, Value>;

/// Runtime shape of an application value.
///
/// Nested contents of arrays and objects are kept as JSON values so they
/// survive their textual storage form unchanged.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Real(f64),
    Text(String),
    Date(DateTime<Utc>),
    Array(Vec<serde_json::Value>),
    Object(serde_json::Map<String, serde_json::Value>),
}

impl Value {
    /// Returns `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Converts this value into plain JSON. Dates become RFC 3339 strings.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Integer(n) => serde_json::Value::from(*n),
            Self::Real(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Self::Text(s) => serde_json::Value::String(s.clone()),
            Self::Date(d) => serde_json::Value::String(format_date(d)),
            Self::Array(items) => serde_json::Value::Array(items.clone()),
            Self::Object(map) => serde_json::Value::Object(map.clone()),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Integer(i),
                None => Self::Real(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Self::Text(s),
            serde_json::Value::Array(items) => Self::Array(items),
            serde_json::Value::Object(map) => Self::Object(map),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Date(value)
    }
}

/// Builds a [`Record`] from a JSON object. Returns `None` for any other JSON.
///
/// # Examples
///
/// ```
/// use protean_core::{Value, record_from_json};
///
/// let record = record_from_json(serde_json::json!({"name": "Ana", "age": 30})).unwrap();
/// assert_eq!(record["age"], Value::Integer(30));
/// assert!(record_from_json(serde_json::json!([1, 2])).is_none());
/// ```
pub fn record_from_json(value: serde_json::Value) -> Option<Record> {
    match value {
        serde_json::Value::Object(map) => Some(
            map.into_iter()
                .map(|(name, value)| (name, Value::from(value)))
                .collect(),
        ),
        _ => None,
    }
}

/// Converts a [`Record`] into a JSON object.
pub fn record_to_json(record: &Record) -> serde_json::Value {
    serde_json::Value::Object(
        record
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect(),
    )
}

/// A value as bound to, or read from, the database.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SqlValue {
    #[default]
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl SqlValue {
    /// Converts a stored value without any field information.
    ///
    /// Used for columns the field map does not know about.
    pub fn into_value(self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Integer(n) => Value::Integer(n),
            Self::Real(n) => Value::Real(n),
            Self::Text(s) => Value::Text(s),
            Self::Blob(bytes) => Value::Array(bytes.into_iter().map(serde_json::Value::from).collect()),
        }
    }
}

/// Formats a date the way it is stored: RFC 3339, UTC, sub-seconds only when present.
pub(crate) fn format_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Parses a stored date. Accepts any RFC 3339 offset and normalizes to UTC.
pub(crate) fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|date| date.with_timezone(&Utc))
}
