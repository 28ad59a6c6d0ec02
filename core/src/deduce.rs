//! Field inference from runtime values.
//!
//! Inference is total: every value either maps to a kind or is skipped.
//! Rejecting shapes is the job of schema sources, not of inference.

use crate::field::{Field, FieldKind, ID_FIELD};
use crate::value::{Record, Value};
use crate::FieldMap;

/// Infers the field for a single value, or `None` if the value has no kind.
///
/// `Null` and non-finite reals yield `None`.
pub fn deduce_field(value: &Value) -> Option<Field> {
    let kind = match value {
        Value::Null => return None,
        Value::Real(n) if !n.is_finite() => return None,
        Value::Bool(_) => FieldKind::Boolean,
        Value::Integer(_) | Value::Real(_) => FieldKind::Number,
        Value::Text(_) => FieldKind::String,
        Value::Date(_) => FieldKind::Date,
        Value::Array(_) => FieldKind::Array,
        Value::Object(_) => FieldKind::Object,
    };
    Some(Field::new(kind))
}

/// Infers a field map from a record.
///
/// The `id` property is never inferred; it belongs to the primary key.
/// Inferred fields are nullable, so a later record that omits a property
/// never forces a schema change.
///
/// # Examples
///
/// ```
/// use protean_core::{FieldKind, Value, deduce_fields, record_from_json};
///
/// let record = record_from_json(serde_json::json!({
///     "id": 4, "name": "Ana", "age": 30, "nickname": null
/// })).unwrap();
/// let fields = deduce_fields(&record);
///
/// assert_eq!(fields.len(), 2);
/// assert_eq!(fields["name"].kind(), FieldKind::String);
/// assert_eq!(fields["age"].kind(), FieldKind::Number);
/// ```
pub fn deduce_fields(record: &Record) -> FieldMap {
    record
        .iter()
        .filter(|(name, _)| name.as_str() != ID_FIELD)
        .filter_map(|(name, value)| deduce_field(value).map(|field| (name.clone(), field)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use serde_json::json;

    #[test]
    fn test_deduce_every_shape() {
        let mut record = Record::new();
        record.insert("s".into(), Value::from("x"));
        record.insert("i".into(), Value::Integer(1));
        record.insert("r".into(), Value::Real(1.5));
        record.insert("b".into(), Value::Bool(false));
        record.insert("d".into(), Value::Date(DateTime::UNIX_EPOCH));
        record.insert("a".into(), Value::Array(vec![json!(1)]));
        record.insert("o".into(), Value::Object(serde_json::Map::new()));

        let kinds: Vec<_> = deduce_fields(&record)
            .into_iter()
            .map(|(name, field)| (name, field.kind()))
            .collect();
        assert_eq!(
            kinds,
            vec![
                ("s".to_string(), FieldKind::String),
                ("i".to_string(), FieldKind::Number),
                ("r".to_string(), FieldKind::Number),
                ("b".to_string(), FieldKind::Boolean),
                ("d".to_string(), FieldKind::Date),
                ("a".to_string(), FieldKind::Array),
                ("o".to_string(), FieldKind::Object),
            ]
        );
    }

    #[test]
    fn test_skips_id_null_and_non_finite() {
        let mut record = Record::new();
        record.insert("id".into(), Value::Integer(9));
        record.insert("gone".into(), Value::Null);
        record.insert("nan".into(), Value::Real(f64::NAN));
        record.insert("inf".into(), Value::Real(f64::INFINITY));
        assert!(deduce_fields(&record).is_empty());
    }

    #[test]
    fn test_inferred_fields_are_nullable() {
        let field = deduce_field(&Value::from("x")).unwrap();
        assert!(!field.not_null());
        assert!(field.default_value().is_none());
    }
}
