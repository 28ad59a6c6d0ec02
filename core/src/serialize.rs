//! Mapping between fields and column declarations.
//!
//! Covers both directions: fields to column definitions for `CREATE TABLE`
//! and `ALTER TABLE ... ADD COLUMN`, and introspection rows back to fields.
//!
//! # Column types
//!
//! | Kind      | Declared type |
//! |-----------|---------------|
//! | `string`  | `TEXT`        |
//! | `number`  | `INTEGER`     |
//! | `boolean` | `BOOLEAN`     |
//! | `date`    | `DATETIME`    |
//! | `object`  | `OBJECT`      |
//! | `array`   | `ARRAY`       |
//! | `id`      | `INTEGER`     |
//!
//! Dates, objects and arrays are bound as text. Their serialized forms never
//! look numeric, so SQLite stores them as TEXT whatever the column affinity.

use crate::adapter::ColumnInfo;
use crate::config::MissingValuePolicy;
use crate::error::{Error, Result};
use crate::field::{Field, FieldKind};
use crate::value::SqlValue;
use crate::FieldMap;

/// Column name for a field. Identity; the single place to hook a naming
/// convention.
pub fn column_name<'a>(name: &'a str, _field: &Field) -> &'a str {
    name
}

/// Declared SQL type for a kind.
pub fn sql_type(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::String => "TEXT",
        FieldKind::Number | FieldKind::Id => "INTEGER",
        FieldKind::Boolean => "BOOLEAN",
        FieldKind::Date => "DATETIME",
        FieldKind::Object => "OBJECT",
        FieldKind::Array => "ARRAY",
    }
}

/// Closest kind for a declared column type.
///
/// Exact names written by [`sql_type`] map back to their kind; anything else
/// follows SQLite's affinity rules, with `BOOL`, `DATE`/`TIME` and `JSON`
/// recognized on top. Unknown or empty types read as strings.
pub fn kind_from_declared_type(declared: &str) -> FieldKind {
    let upper = declared.trim().to_ascii_uppercase();
    match upper.as_str() {
        "TEXT" => return FieldKind::String,
        "INTEGER" | "REAL" => return FieldKind::Number,
        "BOOLEAN" => return FieldKind::Boolean,
        "DATETIME" => return FieldKind::Date,
        "OBJECT" => return FieldKind::Object,
        "ARRAY" => return FieldKind::Array,
        _ => {}
    }

    let has = |needle: &str| upper.contains(needle);
    if has("INT") {
        FieldKind::Number
    } else if has("CHAR") || has("CLOB") || has("TEXT") {
        FieldKind::String
    } else if has("BOOL") {
        FieldKind::Boolean
    } else if has("DATE") || has("TIME") {
        FieldKind::Date
    } else if has("REAL") || has("FLOA") || has("DOUB") || has("NUM") || has("DEC") {
        FieldKind::Number
    } else if has("JSON") {
        FieldKind::Object
    } else {
        FieldKind::String
    }
}

/// Checks that a name can be used as a quoted SQL identifier.
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() || name.contains('\0') {
        return Err(Error::InvalidIdentifier(name.to_string()));
    }
    Ok(())
}

/// Double-quotes an identifier, doubling embedded quotes.
///
/// # Examples
///
/// ```
/// use protean_core::quote_ident;
///
/// assert_eq!(quote_ident("name"), r#""name""#);
/// assert_eq!(quote_ident(r#"a"b"#), r#""a""b""#);
/// ```
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Renders a stored value as an SQL literal. Only used for DDL defaults,
/// which cannot be bound as parameters.
pub(crate) fn sql_literal(value: &SqlValue) -> String {
    match value {
        SqlValue::Null => "NULL".to_string(),
        SqlValue::Integer(n) => n.to_string(),
        SqlValue::Real(n) if n.is_finite() => format!("{n:?}"),
        SqlValue::Real(_) => "NULL".to_string(),
        SqlValue::Text(s) => format!("'{}'", s.replace('\'', "''")),
        SqlValue::Blob(bytes) => {
            let hex: String = bytes.iter().map(|b| format!("{b:02X}")).collect();
            format!("X'{hex}'")
        }
    }
}

/// Empty stored value of a kind, used by [`MissingValuePolicy::KindDefault`].
fn kind_default(kind: FieldKind) -> Option<SqlValue> {
    match kind {
        FieldKind::String => Some(SqlValue::Text(String::new())),
        FieldKind::Number | FieldKind::Boolean => Some(SqlValue::Integer(0)),
        FieldKind::Date => Some(SqlValue::Text("1970-01-01T00:00:00Z".to_string())),
        FieldKind::Object => Some(SqlValue::Text("{}".to_string())),
        FieldKind::Array => Some(SqlValue::Text("[]".to_string())),
        FieldKind::Id => None,
    }
}

/// Builds the column clause for a field: quoted name, type, nullability and
/// default.
///
/// # Errors
///
/// Returns [`Error::InvalidIdentifier`] if the column name is unusable, or
/// [`Error::InvalidValue`] if the default does not fit the field.
pub fn column_definition(name: &str, field: &Field, policy: MissingValuePolicy) -> Result<String> {
    let column = column_name(name, field);
    validate_identifier(column)?;

    let mut definition = format!("{} {}", quote_ident(column), sql_type(field.kind()));
    if field.not_null() {
        definition.push_str(" NOT NULL");
    }

    let default = match field.default_value() {
        Some(value) => Some(field.cast(value)?),
        None if policy == MissingValuePolicy::KindDefault => kind_default(field.kind()),
        None => None,
    };
    if let Some(default) = default {
        definition.push_str(" DEFAULT ");
        definition.push_str(&sql_literal(&default));
    }

    Ok(definition)
}

/// Reconstructs a field map from table introspection rows.
///
/// The primary key column becomes the reserved `id` field. An empty input
/// (table does not exist) yields an empty map.
pub fn parse_field_list_from_db(columns: &[ColumnInfo]) -> FieldMap {
    columns
        .iter()
        .map(|column| {
            let field = if column.primary_key {
                Field::id()
            } else {
                let field = Field::new(kind_from_declared_type(&column.declared_type));
                if column.not_null {
                    field.with_not_null()
                } else {
                    field
                }
            };
            (column.name.clone(), field)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn column(name: &str, declared_type: &str, not_null: bool, primary_key: bool) -> ColumnInfo {
        ColumnInfo {
            name: name.to_string(),
            declared_type: declared_type.to_string(),
            not_null,
            primary_key,
        }
    }

    #[test]
    fn test_declared_types_map_back_to_kinds() {
        for kind in [
            FieldKind::String,
            FieldKind::Number,
            FieldKind::Boolean,
            FieldKind::Date,
            FieldKind::Object,
            FieldKind::Array,
        ] {
            assert_eq!(kind_from_declared_type(sql_type(kind)), kind);
        }
    }

    #[test]
    fn test_affinity_fallbacks() {
        assert_eq!(kind_from_declared_type("varchar(255)"), FieldKind::String);
        assert_eq!(kind_from_declared_type("BIGINT"), FieldKind::Number);
        assert_eq!(kind_from_declared_type("DOUBLE PRECISION"), FieldKind::Number);
        assert_eq!(kind_from_declared_type("decimal(10,2)"), FieldKind::Number);
        assert_eq!(kind_from_declared_type("bool"), FieldKind::Boolean);
        assert_eq!(kind_from_declared_type("TIMESTAMP"), FieldKind::Date);
        assert_eq!(kind_from_declared_type("JSONB"), FieldKind::Object);
        assert_eq!(kind_from_declared_type(""), FieldKind::String);
        assert_eq!(kind_from_declared_type("BLOB"), FieldKind::String);
    }

    #[test]
    fn test_column_definition_plain() {
        let field = Field::new(FieldKind::String);
        assert_eq!(
            column_definition("name", &field, MissingValuePolicy::Null).unwrap(),
            r#""name" TEXT"#
        );
    }

    #[test]
    fn test_column_definition_not_null_with_default() {
        let field = Field::new(FieldKind::String)
            .with_not_null()
            .with_default(Value::from("it's"));
        assert_eq!(
            column_definition("title", &field, MissingValuePolicy::Null).unwrap(),
            r#""title" TEXT NOT NULL DEFAULT 'it''s'"#
        );
    }

    #[test]
    fn test_column_definition_kind_defaults() {
        let policy = MissingValuePolicy::KindDefault;
        assert_eq!(
            column_definition("n", &Field::new(FieldKind::Number), policy).unwrap(),
            r#""n" INTEGER DEFAULT 0"#
        );
        assert_eq!(
            column_definition("tags", &Field::new(FieldKind::Array), policy).unwrap(),
            r#""tags" ARRAY DEFAULT '[]'"#
        );
        assert_eq!(
            column_definition("at", &Field::new(FieldKind::Date), policy).unwrap(),
            r#""at" DATETIME DEFAULT '1970-01-01T00:00:00Z'"#
        );
    }

    #[test]
    fn test_column_definition_rejects_bad_names() {
        let field = Field::new(FieldKind::String);
        assert!(column_definition("", &field, MissingValuePolicy::Null).is_err());
        assert!(column_definition("a\0b", &field, MissingValuePolicy::Null).is_err());
    }

    #[test]
    fn test_hostile_names_stay_quoted() {
        let field = Field::new(FieldKind::String);
        let definition =
            column_definition(r#"x" TEXT); DROP TABLE t; --"#, &field, MissingValuePolicy::Null).unwrap();
        assert_eq!(definition, r#""x"" TEXT); DROP TABLE t; --" TEXT"#);
    }

    #[test]
    fn test_sql_literals() {
        assert_eq!(sql_literal(&SqlValue::Real(1.5)), "1.5");
        assert_eq!(sql_literal(&SqlValue::Real(2.0)), "2.0");
        assert_eq!(sql_literal(&SqlValue::Real(f64::NAN)), "NULL");
        assert_eq!(sql_literal(&SqlValue::Blob(vec![0xAB, 0x01])), "X'AB01'");
    }

    #[test]
    fn test_parse_field_list_from_db() {
        let fields = parse_field_list_from_db(&[
            column("id", "INTEGER", false, true),
            column("name", "TEXT", true, false),
            column("tags", "ARRAY", false, false),
        ]);
        assert_eq!(fields.len(), 3);
        assert_eq!(fields["id"], Field::id());
        assert_eq!(fields["name"], Field::new(FieldKind::String).with_not_null());
        assert_eq!(fields["tags"].kind(), FieldKind::Array);
        assert_eq!(
            fields.keys().collect::<Vec<_>>(),
            vec!["id", "name", "tags"]
        );
    }

    #[test]
    fn test_parse_field_list_from_empty_table_info() {
        assert!(parse_field_list_from_db(&[]).is_empty());
    }
}
