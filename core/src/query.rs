//! Parameterized statement builders.
//!
//! Every builder returns a [`Fragment`]: SQL text with positional `?`
//! placeholders plus the parameters in placeholder order. Values are never
//! written into DML text, primary keys included. Identifiers are always
//! double-quoted (see [`quote_ident`]).

use crate::config::MissingValuePolicy;
use crate::error::Result;
use crate::field::{Field, ID_FIELD};
use crate::serialize::{column_definition, column_name, quote_ident, sql_literal, validate_identifier};
use crate::value::{Record, SqlValue};
use crate::FieldMap;

/// SQL text and its ordered parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragment {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl Fragment {
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }
}

/// Builds a boolean filter from a search record.
///
/// Only keys present in both `fields` and `search` participate; unknown keys
/// are ignored. Each term is `"col" = ?` with the value cast through its
/// field, or `"col" IS NULL` for a `Null` value. Terms are joined with
/// `AND`. An empty search gives an empty fragment, and the caller leaves out
/// `WHERE` entirely.
///
/// # Errors
///
/// Returns [`Error::InvalidValue`](crate::Error::InvalidValue) when a search
/// value cannot be cast for its field.
///
/// # Examples
///
/// ```
/// use protean_core::{Field, FieldKind, FieldMap, Record, SqlValue, Value, build_where};
///
/// let mut fields = FieldMap::new();
/// fields.insert("name".into(), Field::new(FieldKind::String));
/// fields.insert("active".into(), Field::new(FieldKind::Boolean));
///
/// let mut search = Record::new();
/// search.insert("active".into(), Value::Bool(true));
/// search.insert("unknown".into(), Value::Integer(5));
///
/// let fragment = build_where(&fields, &search).unwrap();
/// assert_eq!(fragment.sql, r#""active" = ?"#);
/// assert_eq!(fragment.params, vec![SqlValue::Integer(1)]);
/// ```
pub fn build_where(fields: &FieldMap, search: &Record) -> Result<Fragment> {
    let mut terms = Vec::new();
    let mut params = Vec::new();

    for (name, field) in fields {
        let Some(value) = search.get(name) else {
            continue;
        };
        let column = quote_ident(column_name(name, field));
        if value.is_null() {
            terms.push(format!("{column} IS NULL"));
        } else {
            terms.push(format!("{column} = ?"));
            params.push(field.cast(value)?);
        }
    }

    Ok(Fragment {
        sql: terms.join(" AND "),
        params,
    })
}

/// `SELECT *` over a table with an optional filter.
pub fn build_select(table: &str, filter: Fragment) -> Fragment {
    let mut sql = format!("SELECT * FROM {}", quote_ident(table));
    if !filter.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&filter.sql);
    }
    Fragment {
        sql,
        params: filter.params,
    }
}

/// Quoted columns and cast values for the model keys the field map knows,
/// in field order.
fn assignments(
    fields: &FieldMap,
    model: &Record,
    skip: Option<&str>,
) -> Result<(Vec<String>, Vec<SqlValue>)> {
    let pairs = fields
        .iter()
        .filter(|(name, _)| Some(name.as_str()) != skip)
        .filter_map(|(name, field)| {
            model.get(name).map(|value| {
                field
                    .cast(value)
                    .map(|param| (quote_ident(column_name(name, field)), param))
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(pairs.into_iter().unzip())
}

/// `INSERT ... RETURNING *` for the model keys the field map knows.
///
/// A model with no known keys inserts a row holding only the primary key.
///
/// # Errors
///
/// Returns [`Error::InvalidValue`](crate::Error::InvalidValue) when a model
/// value cannot be cast for its field; nothing is built in that case.
pub fn build_insert(table: &str, fields: &FieldMap, model: &Record) -> Result<Fragment> {
    let (columns, params) = assignments(fields, model, None)?;
    let table = quote_ident(table);

    let sql = if columns.is_empty() {
        format!("INSERT INTO {table} DEFAULT VALUES RETURNING *")
    } else {
        let placeholders = vec!["?"; columns.len()].join(", ");
        format!(
            "INSERT INTO {table} ({}) VALUES ({placeholders}) RETURNING *",
            columns.join(", ")
        )
    };

    Ok(Fragment { sql, params })
}

/// `UPDATE ... WHERE "id" = ? RETURNING *` with the id bound last.
///
/// The primary key itself is never reassigned. When the model sets no known
/// column the statement degrades to a `SELECT` of the row, so callers still
/// get the current row back.
///
/// # Errors
///
/// Same as [`build_insert`].
pub fn build_update(table: &str, fields: &FieldMap, id: i64, model: &Record) -> Result<Fragment> {
    let (columns, mut params) = assignments(fields, model, Some(ID_FIELD))?;
    let id_column = quote_ident(ID_FIELD);
    let table = quote_ident(table);
    params.push(SqlValue::Integer(id));

    let sql = if columns.is_empty() {
        format!("SELECT * FROM {table} WHERE {id_column} = ?")
    } else {
        let set: Vec<String> = columns.iter().map(|column| format!("{column} = ?")).collect();
        format!(
            "UPDATE {table} SET {} WHERE {id_column} = ? RETURNING *",
            set.join(", ")
        )
    };

    Ok(Fragment { sql, params })
}

/// `CREATE TABLE` with the auto-incrementing primary key followed by one
/// column per field. A reserved `id` entry in `fields` is not repeated.
///
/// # Errors
///
/// Returns [`Error::InvalidIdentifier`](crate::Error::InvalidIdentifier) for
/// unusable table or column names.
pub fn build_create(table: &str, fields: &FieldMap, policy: MissingValuePolicy) -> Result<String> {
    validate_identifier(table)?;

    let mut columns = vec![format!("{} INTEGER PRIMARY KEY AUTOINCREMENT", quote_ident(ID_FIELD))];
    for (name, field) in fields {
        if name == ID_FIELD {
            continue;
        }
        columns.push(column_definition(name, field, policy)?);
    }

    Ok(format!("CREATE TABLE {} ({})", quote_ident(table), columns.join(", ")))
}

/// `ALTER TABLE ... ADD COLUMN` for a single field.
///
/// Existing rows need a value for the new column, so a `NOT NULL` field
/// without a default gets its kind default whatever the policy.
pub fn build_alter(table: &str, name: &str, field: &Field, policy: MissingValuePolicy) -> Result<String> {
    validate_identifier(table)?;
    let policy = if field.not_null() && field.default_value().is_none() {
        MissingValuePolicy::KindDefault
    } else {
        policy
    };
    Ok(format!(
        "ALTER TABLE {} ADD COLUMN {}",
        quote_ident(table),
        column_definition(name, field, policy)?
    ))
}

/// Builds a `JSON_OBJECT(...)` expression projecting a row of the table
/// aliased as `alias`, for embedding one collection's rows in another query.
///
/// The primary key comes first, then every known field; `nested` entries are
/// appended verbatim as extra `'key', expr` pairs.
///
/// # Examples
///
/// ```
/// use protean_core::{Field, FieldKind, FieldMap, json_object_expr};
///
/// let mut fields = FieldMap::new();
/// fields.insert("name".into(), Field::new(FieldKind::String));
///
/// assert_eq!(
///     json_object_expr("u", &fields, &[]),
///     r#"JSON_OBJECT('id', "u"."id", 'name', "u"."name")"#
/// );
/// ```
pub fn json_object_expr(alias: &str, fields: &FieldMap, nested: &[String]) -> String {
    let alias = quote_ident(alias);
    let mut parts = vec![format!("'{ID_FIELD}', {alias}.{}", quote_ident(ID_FIELD))];

    for (name, field) in fields {
        if name == ID_FIELD {
            continue;
        }
        let column = column_name(name, field);
        parts.push(format!(
            "{}, {alias}.{}",
            sql_literal(&SqlValue::Text(column.to_string())),
            quote_ident(column)
        ));
    }
    parts.extend(nested.iter().cloned());

    format!("JSON_OBJECT({})", parts.join(", "))
}
