//! Schema-on-write persistence over SQL tables.
//!
//! A [`Collection`] stores loosely typed records in one table whose columns
//! grow with the data. Field kinds are deduced from the values written
//! ([`deduce_fields`]) or declared up front from a [`SchemaSource`], and the
//! table is created or extended the first time a new field shows up.
//!
//! The crate is database-agnostic: it builds parameterized SQL and hands it
//! to a [`Database`] implementation. `protean-sqlite` provides one over
//! `rusqlite`.
//!
//! - [`Field`] / [`FieldKind`]: a column's kind plus cast and parse rules.
//! - [`Value`] / [`SqlValue`]: record values and their stored form.
//! - [`build_where`], [`build_insert`], [`build_update`], [`build_create`],
//!   [`build_alter`]: statement builders.
//! - [`CollectionConfig`]: nullability and read policies, loadable from YAML.
//!
//! # Example
//!
//! ```
//! use protean_core::*;
//!
//! let ana = record_from_json(serde_json::json!({
//!     "name": "Ana",
//!     "age": 30,
//!     "tags": ["admin"],
//! }))
//! .unwrap();
//!
//! let fields = deduce_fields(&ana);
//! assert_eq!(fields["tags"].kind(), FieldKind::Array);
//!
//! let create = build_create("people", &fields, MissingValuePolicy::Null).unwrap();
//! assert_eq!(
//!     create,
//!     r#"CREATE TABLE "people" ("id" INTEGER PRIMARY KEY AUTOINCREMENT, "name" TEXT, "age" INTEGER, "tags" ARRAY)"#
//! );
//! ```

mod adapter;
mod collection;
mod config;
mod deduce;
mod error;
mod field;
mod query;
mod serialize;
mod source;
mod value;

use indexmap::IndexMap;

/// Ordered map from field name to field definition.
pub type FieldMap = IndexMap<String, Field>;

pub use adapter::{ColumnInfo, Database, Rows};
pub use collection::Collection;
pub use config::{CollectionConfig, MissingValuePolicy};
pub use deduce::{deduce_field, deduce_fields};
pub use error::{Error, Result};
pub use field::{Field, FieldKind, ID_FIELD};
pub use query::{
    Fragment, build_alter, build_create, build_insert, build_select, build_update, build_where,
    json_object_expr,
};
pub use serialize::{
    column_definition, column_name, kind_from_declared_type, parse_field_list_from_db, quote_ident,
    sql_type, validate_identifier,
};
pub use source::{ObjectSchema, PropertySchema, SchemaSource};
pub use value::{Record, SqlValue, Value, record_from_json, record_to_json};
