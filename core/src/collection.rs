//! Collections: one table, reconciled on demand.
//!
//! A [`Collection`] owns a table name and the field map it believes the table
//! has. Every operation first reconciles that map with the requested shape
//! ([`ensure`](Collection::ensure)), creating the table or adding columns as
//! needed, and then runs a single parameterized statement.
//!
//! # Example
//!
//! ```no_run
//! use protean_core::{Collection, Database, Value, record_from_json};
//!
//! fn register(db: &dyn Database) -> protean_core::Result<()> {
//!     let mut people = Collection::new(db, "people")?;
//!
//!     let ana = record_from_json(serde_json::json!({"name": "Ana", "age": 30})).unwrap();
//!     let stored = people.insert(&ana)?;
//!     assert_eq!(stored["id"], Value::Integer(1));
//!
//!     let found = people.find_by_id(&Value::Integer(1))?;
//!     assert_eq!(found, Some(stored));
//!     Ok(())
//! }
//! ```

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::adapter::{Database, Rows};
use crate::config::CollectionConfig;
use crate::deduce::deduce_fields;
use crate::error::{Error, Result};
use crate::field::{Field, ID_FIELD};
use crate::query::{
    Fragment, build_alter, build_create, build_insert, build_select, build_update, build_where,
    json_object_expr,
};
use crate::serialize::{column_name, parse_field_list_from_db, validate_identifier};
use crate::source::SchemaSource;
use crate::value::{Record, Value};
use crate::FieldMap;

/// A dynamically shaped table.
///
/// The database handle is borrowed, never closed. Methods that may reconcile
/// the schema take `&mut self`, so one instance never runs two
/// reconciliations at once.
pub struct Collection<'a, D: Database + ?Sized> {
    db: &'a D,
    table: String,
    fields: FieldMap,
    config: CollectionConfig,
}

impl<'a, D: Database + ?Sized> Collection<'a, D> {
    /// Creates a collection over `table` with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIdentifier`] if the table name is unusable.
    pub fn new(db: &'a D, table: impl Into<String>) -> Result<Self> {
        Self::with_config(db, table, CollectionConfig::default())
    }

    /// Creates a collection with explicit configuration.
    pub fn with_config(db: &'a D, table: impl Into<String>, config: CollectionConfig) -> Result<Self> {
        let table = table.into();
        validate_identifier(&table)?;
        Ok(Self {
            db,
            table,
            fields: FieldMap::new(),
            config,
        })
    }

    /// Swaps the database handle. The cached field map is dropped so the next
    /// operation re-reads the live schema.
    pub fn set_db(&mut self, db: &'a D) {
        self.db = db;
        self.fields.clear();
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Fields known so far. Empty until the first reconciliation.
    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    pub fn config(&self) -> &CollectionConfig {
        &self.config
    }

    /// Reconciles the table with `requested` and returns the known fields.
    ///
    /// Loads the live schema when nothing is cached, creates the table if it
    /// does not exist, or adds one column per missing field. Fields that are
    /// already known keep their live definition. Calling again with the same
    /// or a subset of fields issues no DDL.
    ///
    /// With an empty request this only loads; a missing table stays missing.
    ///
    /// # Errors
    ///
    /// DDL failures propagate. If adding a column fails partway, the columns
    /// added before it remain known.
    pub fn ensure(&mut self, requested: &FieldMap) -> Result<&FieldMap> {
        if self.fields.is_empty() {
            let columns = self.db.table_info(&self.table)?;
            self.fields = parse_field_list_from_db(&columns);
            debug!(table = %self.table, columns = self.fields.len(), "loaded table schema");
        }

        let missing: FieldMap = requested
            .iter()
            .filter(|(name, _)| !self.fields.contains_key(name.as_str()))
            .map(|(name, field)| (name.clone(), field.clone()))
            .collect();

        if missing.is_empty() {
            return Ok(&self.fields);
        }

        if self.fields.is_empty() {
            self.create(requested)?;
        } else {
            self.alter(missing)?;
        }
        Ok(&self.fields)
    }

    /// Pre-declares the table's shape from a schema source.
    pub fn declare(&mut self, source: &impl SchemaSource) -> Result<&FieldMap> {
        let requested = source.fields(&self.config)?;
        self.ensure(&requested)
    }

    fn create(&mut self, requested: &FieldMap) -> Result<()> {
        let sql = build_create(&self.table, requested, self.config.missing_values)?;
        self.run(&sql)?;
        info!(table = %self.table, columns = requested.len(), "created table");

        let mut fields = requested.clone();
        fields.insert(ID_FIELD.to_string(), Field::id());
        self.fields = fields;
        Ok(())
    }

    fn alter(&mut self, missing: FieldMap) -> Result<()> {
        for (name, field) in missing {
            let sql = build_alter(&self.table, &name, &field, self.config.missing_values)?;
            self.run(&sql)?;
            info!(table = %self.table, column = %name, kind = %field.kind(), "added column");
            self.fields.insert(name, field);
        }
        Ok(())
    }

    /// Returns every row matching `search`.
    ///
    /// Keys unknown to the table are ignored, so they never narrow the
    /// result. A table that does not exist yet has no rows.
    ///
    /// # Errors
    ///
    /// Read and parse failures propagate unless
    /// [`best_effort_reads`](CollectionConfig::best_effort_reads) is set, in
    /// which case they are logged and an empty result is returned.
    pub fn find(&mut self, search: &Record) -> Result<Vec<Record>> {
        match self.try_find(search) {
            Err(err) if self.config.best_effort_reads => {
                warn!(table = %self.table, error = %err, "find failed, returning no rows");
                Ok(Vec::new())
            }
            result => result,
        }
    }

    fn try_find(&mut self, search: &Record) -> Result<Vec<Record>> {
        self.ensure(&FieldMap::new())?;
        if self.fields.is_empty() {
            return Ok(Vec::new());
        }

        let fragment = build_select(&self.table, build_where(&self.fields, search)?);
        let rows = self.execute(&fragment)?;
        self.transform(rows)
    }

    /// Inserts a record and returns the stored row.
    ///
    /// New properties become new columns, and the first insert creates the
    /// table. Only properties present on `model` are written, so absent
    /// ones take the column default.
    pub fn insert(&mut self, model: &Record) -> Result<Record> {
        let requested = deduce_fields(model);
        self.ensure(&requested)?;
        if self.fields.is_empty() {
            // Nothing recognizable on a brand new table: create it bare.
            self.create(&requested)?;
        }

        let fragment = build_insert(&self.table, &self.fields, model)?;
        let rows = self.execute(&fragment)?;
        self.transform(rows)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::database("INSERT returned no row"))
    }

    /// Updates the row with primary key `id` and returns it, or `None` if no
    /// such row exists.
    pub fn update(&mut self, id: i64, model: &Record) -> Result<Option<Record>> {
        let requested = deduce_fields(model);
        self.ensure(&requested)?;
        if self.fields.is_empty() {
            return Ok(None);
        }

        let fragment = build_update(&self.table, &self.fields, id, model)?;
        let rows = self.execute(&fragment)?;
        Ok(self.transform(rows)?.into_iter().next())
    }

    /// Looks a row up by primary key.
    ///
    /// Accepts integers, integral reals, numeric text, or an object with an
    /// `id` entry. Anything else returns `None` without touching the
    /// database.
    pub fn find_by_id(&mut self, id: &Value) -> Result<Option<Record>> {
        let Some(id) = resolve_id(id) else {
            return Ok(None);
        };

        let mut search = Record::new();
        search.insert(ID_FIELD.to_string(), Value::Integer(id));
        Ok(self.find(&search)?.into_iter().next())
    }

    /// Looks a row up by the `id` entry of `record`.
    pub fn find_by_record_id(&mut self, record: &Record) -> Result<Option<Record>> {
        match record.get(ID_FIELD) {
            Some(id) => self.find_by_id(id),
            None => Ok(None),
        }
    }

    /// `JSON_OBJECT(...)` projection of this collection's known fields, for
    /// embedding its rows in another query. `alias` defaults to the table
    /// name.
    pub fn json_object(&self, alias: Option<&str>, nested: &[String]) -> String {
        json_object_expr(alias.unwrap_or(&self.table), &self.fields, nested)
    }

    fn run(&self, sql: &str) -> Result<()> {
        debug!(table = %self.table, %sql, "run");
        self.db.run(sql)
    }

    fn execute(&self, fragment: &Fragment) -> Result<Rows> {
        debug!(table = %self.table, sql = %fragment.sql, params = fragment.params.len(), "execute");
        self.db.execute(&fragment.sql, &fragment.params)
    }

    /// Parses raw rows through the known fields, looking columns up by
    /// their column name. Columns with no known field are converted as-is.
    fn transform(&self, rows: Rows) -> Result<Vec<Record>> {
        let by_column: HashMap<&str, (&str, &Field)> = self
            .fields
            .iter()
            .map(|(name, field)| (column_name(name, field), (name.as_str(), field)))
            .collect();

        let Rows { columns, rows } = rows;
        rows.into_iter()
            .map(|row| {
                columns
                    .iter()
                    .zip(row)
                    .map(|(column, stored)| match by_column.get(column.as_str()) {
                        Some((name, field)) => Ok((name.to_string(), field.parse(stored)?)),
                        None => Ok((column.clone(), stored.into_value())),
                    })
                    .collect::<Result<Record>>()
            })
            .collect()
    }
}

/// Resolves a lookup value to a primary key.
fn resolve_id(value: &Value) -> Option<i64> {
    match value {
        Value::Integer(n) => Some(*n),
        Value::Real(n) => real_to_id(*n),
        Value::Text(text) => {
            let text = text.trim();
            text.parse::<i64>()
                .ok()
                .or_else(|| text.parse::<f64>().ok().and_then(real_to_id))
        }
        Value::Object(map) => match map.get(ID_FIELD) {
            Some(id @ (serde_json::Value::Number(_) | serde_json::Value::String(_))) => {
                resolve_id(&Value::from(id.clone()))
            }
            _ => None,
        },
        _ => None,
    }
}

fn real_to_id(n: f64) -> Option<i64> {
    let in_range = n >= i64::MIN as f64 && n < i64::MAX as f64;
    (n.is_finite() && n.fract() == 0.0 && in_range).then_some(n as i64)
}

impl<D: Database + ?Sized> std::fmt::Debug for Collection<'_, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("table", &self.table)
            .field("fields", &self.fields)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
