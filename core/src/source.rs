//! Schema sources: pre-declaring a table's shape without touching the database.
//!
//! [`ObjectSchema`] reads TypeBox-style JSON schema documents:
//!
//! ```json
//! {
//!   "type": "object",
//!   "properties": {
//!     "title":    { "type": "string" },
//!     "votes":    { "type": "integer", "default": 0 },
//!     "meta":     { "kind": "Any" },
//!     "deadline": { "kind": "Union", "anyOf": [{ "type": "Date" }, { "type": "null" }] }
//!   }
//! }
//! ```
//!
//! The TypeBox kind symbol is accepted as either `kind` or `[Kind]`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::config::CollectionConfig;
use crate::error::{Error, Result};
use crate::field::{Field, FieldKind, ID_FIELD};
use crate::value::Value;
use crate::FieldMap;

/// Anything that can describe a table's fields up front.
pub trait SchemaSource {
    /// Produces the declared field map.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedType`] when a declared type has no field
    /// kind.
    fn fields(&self, config: &CollectionConfig) -> Result<FieldMap>;
}

impl SchemaSource for FieldMap {
    fn fields(&self, _config: &CollectionConfig) -> Result<FieldMap> {
        Ok(self
            .iter()
            .filter(|(name, _)| name.as_str() != ID_FIELD)
            .map(|(name, field)| (name.clone(), field.clone()))
            .collect())
    }
}

/// One property of a declarative schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertySchema {
    /// Primitive or composite type tag (`string`, `integer`, `Date`, ...).
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_tag: Option<String>,
    /// TypeBox kind (`Any`, `Union`, `Null`, ...).
    #[serde(rename = "kind", alias = "[Kind]", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Union members.
    #[serde(rename = "anyOf", default, skip_serializing_if = "Vec::is_empty")]
    pub any_of: Vec<PropertySchema>,
    /// Column default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
}

impl PropertySchema {
    pub fn of_type(tag: &str) -> Self {
        Self {
            type_tag: Some(tag.to_string()),
            ..Self::default()
        }
    }

    pub fn of_kind(kind: &str) -> Self {
        Self {
            kind: Some(kind.to_string()),
            ..Self::default()
        }
    }

    fn is_date(&self) -> bool {
        matches!(self.type_tag.as_deref(), Some("Date" | "date")) || self.kind.as_deref() == Some("Date")
    }

    fn is_null_marker(&self) -> bool {
        matches!(self.type_tag.as_deref(), Some("null" | "undefined"))
            || matches!(self.kind.as_deref(), Some("Null" | "Undefined"))
    }

    fn is_union(&self) -> bool {
        self.kind.as_deref() == Some("Union") || !self.any_of.is_empty()
    }

    /// Maps the property to a field. The flag tells whether the property
    /// itself admits null (a nullable union), in which case it is never
    /// marked `NOT NULL`.
    fn parse(&self) -> Result<(Field, bool)> {
        let kind = match self.type_tag.as_deref() {
            Some("string") => Some(FieldKind::String),
            Some("number" | "integer") => Some(FieldKind::Number),
            Some("boolean") => Some(FieldKind::Boolean),
            Some("Date" | "date") => Some(FieldKind::Date),
            Some("object") => Some(FieldKind::Object),
            Some("array") => Some(FieldKind::Array),
            _ => None,
        };

        let (field, nullable) = match kind {
            Some(kind) => (Field::new(kind), false),
            None if self.kind.as_deref() == Some("Any") => (Field::new(FieldKind::Object), false),
            None if self.is_union() => (self.parse_union()?, true),
            None => {
                let tag = self
                    .type_tag
                    .as_deref()
                    .or(self.kind.as_deref())
                    .unwrap_or("unknown");
                return Err(Error::UnsupportedType(tag.to_string()));
            }
        };

        let field = match &self.default {
            Some(default) => field.with_default(Value::from(default.clone())),
            None => field,
        };
        Ok((field, nullable))
    }

    /// Only optional dates are supported: a date member plus null/undefined
    /// markers.
    fn parse_union(&self) -> Result<Field> {
        let has_date = self.any_of.iter().any(Self::is_date);
        let rest_are_null = self
            .any_of
            .iter()
            .all(|member| member.is_date() || member.is_null_marker());

        if has_date && rest_are_null {
            Ok(Field::new(FieldKind::Date))
        } else {
            Err(Error::UnsupportedType("Union".to_string()))
        }
    }
}

/// A declarative object schema: named properties with type tags.
///
/// # Examples
///
/// ```
/// use protean_core::{CollectionConfig, FieldKind, ObjectSchema, SchemaSource};
///
/// let schema = ObjectSchema::from_json_str(r#"{
///     "properties": {
///         "id":    { "type": "integer" },
///         "title": { "type": "string" },
///         "tags":  { "type": "array" }
///     }
/// }"#).unwrap();
///
/// let fields = schema.fields(&CollectionConfig::default()).unwrap();
/// assert_eq!(fields.len(), 2);
/// assert_eq!(fields["tags"].kind(), FieldKind::Array);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectSchema {
    #[serde(default)]
    pub properties: IndexMap<String, PropertySchema>,
}

impl ObjectSchema {
    /// Parses a schema document from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::InvalidSchema(e.to_string()))
    }

    /// Parses a schema document from a JSON value.
    pub fn from_json(json: serde_json::Value) -> Result<Self> {
        serde_json::from_value(json).map_err(|e| Error::InvalidSchema(e.to_string()))
    }

    /// Adds a property, builder style.
    pub fn with_property(mut self, name: impl Into<String>, property: PropertySchema) -> Self {
        self.properties.insert(name.into(), property);
        self
    }
}

impl SchemaSource for ObjectSchema {
    fn fields(&self, config: &CollectionConfig) -> Result<FieldMap> {
        let mut fields = FieldMap::new();
        for (name, property) in &self.properties {
            if name == ID_FIELD {
                continue;
            }
            let (field, nullable) = property.parse()?;
            let field = if config.declared_not_null && !nullable {
                field.with_not_null()
            } else {
                field
            };
            fields.insert(name.clone(), field);
        }
        Ok(fields)
    }
}
