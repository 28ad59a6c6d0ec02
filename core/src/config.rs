//! Collection configuration.
//!
//! Controls the choices the engine would otherwise make silently: whether
//! declared fields are `NOT NULL`, what older rows read for a column added
//! after they were written, and whether reads may swallow failures.
//!
//! # Example YAML
//!
//! ```yaml
//! declared_not_null: true
//! missing_values: kind_default
//! best_effort_reads: false
//! ```

use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// What a column holds for rows that existed before the column was added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingValuePolicy {
    /// No column default; older rows read `NULL`.
    #[default]
    Null,
    /// Columns without an explicit default get the empty value of their kind
    /// (`''`, `0`, `0`, the epoch, `'{}'`, `'[]'`).
    KindDefault,
}

/// Per-collection settings.
///
/// # Examples
///
/// ```
/// # use protean_core::{CollectionConfig, MissingValuePolicy};
/// let config = CollectionConfig::from_yaml_str("missing_values: kind_default").unwrap();
/// assert_eq!(config.missing_values, MissingValuePolicy::KindDefault);
/// assert!(!config.declared_not_null);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionConfig {
    /// Mark fields declared through a schema source as `NOT NULL`.
    pub declared_not_null: bool,
    /// Column default applied when a column is created or added.
    pub missing_values: MissingValuePolicy,
    /// Let `find` log and swallow read failures instead of returning them.
    pub best_effort_reads: bool,
}

impl CollectionConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`Config`](crate::Error::Config) if the file cannot be read
    /// or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Parses configuration from a YAML string.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = CollectionConfig::default();
        assert!(!config.declared_not_null);
        assert_eq!(config.missing_values, MissingValuePolicy::Null);
        assert!(!config.best_effort_reads);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "declared_not_null: true").unwrap();
        writeln!(file, "best_effort_reads: true").unwrap();

        let config = CollectionConfig::load(file.path()).unwrap();
        assert!(config.declared_not_null);
        assert!(config.best_effort_reads);
        assert_eq!(config.missing_values, MissingValuePolicy::Null);
    }

    #[test]
    fn test_invalid_yaml_is_config_error() {
        let err = CollectionConfig::from_yaml_str("missing_values: sometimes").unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = CollectionConfig::load("/nonexistent/protean.yml").unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
    }
}
