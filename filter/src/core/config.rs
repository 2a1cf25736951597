//! Engine options
//!
//! Options are read once when the engine is built. They can be constructed in
//! code, or loaded from a JSON file:
//!
//! ```json
//! {
//!   "allowedOperators": ["equalTo", "in", "includesInsensitive"],
//!   "operatorNameOverrides": { "includes": "contains" },
//!   "enableRelationFilters": true,
//!   "maxDepth": 12
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use super::constants::{DEFAULT_MAX_DEPTH, ENV_CONFIG};
use crate::sql::Backend;

/// Options controlling which filter fields exist and how input is validated
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterOptions {
    /// Restrict operators to this subset (by registered name)
    pub allowed_operators: Option<Vec<String>>,
    /// Restrict attribute fields to these underlying type names
    pub allowed_field_types: Option<Vec<String>>,
    /// Rename operators as exposed in filter input
    pub operator_name_overrides: BTreeMap<String, String>,
    pub enable_array_filters: bool,
    pub enable_computed_field_filters: bool,
    pub enable_relation_filters: bool,
    pub enable_set_function_filters: bool,
    pub enable_logical_operators: bool,
    /// Treat `null` as "no constraint" instead of rejecting it
    pub allow_null_input: bool,
    /// Treat `{}` as "no constraint" instead of rejecting it
    pub allow_empty_object_input: bool,
    /// Maximum nesting depth of a filter value
    pub max_depth: usize,
    /// Placeholder syntax of compiled SQL
    pub backend: Backend,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            allowed_operators: None,
            allowed_field_types: None,
            operator_name_overrides: BTreeMap::new(),
            enable_array_filters: true,
            enable_computed_field_filters: true,
            enable_relation_filters: false,
            enable_set_function_filters: true,
            enable_logical_operators: true,
            allow_null_input: false,
            allow_empty_object_input: false,
            max_depth: DEFAULT_MAX_DEPTH,
            backend: Backend::default(),
            extra: serde_json::Value::Null,
        }
    }
}

impl FilterOptions {
    /// Load options from the file named by `ROWFILTER_CONFIG`, or defaults
    pub fn load() -> Result<Self> {
        Self::load_optional(std::env::var_os(ENV_CONFIG).map(PathBuf::from))
    }

    /// Load options from `path` when given, or defaults
    pub fn load_optional(path: Option<PathBuf>) -> Result<Self> {
        let Some(path) = path else {
            tracing::debug!("No options file configured, using defaults");
            return Ok(Self::default());
        };
        if !path.exists() {
            anyhow::bail!("Options file not found: {}", path.display());
        }
        Self::load_from_file(&path)
    }

    /// Load options from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading options file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read options file: {}", path.display()))?;
        let options: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse options file: {}", path.display()))?;
        tracing::trace!(options = ?options, "Parsed options file");
        options.warn_unknown_fields();
        options.validate()?;
        Ok(options)
    }

    /// Reject values the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            anyhow::bail!("maxDepth must be at least 1");
        }
        for (from, to) in &self.operator_name_overrides {
            if to.is_empty() {
                anyhow::bail!("operatorNameOverrides.{} must not be empty", from);
            }
        }
        Ok(())
    }

    /// Warn about unknown fields in the options
    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra
            && !map.is_empty()
        {
            let keys_str: String = map
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in options file (possible typos)"
            );
        }
    }

    /// Exposed name of a registered operator
    pub fn operator_name<'a>(&'a self, name: &'a str) -> &'a str {
        self.operator_name_overrides
            .get(name)
            .map(String::as_str)
            .unwrap_or(name)
    }

    /// Whether the allow-list admits a registered operator name
    pub fn operator_allowed(&self, name: &str) -> bool {
        self.allowed_operators
            .as_ref()
            .is_none_or(|names| names.iter().any(|n| n == name))
    }

    /// Whether the allow-list admits an attribute's underlying type
    pub fn field_type_allowed(&self, type_name: &str) -> bool {
        self.allowed_field_types
            .as_ref()
            .is_none_or(|types| types.iter().any(|t| t == type_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let options = FilterOptions::default();
        assert!(options.enable_array_filters);
        assert!(options.enable_computed_field_filters);
        assert!(!options.enable_relation_filters);
        assert!(options.enable_set_function_filters);
        assert!(options.enable_logical_operators);
        assert!(!options.allow_null_input);
        assert!(!options.allow_empty_object_input);
        assert_eq!(options.max_depth, 16);
        assert_eq!(options.backend, Backend::Postgres);
    }

    #[test]
    fn test_parse_camel_case() {
        let json = r#"{
            "allowedOperators": ["equalTo"],
            "operatorNameOverrides": {"includes": "contains"},
            "enableRelationFilters": true,
            "allowNullInput": true,
            "backend": "duckdb"
        }"#;
        let options: FilterOptions = serde_json::from_str(json).unwrap();
        assert!(options.enable_relation_filters);
        assert!(options.allow_null_input);
        assert!(options.enable_logical_operators);
        assert_eq!(options.backend, Backend::Duckdb);
        assert_eq!(options.operator_name("includes"), "contains");
        assert_eq!(options.operator_name("equalTo"), "equalTo");
        assert!(options.operator_allowed("equalTo"));
        assert!(!options.operator_allowed("notEqualTo"));
    }

    #[test]
    fn test_parse_extra_fields() {
        let json = r#"{"enableRelationFilter": true}"#;
        let options: FilterOptions = serde_json::from_str(json).unwrap();
        assert!(!options.enable_relation_filters);
        assert_eq!(options.extra.get("enableRelationFilter").unwrap(), true);
    }

    #[test]
    fn test_load_from_file() {
        let mut temp_file = tempfile::NamedTempFile::new().unwrap();
        temp_file
            .write_all(br#"{"maxDepth": 4, "allowedFieldTypes": ["text"]}"#)
            .unwrap();

        let options = FilterOptions::load_from_file(temp_file.path()).unwrap();
        assert_eq!(options.max_depth, 4);
        assert!(options.field_type_allowed("text"));
        assert!(!options.field_type_allowed("int4"));
    }

    #[test]
    fn test_load_from_file_invalid_json() {
        let mut temp_file = tempfile::NamedTempFile::new().unwrap();
        temp_file.write_all(b"{not json").unwrap();

        let err = FilterOptions::load_from_file(temp_file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse options file"));
    }

    #[test]
    fn test_load_rejects_zero_depth() {
        let mut temp_file = tempfile::NamedTempFile::new().unwrap();
        temp_file.write_all(br#"{"maxDepth": 0}"#).unwrap();

        let err = FilterOptions::load_from_file(temp_file.path()).unwrap_err();
        assert!(err.to_string().contains("maxDepth"));
    }

    #[test]
    fn test_load_optional_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("rowfilter.json");
        let err = FilterOptions::load_optional(Some(missing)).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_load_optional_without_path() {
        let options = FilterOptions::load_optional(None).unwrap();
        assert_eq!(options.max_depth, 16);
    }
}
