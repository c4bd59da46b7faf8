use std::collections::BTreeMap;
use std::path::Path;

use jsonschema::JSONSchema;
use schemars::schema::RootSchema;
use schemars::schema_for;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::errors::{ConfigError, Result};
use crate::model::BuiltinConstraintConfig;

/// Raw constraint configuration: kind name -> kind-specific value.
///
/// Key order carries no meaning; the pipeline applies kinds in the
/// registry's canonical order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConstraintConfig {
    kinds: BTreeMap<String, JsonValue>,
}

impl ConstraintConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a JSON object.
    pub fn from_json_value(value: JsonValue) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn with(mut self, kind: impl Into<String>, value: JsonValue) -> Self {
        self.kinds.insert(kind.into(), value);
        self
    }

    pub fn get(&self, kind: &str) -> Option<&JsonValue> {
        self.kinds.get(kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.kinds.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

/// Load a `.json` or `.toml` constraint configuration file.
pub fn load_config(path: &Path) -> Result<ConstraintConfig> {
    let text = std::fs::read_to_string(path)?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => ConstraintConfig::from_toml_str(&text),
        Some("json") => ConstraintConfig::from_json_str(&text),
        other => Err(ConfigError::invalid(
            "config",
            format!(
                "unsupported config extension {:?} for {} (expected .json or .toml)",
                other.unwrap_or(""),
                path.display()
            ),
        )),
    }
}

/// JSON Schema describing the built-in configuration keys.
pub fn config_json_schema() -> RootSchema {
    schema_for!(BuiltinConstraintConfig)
}

/// Check a raw configuration document against [`config_json_schema`].
/// Each violation becomes a `schema_violation` diagnostic; keys outside the
/// built-in kinds are not checked.
pub fn validate_config_json(config: &JsonValue) -> Result<Diagnostics> {
    let schema = serde_json::to_value(config_json_schema())?;
    let compiled = JSONSchema::compile(&schema)
        .map_err(|err| ConfigError::invalid("config", format!("config schema: {err}")))?;

    let mut diagnostics = Diagnostics::new();
    if let Err(errors) = compiled.validate(config) {
        for error in errors {
            let path = error.instance_path.to_string();
            diagnostics.record(Diagnostic::new(
                "schema_violation",
                "config",
                if path.is_empty() { "/".to_string() } else { path },
                error.to_string(),
            ));
        }
    }
    Ok(diagnostics)
}
