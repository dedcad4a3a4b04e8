use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Errors raised while parsing composite settings text.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to parse {format} settings: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },
}

/// Per-plugin configuration sections, keyed by plugin id.
///
/// Modules read their owning plugin's section during `initialize` through
/// the [`ModuleContext`](crate::module::context::ModuleContext). Sections
/// are structural values, so any JSON/TOML/YAML document shape works.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompositeSettings {
    #[serde(flatten)]
    plugins: HashMap<String, Value>,
}

impl CompositeSettings {
    /// Create empty settings (every plugin sees a `Null` section).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a plugin's configuration section.
    pub fn set_plugin(&mut self, plugin_id: &str, section: Value) -> &mut Self {
        self.plugins.insert(plugin_id.to_string(), section);
        self
    }

    /// A plugin's configuration section, if one was provided.
    pub fn plugin(&self, plugin_id: &str) -> Option<&Value> {
        self.plugins.get(plugin_id)
    }

    /// Number of plugin sections present.
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Whether no sections are present.
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Parse settings from a JSON document whose top-level keys are plugin
    /// ids.
    pub fn from_json_str(text: &str) -> Result<Self, SettingsError> {
        serde_json::from_str(text).map_err(|e| SettingsError::Parse {
            format: "json",
            message: e.to_string(),
        })
    }

    /// Parse settings from a TOML document whose top-level tables are
    /// plugin ids. Requires the "toml-config" feature.
    #[cfg(feature = "toml-config")]
    pub fn from_toml_str(text: &str) -> Result<Self, SettingsError> {
        let plugins: HashMap<String, Value> =
            toml::from_str(text).map_err(|e| SettingsError::Parse {
                format: "toml",
                message: e.to_string(),
            })?;
        Ok(Self { plugins })
    }

    /// Parse settings from a YAML document whose top-level keys are plugin
    /// ids. Requires the "yaml-config" feature.
    #[cfg(feature = "yaml-config")]
    pub fn from_yaml_str(text: &str) -> Result<Self, SettingsError> {
        let plugins: HashMap<String, Value> =
            serde_yaml::from_str(text).map_err(|e| SettingsError::Parse {
                format: "yaml",
                message: e.to_string(),
            })?;
        Ok(Self { plugins })
    }
}
