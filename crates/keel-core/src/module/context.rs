use serde_json::Value;

use crate::plugin::catalog::TypeCatalog;
use crate::report::CompositeLog;

static NO_SETTINGS: Value = Value::Null;

/// Context handed to a module's synchronous lifecycle hooks.
///
/// Gives the module read access to its plugin's configuration section and
/// the composite-wide type catalog, and write access to its own scope of
/// the composite log.
pub struct ModuleContext<'a> {
    plugin_id: &'a str,
    module_name: &'a str,
    settings: &'a Value,
    catalog: &'a TypeCatalog,
    log: &'a mut CompositeLog,
}

impl<'a> ModuleContext<'a> {
    pub(crate) fn new(
        plugin_id: &'a str,
        module_name: &'a str,
        settings: Option<&'a Value>,
        catalog: &'a TypeCatalog,
        log: &'a mut CompositeLog,
    ) -> Self {
        Self {
            plugin_id,
            module_name,
            settings: settings.unwrap_or(&NO_SETTINGS),
            catalog,
            log,
        }
    }

    /// Id of the plugin owning the current module.
    pub fn plugin_id(&self) -> &str {
        self.plugin_id
    }

    /// Name of the current module.
    pub fn module_name(&self) -> &str {
        self.module_name
    }

    /// The owning plugin's configuration section (`Null` when absent).
    pub fn settings(&self) -> &Value {
        self.settings
    }

    /// A single key from the plugin's configuration section.
    pub fn setting(&self, key: &str) -> Option<&Value> {
        self.settings.get(key)
    }

    /// The composite-wide type catalog.
    pub fn catalog(&self) -> &TypeCatalog {
        self.catalog
    }

    /// Capture a diagnostic entry under this module's scope of the
    /// composite log. Duplicate keys overwrite (last-write-wins).
    pub fn capture(&mut self, key: &str, value: impl Into<Value>) {
        self.log
            .capture_module(self.plugin_id, self.module_name, key, value);
    }
}
