//! # Keel Composite Log
//!
//! A structured, hierarchical record of the composition process, assembled
//! passively while the container drives the lifecycle: plugins at the top
//! level, their modules beneath, arbitrary key/value entries at both
//! scopes. Values are structural ([`serde_json::Value`]), so nested maps
//! and sequences survive intact. Once composition completes the log is only
//! read, exported as an immutable snapshot for diagnostics.
use serde::Serialize;
use serde_json::Value;

/// Key/value entries of one scope. Insertion order is preserved; writing an
/// existing key overwrites its value (last-write-wins).
fn write_entry(entries: &mut Vec<(String, Value)>, key: &str, value: Value) {
    if let Some(existing) = entries.iter_mut().find(|(k, _)| k == key) {
        existing.1 = value;
    } else {
        entries.push((key.to_string(), value));
    }
}

#[derive(Debug, Default)]
struct ModuleScope {
    name: String,
    entries: Vec<(String, Value)>,
}

#[derive(Debug, Default)]
struct PluginScope {
    id: String,
    entries: Vec<(String, Value)>,
    modules: Vec<ModuleScope>,
}

/// Mutable view over a single scope's entries, handed to plugin and module
/// `log` hooks.
pub struct ScopedLog<'a> {
    entries: &'a mut Vec<(String, Value)>,
}

impl ScopedLog<'_> {
    /// Write one diagnostic entry; duplicate keys overwrite.
    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        write_entry(self.entries, key, value.into());
    }
}

/// The append-only diagnostic tree built during composition.
#[derive(Debug, Default)]
pub struct CompositeLog {
    plugins: Vec<PluginScope>,
}

impl CompositeLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self {
            plugins: Vec::new(),
        }
    }

    fn plugin_scope(&mut self, plugin_id: &str) -> &mut PluginScope {
        if let Some(pos) = self.plugins.iter().position(|p| p.id == plugin_id) {
            &mut self.plugins[pos]
        } else {
            self.plugins.push(PluginScope {
                id: plugin_id.to_string(),
                ..Default::default()
            });
            self.plugins.last_mut().expect("scope just pushed")
        }
    }

    fn module_scope(&mut self, plugin_id: &str, module: &str) -> &mut ModuleScope {
        let plugin = self.plugin_scope(plugin_id);
        if let Some(pos) = plugin.modules.iter().position(|m| m.name == module) {
            &mut plugin.modules[pos]
        } else {
            plugin.modules.push(ModuleScope {
                name: module.to_string(),
                ..Default::default()
            });
            plugin.modules.last_mut().expect("scope just pushed")
        }
    }

    /// Append an entry under a plugin's scope, creating the scope on first
    /// use. Duplicate keys within the scope overwrite (last-write-wins).
    pub fn capture_plugin(&mut self, plugin_id: &str, key: &str, value: impl Into<Value>) {
        let value = value.into();
        write_entry(&mut self.plugin_scope(plugin_id).entries, key, value);
    }

    /// Append an entry under a module's scope, creating plugin and module
    /// scopes on first use. Duplicate keys within the scope overwrite.
    pub fn capture_module(
        &mut self,
        plugin_id: &str,
        module: &str,
        key: &str,
        value: impl Into<Value>,
    ) {
        let value = value.into();
        write_entry(&mut self.module_scope(plugin_id, module).entries, key, value);
    }

    /// A writable view over a plugin's scope, for `log` hooks.
    pub fn plugin_scope_mut(&mut self, plugin_id: &str) -> ScopedLog<'_> {
        ScopedLog {
            entries: &mut self.plugin_scope(plugin_id).entries,
        }
    }

    /// A writable view over a module's scope, for `log` hooks.
    pub fn module_scope_mut(&mut self, plugin_id: &str, module: &str) -> ScopedLog<'_> {
        ScopedLog {
            entries: &mut self.module_scope(plugin_id, module).entries,
        }
    }

    /// Read one plugin-scope entry.
    pub fn plugin_entry(&self, plugin_id: &str, key: &str) -> Option<&Value> {
        self.plugins
            .iter()
            .find(|p| p.id == plugin_id)
            .and_then(|p| p.entries.iter().find(|(k, _)| k == key))
            .map(|(_, v)| v)
    }

    /// Read one module-scope entry.
    pub fn module_entry(&self, plugin_id: &str, module: &str, key: &str) -> Option<&Value> {
        self.plugins
            .iter()
            .find(|p| p.id == plugin_id)
            .and_then(|p| p.modules.iter().find(|m| m.name == module))
            .and_then(|m| m.entries.iter().find(|(k, _)| k == key))
            .map(|(_, v)| v)
    }

    /// Produce an immutable hierarchical snapshot, safe to serialize.
    pub fn export(&self) -> CompositeReport {
        CompositeReport {
            plugins: self
                .plugins
                .iter()
                .map(|p| PluginReport {
                    id: p.id.clone(),
                    entries: to_map(&p.entries),
                    modules: p
                        .modules
                        .iter()
                        .map(|m| ModuleReport {
                            name: m.name.clone(),
                            entries: to_map(&m.entries),
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

fn to_map(entries: &[(String, Value)]) -> serde_json::Map<String, Value> {
    entries
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// Immutable snapshot of the composite log: plugins, their modules, and the
/// captured key/value entries of each scope.
#[derive(Debug, Clone, Serialize)]
pub struct CompositeReport {
    pub plugins: Vec<PluginReport>,
}

/// One plugin's slice of the report.
#[derive(Debug, Clone, Serialize)]
pub struct PluginReport {
    pub id: String,
    pub entries: serde_json::Map<String, Value>,
    pub modules: Vec<ModuleReport>,
}

/// One module's slice of the report.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleReport {
    pub name: String,
    pub entries: serde_json::Map<String, Value>,
}

// Test module declaration
#[cfg(test)]
mod tests;
