use std::fmt;

use serde::Serialize;

/// The layer a plugin belongs to within the composite.
///
/// Core plugins provide reusable infrastructure, application plugins carry
/// the host application's own components, and the host plugin represents
/// the process entry point itself. The kind is diagnostic metadata; it does
/// not affect resolution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PluginKind {
    /// Reusable infrastructure shared across applications
    Core,
    /// An application-level component plugin
    Application,
    /// The hosting process itself
    Host,
}

impl fmt::Display for PluginKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PluginKind::Core => write!(f, "core"),
            PluginKind::Application => write!(f, "application"),
            PluginKind::Host => write!(f, "host"),
        }
    }
}

/// Static metadata describing a registered plugin.
///
/// Immutable once handed to the container; lives for the lifetime of the
/// composite.
#[derive(Debug, Clone, Serialize)]
pub struct PluginDescriptor {
    /// Unique identifier for the plugin
    pub id: String,

    /// Human-readable name
    pub name: String,

    /// Plugin description
    pub description: String,

    /// The layer this plugin belongs to
    pub kind: PluginKind,
}

impl PluginDescriptor {
    /// Create a new descriptor with an empty description.
    pub fn new(id: &str, name: &str, kind: PluginKind) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: String::new(),
            kind,
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }
}

impl fmt::Display for PluginDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {})", self.name, self.id, self.kind)
    }
}
