//! # Keel Plugin System
//!
//! A plugin is the unit of composition the host registers with the
//! [`CompositeContainer`](crate::composite::container::CompositeContainer).
//! It carries static metadata ([`PluginDescriptor`](descriptor::PluginDescriptor)),
//! contributes implementation types to the shared
//! [`TypeCatalog`](catalog::TypeCatalog), and instantiates the
//! [`Module`](crate::module::Module)s that participate in the lifecycle.
//!
//! Discovery is registry-based: the host enumerates its plugins and hands
//! them to the container before composition begins. There is no reflection
//! or dynamic loading involved.
pub mod catalog;
pub mod descriptor;
pub mod error;

use crate::module::Module;
use crate::report::ScopedLog;

/// Core trait that all plugins must implement.
pub trait Plugin: Send + Sync {
    /// Static metadata describing this plugin.
    fn descriptor(&self) -> descriptor::PluginDescriptor;

    /// Implementation types this plugin contributes to the composite's
    /// type catalog. Queried by modules of *other* plugins as well, so the
    /// set must be stable across calls.
    fn types(&self) -> Vec<catalog::TypeRef> {
        Vec::new()
    }

    /// Instantiate the modules owned by this plugin, in the order they
    /// should be considered for dependency tie-breaking.
    fn modules(&self) -> Vec<Box<dyn Module>>;

    /// Contribute plugin-level diagnostics to the composite log.
    fn log(&self, _scope: &mut ScopedLog<'_>) {}
}

// Re-export important types
pub use catalog::{TypeCatalog, TypeRef};
pub use descriptor::{PluginDescriptor, PluginKind};
pub use error::CatalogError;

// Test module declaration
#[cfg(test)]
mod tests;
