use std::collections::HashSet;

use crate::module::service::InterfaceRef;
use crate::plugin::error::CatalogError;

/// A type contributed by a plugin, described by convention rather than
/// reflection: the interfaces it implements and the markers attached to it.
#[derive(Debug, Clone)]
pub struct TypeRef {
    name: String,
    implements: Vec<InterfaceRef>,
    markers: Vec<String>,
}

impl TypeRef {
    /// Create a reference to a concrete type by name.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            implements: Vec::new(),
            markers: Vec::new(),
        }
    }

    /// Declare an interface this type implements.
    pub fn implementing(mut self, interface: InterfaceRef) -> Self {
        self.implements.push(interface);
        self
    }

    /// Attach a marker (the catalog equivalent of an attribute/annotation).
    pub fn marked(mut self, marker: &str) -> Self {
        self.markers.push(marker.to_string());
        self
    }

    /// The concrete type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Interfaces this type implements.
    pub fn interfaces(&self) -> &[InterfaceRef] {
        &self.implements
    }

    /// Whether this type implements the given interface.
    pub fn implements(&self, interface: &InterfaceRef) -> bool {
        self.implements.contains(interface)
    }

    /// Whether this type carries the given marker.
    pub fn has_marker(&self, marker: &str) -> bool {
        self.markers.iter().any(|m| m == marker)
    }
}

/// A catalog entry: a contributed type together with its owning plugin.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    plugin_id: String,
    type_ref: TypeRef,
}

impl CatalogEntry {
    /// Id of the plugin that contributed the type.
    pub fn plugin_id(&self) -> &str {
        &self.plugin_id
    }

    /// The contributed type.
    pub fn type_ref(&self) -> &TypeRef {
        &self.type_ref
    }
}

/// Aggregated index of the types contributed by every scanned plugin.
///
/// Populated once per plugin during the container's scan step; pure query
/// afterwards. Queries span the whole composite, so a module can discover
/// implementations contributed by other plugins.
#[derive(Debug, Default)]
pub struct TypeCatalog {
    entries: Vec<CatalogEntry>,
    scanned: HashSet<String>,
}

impl TypeCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            scanned: HashSet::new(),
        }
    }

    /// Record the types contributed by a plugin.
    ///
    /// Scanning the same plugin id twice is an error; the first scan is the
    /// only one that counts.
    pub fn scan(&mut self, plugin_id: &str, types: Vec<TypeRef>) -> Result<(), CatalogError> {
        if !self.scanned.insert(plugin_id.to_string()) {
            return Err(CatalogError::AlreadyScanned {
                plugin_id: plugin_id.to_string(),
            });
        }
        for type_ref in types {
            self.entries.push(CatalogEntry {
                plugin_id: plugin_id.to_string(),
                type_ref,
            });
        }
        Ok(())
    }

    /// Whether the given plugin has been scanned.
    pub fn is_scanned(&self, plugin_id: &str) -> bool {
        self.scanned.contains(plugin_id)
    }

    /// All entries, in scan order.
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Total number of contributed types.
    pub fn type_count(&self) -> usize {
        self.entries.len()
    }

    /// All concrete types implementing the given interface, across every
    /// scanned plugin. Lazy and restartable; an empty result is valid.
    pub fn find_implementing<'a>(
        &'a self,
        interface: &InterfaceRef,
    ) -> impl Iterator<Item = &'a TypeRef> + 'a {
        let interface = interface.clone();
        self.entries
            .iter()
            .map(|e| &e.type_ref)
            .filter(move |t| t.implements(&interface))
    }

    /// All types carrying the given marker, across every scanned plugin.
    pub fn find_marked<'a>(&'a self, marker: &'a str) -> impl Iterator<Item = &'a TypeRef> + 'a {
        self.entries
            .iter()
            .map(|e| &e.type_ref)
            .filter(move |t| t.has_marker(marker))
    }
}
