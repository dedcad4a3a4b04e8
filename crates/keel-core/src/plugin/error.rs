//! Error types for the plugin type catalog.

/// Errors raised while populating the type catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The same plugin id was scanned more than once.
    #[error("plugin '{plugin_id}' has already been scanned into the catalog")]
    AlreadyScanned { plugin_id: String },
}
