// Subsystem modules of the composite runtime
pub mod composite;
pub mod module;
pub mod plugin;
pub mod report;
pub mod resolver;

// Re-export key public types/traits for easier use by hosts and plugins
pub use composite::container::CompositeContainer;
pub use composite::error::{
    CompositionError, Error, LifecyclePhase, Result, ShutdownWarning, StartupError,
};
pub use composite::registry::{ServiceBinder, ServiceRegistry};
pub use composite::settings::CompositeSettings;
pub use composite::state::CompositeState;
pub use module::service::{InterfaceRef, ServiceDependency, ServiceScope};
pub use module::{Module, ModuleContext, ModuleState};
pub use plugin::catalog::{TypeCatalog, TypeRef};
pub use plugin::descriptor::{PluginDescriptor, PluginKind};
pub use plugin::Plugin;
pub use report::{CompositeLog, CompositeReport, ScopedLog};

// Cancellation is part of the public lifecycle API; re-export the token so
// plugin crates do not need a direct tokio-util dependency.
pub use tokio_util::sync::CancellationToken;

// Cross-subsystem integration tests
#[cfg(test)]
mod tests;
