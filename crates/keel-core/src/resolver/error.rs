//! Error types for module dependency resolution.
use crate::module::service::InterfaceRef;

/// Errors raised while building or sorting the module dependency graph.
#[derive(Debug, thiserror::Error)]
pub enum ResolutionError {
    /// Dependency cycle detected; the path lists the module identities
    /// around the cycle, first module repeated at the end.
    #[error("circular module dependency detected: {}", .0.join(" -> "))]
    CyclicDependency(Vec<String>),

    /// A required interface has no exposing module anywhere in the
    /// composite.
    #[error("module '{consumer}' requires an implementation of '{interface}', but no module exposes it")]
    MissingProvider {
        consumer: String,
        interface: InterfaceRef,
    },
}
