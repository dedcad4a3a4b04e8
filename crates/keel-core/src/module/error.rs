//! Error types raised from module lifecycle hooks.
use crate::module::descriptor::ModuleState;
use crate::module::service::InterfaceRef;

/// Error produced by a module hook. The container wraps these with the
/// failing module's identity and lifecycle phase before propagating.
#[derive(Debug, thiserror::Error)]
pub enum ModuleError {
    /// The module's configuration section is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// A service the module needs at runtime was not present.
    #[error("missing required service '{interface}'")]
    MissingService { interface: InterfaceRef },

    /// An I/O operation failed during an async phase.
    #[error("I/O error during {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// Attempted lifecycle transition that is not strictly forward.
    #[error("invalid lifecycle transition from {from} to {to}")]
    InvalidTransition { from: ModuleState, to: ModuleState },

    /// Any other hook failure.
    #[error("{0}")]
    Other(String),
}

impl From<&str> for ModuleError {
    fn from(msg: &str) -> Self {
        ModuleError::Other(msg.to_string())
    }
}

impl From<String> for ModuleError {
    fn from(msg: String) -> Self {
        ModuleError::Other(msg)
    }
}
