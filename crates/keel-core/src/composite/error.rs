//! # Keel Composite Errors
//!
//! Defines the error taxonomy of the composite lifecycle: fatal
//! [`CompositionError`]s raised while assembling the composite, fatal
//! [`StartupError`]s raised while bringing it live (after best-effort
//! teardown of whatever did start), and non-fatal [`ShutdownWarning`]s
//! accumulated during stop. The crate-level [`Error`] aggregates the fatal
//! kinds for callers that do not care which stage failed.
use thiserror::Error as ThisError;

use crate::composite::state::CompositeState;
use crate::module::error::ModuleError;
use crate::plugin::error::CatalogError;
use crate::resolver::error::ResolutionError;

/// A lifecycle phase a module hook runs in, used to locate failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ThisError)]
pub enum LifecyclePhase {
    #[error("scan")]
    Scan,
    #[error("initialize")]
    Initialize,
    #[error("configure")]
    Configure,
    #[error("register-services")]
    RegisterServices,
    #[error("start")]
    Start,
    #[error("run")]
    Run,
    #[error("stop")]
    Stop,
}

/// Fatal error raised during `register_plugin`/`compose`. The bootstrap
/// aborts; no partial composite is left behind.
#[derive(Debug, ThisError)]
pub enum CompositionError {
    /// A plugin with the same id is already registered.
    #[error("plugin already registered: {plugin_id}")]
    DuplicatePlugin { plugin_id: String },

    /// Registration was attempted after scanning had begun.
    #[error("plugin registration is closed once scanning has begun (container state: {state})")]
    RegistrationClosed { state: CompositeState },

    /// An operation was invoked in the wrong container state.
    #[error("invalid container state: expected {expected}, found {actual}")]
    InvalidState {
        expected: CompositeState,
        actual: CompositeState,
    },

    /// Populating a plugin's type catalog failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Module dependency resolution failed (cycle or missing provider).
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// A module hook raised during a composition phase.
    #[error("module '{module}' failed during {phase}: {source}")]
    ModuleHook {
        phase: LifecyclePhase,
        module: String,
        #[source]
        source: ModuleError,
    },
}

/// Fatal error raised during `start`. Modules that did start have already
/// been given a best-effort reverse-order stop before this is raised.
#[derive(Debug, ThisError)]
pub enum StartupError {
    /// A module's `start` or `run` hook raised.
    #[error("module '{module}' failed during {phase}: {source}")]
    ModuleFailed {
        phase: LifecyclePhase,
        module: String,
        #[source]
        source: ModuleError,
    },

    /// Cancellation was observed before the composite reached `Running`.
    #[error("startup cancelled at module '{module}'")]
    Cancelled { module: String },

    /// `start` was invoked in the wrong container state.
    #[error("invalid container state: expected {expected}, found {actual}")]
    InvalidState {
        expected: CompositeState,
        actual: CompositeState,
    },
}

/// Non-fatal per-module failure during the stop phase. Accumulated and
/// logged; never aborts the remaining modules' teardown.
#[derive(Debug, ThisError)]
#[error("module '{module}' failed to stop: {source}")]
pub struct ShutdownWarning {
    pub module: String,
    #[source]
    pub source: ModuleError,
}

/// Custom error type for the Keel composite runtime
#[derive(Debug, ThisError)]
pub enum Error {
    /// Specific, typed composition error
    #[error("composition error: {0}")]
    Composition(#[from] CompositionError),

    /// Specific, typed startup error
    #[error("startup error: {0}")]
    Startup(#[from] StartupError),

    /// Module hook error outside a tracked phase
    #[error("module error: {0}")]
    Module(#[from] ModuleError),

    /// Settings parsing error
    #[error("settings error: {0}")]
    Settings(#[from] crate::composite::settings::SettingsError),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

/// Shorthand for Result with our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Other(msg.to_string())
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Other(msg)
    }
}
