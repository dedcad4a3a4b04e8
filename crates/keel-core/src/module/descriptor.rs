use std::fmt;

use serde::Serialize;

use crate::module::error::ModuleError;
use crate::module::service::{InterfaceRef, ServiceDependency};

/// Lifecycle state of a module. Transitions are strictly forward; a module
/// never regresses, and re-entering the current state (e.g. a second start)
/// is a fatal bootstrap error rather than a silent no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum ModuleState {
    /// Declared by its plugin, not yet touched by the lifecycle
    Registered,
    /// `initialize` completed
    Initialized,
    /// `configure` completed
    Configured,
    /// `register_services` completed
    ServicesRegistered,
    /// `start` completed
    Started,
    /// `run` completed
    Running,
    /// `stop` attempted (success or not)
    Stopped,
}

impl fmt::Display for ModuleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModuleState::Registered => "registered",
            ModuleState::Initialized => "initialized",
            ModuleState::Configured => "configured",
            ModuleState::ServicesRegistered => "services-registered",
            ModuleState::Started => "started",
            ModuleState::Running => "running",
            ModuleState::Stopped => "stopped",
        };
        write!(f, "{}", name)
    }
}

/// Runtime record of a module: its owning plugin, the interfaces it exposes
/// and consumes, and its current lifecycle state.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleDescriptor {
    plugin_id: String,
    name: String,
    exposes: Vec<InterfaceRef>,
    consumes: Vec<ServiceDependency>,
    state: ModuleState,
}

impl ModuleDescriptor {
    /// Create a descriptor for a freshly declared module.
    pub fn new(
        plugin_id: &str,
        name: &str,
        exposes: Vec<InterfaceRef>,
        consumes: Vec<ServiceDependency>,
    ) -> Self {
        Self {
            plugin_id: plugin_id.to_string(),
            name: name.to_string(),
            exposes,
            consumes,
            state: ModuleState::Registered,
        }
    }

    /// Id of the owning plugin.
    pub fn plugin_id(&self) -> &str {
        &self.plugin_id
    }

    /// Module name, unique within its plugin.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fully qualified module identity (`plugin::module`), used in logs,
    /// errors and the dependency graph.
    pub fn identity(&self) -> String {
        format!("{}::{}", self.plugin_id, self.name)
    }

    /// Interfaces this module exposes.
    pub fn exposes(&self) -> &[InterfaceRef] {
        &self.exposes
    }

    /// Interfaces this module consumes.
    pub fn consumes(&self) -> &[ServiceDependency] {
        &self.consumes
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ModuleState {
        self.state
    }

    /// Advance to a later lifecycle state. Forward jumps are allowed (a
    /// module that never ran still moves straight to `Stopped`); staying
    /// put or moving backwards is an invalid transition.
    pub(crate) fn advance(&mut self, next: ModuleState) -> Result<(), ModuleError> {
        if next <= self.state {
            return Err(ModuleError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }
}
