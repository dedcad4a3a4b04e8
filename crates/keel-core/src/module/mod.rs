//! # Keel Module System
//!
//! A module is a unit of behavior owned by a plugin. Modules participate in
//! every lifecycle phase through the [`Module`] trait hooks and declare
//! which service interfaces they expose to, and consume from, the rest of
//! the composite. Hooks default to no-ops, so a module only implements the
//! phases it cares about.
pub mod context;
pub mod descriptor;
pub mod error;
pub mod service;

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::composite::registry::{ServiceBinder, ServiceRegistry};
use crate::module::service::{InterfaceRef, ServiceDependency};
use crate::report::ScopedLog;

// Re-export important types
pub use context::ModuleContext;
pub use descriptor::{ModuleDescriptor, ModuleState};
pub use error::ModuleError;

/// Lifecycle hooks of a module. Every hook not overridden is a no-op.
///
/// The synchronous hooks (`initialize`, `configure`, `register_services`)
/// run during composition and must not perform I/O; the async hooks run
/// once the composite is assembled and may suspend.
#[async_trait]
pub trait Module: Send + Sync {
    /// The module's name, unique within its owning plugin.
    fn name(&self) -> &str;

    /// Service interfaces this module exposes for other modules to consume.
    fn exposes(&self) -> Vec<InterfaceRef> {
        Vec::new()
    }

    /// Service interfaces this module consumes, each marked required or
    /// optional. Providers of required interfaces complete their earlier
    /// phases before this module advances.
    fn consumes(&self) -> Vec<ServiceDependency> {
        Vec::new()
    }

    /// Wire up configuration-derived fields. Runs first, in dependency
    /// order; must not perform I/O.
    fn initialize(&mut self, _ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        Ok(())
    }

    /// Validate and adjust configuration now that every module is
    /// initialized. Diagnostics go to the composite log via the context.
    fn configure(&mut self, _ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        Ok(())
    }

    /// Contribute concrete implementations to the service registry.
    fn register_services(&self, _services: &mut ServiceBinder<'_>) -> Result<(), ModuleError> {
        Ok(())
    }

    /// Start the module. May perform asynchronous I/O (open connections,
    /// spawn workers). Every provider this module requires has completed
    /// `register_services` by the time this runs.
    async fn start(
        &mut self,
        _services: &Arc<ServiceRegistry>,
        _cancel: &CancellationToken,
    ) -> Result<(), ModuleError> {
        Ok(())
    }

    /// Executed after all modules have started; intended for cross-module
    /// actions that need every service live.
    async fn run(&mut self, _services: &Arc<ServiceRegistry>) -> Result<(), ModuleError> {
        Ok(())
    }

    /// Reverse-order teardown. Failures here are collected as warnings and
    /// never abort other modules' stop phase.
    async fn stop(&mut self, _services: &Arc<ServiceRegistry>) -> Result<(), ModuleError> {
        Ok(())
    }

    /// Contribute arbitrary diagnostic key/values to the composite log.
    fn log(&self, _scope: &mut ScopedLog<'_>) {}
}

// Test module declaration
#[cfg(test)]
mod tests;
