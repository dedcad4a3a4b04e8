//! # Keel Composite Container
//!
//! The aggregator that owns every registered plugin and module, drives the
//! multi-phase lifecycle in resolved dependency order, and assembles the
//! runtime service registry handed to the host.
//!
//! ## Key Submodules and Responsibilities:
//!
//! - **[`container`]**: The [`CompositeContainer`](container::CompositeContainer)
//!   itself: registration, composition, startup, shutdown, disposal.
//! - **[`registry`]**: The [`ServiceRegistry`](registry::ServiceRegistry)
//!   mapping service interfaces to the implementations modules contribute.
//! - **[`settings`]**: Per-plugin configuration sections read by modules
//!   during initialization.
//! - **[`state`]**: The container's strictly ordered lifecycle states.
//! - **[`error`]**: Composition/startup/shutdown error taxonomy and the
//!   crate-level [`Error`](error::Error)/[`Result`](error::Result).
pub mod container;
pub mod error;
pub mod registry;
pub mod settings;
pub mod state;

pub use container::CompositeContainer;
pub use error::{CompositionError, Error, Result, ShutdownWarning, StartupError};
pub use registry::{ServiceBinder, ServiceRegistry};
pub use settings::CompositeSettings;
pub use state::CompositeState;

// Test module declaration
#[cfg(test)]
mod tests;
