//! # Keel Dependency Resolver
//!
//! Orders modules so that every provider of a consumed service interface
//! completes its lifecycle phases before the consumer. The graph is built
//! from the exposed/consumed interface sets of the module descriptors and
//! sorted with a depth-first topological sort. Cycles are fatal and are
//! reported with the full cycle path.
pub mod error;
pub mod graph;

pub use error::ResolutionError;
pub use graph::DependencyGraph;

// Test module declaration
#[cfg(test)]
mod tests;
