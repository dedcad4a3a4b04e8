use std::borrow::Cow;
use std::fmt;

use serde::Serialize;

/// Identity of a service interface exposed or consumed by a module.
///
/// Interfaces are named rather than reflected: two refs with the same name
/// denote the same interface regardless of which crate declared them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct InterfaceRef(Cow<'static, str>);

impl InterfaceRef {
    /// Create an interface reference from an owned or borrowed name.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// Create an interface reference from a static name, usable in `const`
    /// contexts so crates can export their interface ids as constants.
    pub const fn named(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// The interface name.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InterfaceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&'static str> for InterfaceRef {
    fn from(name: &'static str) -> Self {
        Self::named(name)
    }
}

/// Represents a dependency of a module on a service interface
#[derive(Debug, Clone, Serialize)]
pub struct ServiceDependency {
    /// The interface the module consumes
    pub interface: InterfaceRef,

    /// Whether this is a hard requirement or an optional dependency
    pub required: bool,
}

impl ServiceDependency {
    /// Create a new required dependency
    pub fn required(interface: InterfaceRef) -> Self {
        Self {
            interface,
            required: true,
        }
    }

    /// Create a new optional dependency
    pub fn optional(interface: InterfaceRef) -> Self {
        Self {
            interface,
            required: false,
        }
    }
}

impl fmt::Display for ServiceDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let requirement_type = if self.required { "Requires" } else { "Optional" };
        write!(f, "{} service: {}", requirement_type, self.interface)
    }
}

/// Lifetime scope a service implementation is registered at.
///
/// The scope is policy for the consuming host/DI layer; the registry only
/// records it alongside the entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ServiceScope {
    /// One shared instance for the composite's lifetime
    Singleton,
    /// One instance per resolution scope of the host
    Scoped,
    /// A fresh instance per resolution
    Transient,
}

impl fmt::Display for ServiceScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceScope::Singleton => write!(f, "singleton"),
            ServiceScope::Scoped => write!(f, "scoped"),
            ServiceScope::Transient => write!(f, "transient"),
        }
    }
}
