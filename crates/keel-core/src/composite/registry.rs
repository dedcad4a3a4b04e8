use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use crate::module::service::{InterfaceRef, ServiceScope};

/// One registered implementation: the providing module, the declared
/// lifetime scope, and the instance itself (type-erased).
pub struct ServiceEntry {
    provider: String,
    scope: ServiceScope,
    instance: Arc<dyn Any + Send + Sync>,
}

impl ServiceEntry {
    /// Identity of the module that registered this implementation.
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Declared lifetime scope.
    pub fn scope(&self) -> ServiceScope {
        self.scope
    }

    /// Downcast the instance to its concrete type.
    pub fn instance<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        Arc::downcast::<T>(self.instance.clone()).ok()
    }
}

/// The runtime service registry assembled during composition.
///
/// Maps each service interface to the implementations modules contributed
/// in `register_services`. Mutated only during the single-flow bootstrap;
/// read-only once the composite is running. Resolution semantics beyond
/// presence (scoping, per-request instantiation) are policy for the
/// consuming host layer.
#[derive(Default)]
pub struct ServiceRegistry {
    entries: HashMap<InterfaceRef, Vec<ServiceEntry>>,
}

impl ServiceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    fn register_entry(
        &mut self,
        interface: InterfaceRef,
        provider: &str,
        scope: ServiceScope,
        instance: Arc<dyn Any + Send + Sync>,
    ) {
        self.entries.entry(interface).or_default().push(ServiceEntry {
            provider: provider.to_string(),
            scope,
            instance,
        });
    }

    /// Whether at least one implementation of the interface is registered.
    pub fn contains(&self, interface: &InterfaceRef) -> bool {
        self.entries
            .get(interface)
            .is_some_and(|entries| !entries.is_empty())
    }

    /// Resolve the first registered implementation of an interface as the
    /// concrete type `T`. `None` when no provider registered one (the
    /// "no provider" observation for optional dependencies) or when the
    /// registered instance is not a `T`.
    pub fn resolve<T: Any + Send + Sync>(&self, interface: &InterfaceRef) -> Option<Arc<T>> {
        self.entries
            .get(interface)
            .and_then(|entries| entries.first())
            .and_then(|entry| entry.instance::<T>())
    }

    /// Resolve every registered implementation of an interface that is a
    /// `T`, in registration order.
    pub fn resolve_all<T: Any + Send + Sync>(&self, interface: &InterfaceRef) -> Vec<Arc<T>> {
        self.entries
            .get(interface)
            .map(|entries| entries.iter().filter_map(|e| e.instance::<T>()).collect())
            .unwrap_or_default()
    }

    /// All entries registered for an interface.
    pub fn entries_for(&self, interface: &InterfaceRef) -> &[ServiceEntry] {
        self.entries
            .get(interface)
            .map(|e| e.as_slice())
            .unwrap_or(&[])
    }

    /// The registered interfaces, in no particular order.
    pub fn interfaces(&self) -> impl Iterator<Item = &InterfaceRef> {
        self.entries.keys()
    }

    /// Total number of registered implementations.
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Write handle a module receives in `register_services`, scoped to that
/// module so every contribution is attributed to its provider.
pub struct ServiceBinder<'a> {
    registry: &'a mut ServiceRegistry,
    provider: &'a str,
}

impl<'a> ServiceBinder<'a> {
    pub(crate) fn new(registry: &'a mut ServiceRegistry, provider: &'a str) -> Self {
        Self { registry, provider }
    }

    /// Contribute an implementation of `interface` at the given scope.
    pub fn provide<T: Any + Send + Sync>(
        &mut self,
        interface: InterfaceRef,
        scope: ServiceScope,
        instance: Arc<T>,
    ) {
        self.registry
            .register_entry(interface, self.provider, scope, instance);
    }
}
