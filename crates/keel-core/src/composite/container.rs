use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::composite::error::{CompositionError, LifecyclePhase, ShutdownWarning, StartupError};
use crate::composite::registry::{ServiceBinder, ServiceRegistry};
use crate::composite::settings::CompositeSettings;
use crate::composite::state::CompositeState;
use crate::module::context::ModuleContext;
use crate::module::descriptor::{ModuleDescriptor, ModuleState};
use crate::module::Module;
use crate::plugin::catalog::TypeCatalog;
use crate::plugin::descriptor::PluginDescriptor;
use crate::plugin::Plugin;
use crate::report::{CompositeLog, CompositeReport};
use crate::resolver::graph::DependencyGraph;

struct ModuleHandle {
    descriptor: ModuleDescriptor,
    instance: Box<dyn Module>,
}

struct PluginHandle {
    descriptor: PluginDescriptor,
    plugin: Box<dyn Plugin>,
    /// Instantiated during the scan step
    modules: Vec<ModuleHandle>,
}

/// The composite container: owns every registered plugin and its modules,
/// drives the lifecycle phases in resolved dependency order, and assembles
/// the runtime service registry.
///
/// An explicit context object, created by the process entry point; there is
/// no global instance, so several composites can coexist in one process.
pub struct CompositeContainer {
    state: CompositeState,
    settings: CompositeSettings,
    catalog: TypeCatalog,
    plugins: Vec<PluginHandle>,
    /// Resolved (plugin, module) indices in dependency order; computed once
    /// during composition and reused by every later phase
    order: Vec<(usize, usize)>,
    /// Modules that completed `start`, in start order
    started: Vec<(usize, usize)>,
    services: Option<Arc<ServiceRegistry>>,
    log: CompositeLog,
}

impl CompositeContainer {
    /// Create an empty container with no plugin settings.
    pub fn new() -> Self {
        Self::with_settings(CompositeSettings::new())
    }

    /// Create an empty container with per-plugin configuration sections.
    pub fn with_settings(settings: CompositeSettings) -> Self {
        Self {
            state: CompositeState::Registered,
            settings,
            catalog: TypeCatalog::new(),
            plugins: Vec::new(),
            order: Vec::new(),
            started: Vec::new(),
            services: None,
            log: CompositeLog::new(),
        }
    }

    /// Register a plugin. Valid only before composition begins; a duplicate
    /// plugin id or a late registration is a fatal composition error.
    pub fn register_plugin(&mut self, plugin: Box<dyn Plugin>) -> Result<(), CompositionError> {
        if self.state != CompositeState::Registered {
            return Err(CompositionError::RegistrationClosed { state: self.state });
        }
        let descriptor = plugin.descriptor();
        if self.plugins.iter().any(|h| h.descriptor.id == descriptor.id) {
            return Err(CompositionError::DuplicatePlugin {
                plugin_id: descriptor.id,
            });
        }
        log::debug!("Registered plugin: {}", descriptor);
        self.plugins.push(PluginHandle {
            descriptor,
            plugin,
            modules: Vec::new(),
        });
        Ok(())
    }

    /// Assemble the composite: scan plugin type catalogs, instantiate
    /// modules, resolve the dependency order, then drive `initialize`,
    /// `configure` and `register_services` across all modules in that
    /// order. Returns the service registry handle for the host.
    ///
    /// The first hook failure aborts the whole composition with the
    /// offending module identity; no later-phase hook runs for any module.
    pub fn compose(&mut self) -> Result<Arc<ServiceRegistry>, CompositionError> {
        if self.state != CompositeState::Registered {
            return Err(CompositionError::InvalidState {
                expected: CompositeState::Registered,
                actual: self.state,
            });
        }

        self.scan()?;
        self.advance(CompositeState::Scanned);

        self.resolve()?;

        self.phase_initialize()?;
        self.advance(CompositeState::Initialized);

        self.phase_configure()?;
        self.advance(CompositeState::Configured);

        let mut registry = ServiceRegistry::new();
        self.phase_register(&mut registry)?;

        self.collect_logs();

        let services = Arc::new(registry);
        self.services = Some(services.clone());
        self.advance(CompositeState::ServicesRegistered);

        log::info!(
            "Composite assembled: {} plugins, {} modules, {} service registrations",
            self.plugins.len(),
            self.order.len(),
            services.len()
        );
        Ok(services)
    }

    /// Populate the type catalog and instantiate each plugin's modules, in
    /// registration order.
    fn scan(&mut self) -> Result<(), CompositionError> {
        log::info!("Scanning {} registered plugins...", self.plugins.len());
        for handle in &mut self.plugins {
            let id = handle.descriptor.id.clone();
            self.catalog.scan(&id, handle.plugin.types())?;

            let mut modules = Vec::new();
            for instance in handle.plugin.modules() {
                let descriptor = ModuleDescriptor::new(
                    &id,
                    instance.name(),
                    instance.exposes(),
                    instance.consumes(),
                );
                let exposed: Vec<String> =
                    descriptor.exposes().iter().map(|i| i.to_string()).collect();
                let consumed: Vec<String> = descriptor
                    .consumes()
                    .iter()
                    .map(|d| d.to_string())
                    .collect();
                self.log
                    .capture_module(&id, descriptor.name(), "exposes", json!(exposed));
                self.log
                    .capture_module(&id, descriptor.name(), "consumes", json!(consumed));
                modules.push(ModuleHandle {
                    descriptor,
                    instance,
                });
            }

            self.log
                .capture_plugin(&id, "name", handle.descriptor.name.clone());
            self.log
                .capture_plugin(&id, "kind", handle.descriptor.kind.to_string());
            self.log
                .capture_plugin(&id, "module_count", modules.len() as u64);
            handle.modules = modules;
        }
        Ok(())
    }

    /// Build the dependency graph and cache the resolved order.
    fn resolve(&mut self) -> Result<(), CompositionError> {
        let descriptors: Vec<ModuleDescriptor> = self
            .plugins
            .iter()
            .flat_map(|p| p.modules.iter().map(|m| m.descriptor.clone()))
            .collect();

        let graph = DependencyGraph::build(&descriptors)?;
        let flat_order = graph.topological_order()?;

        let mut flat_to_pair = Vec::with_capacity(descriptors.len());
        for (p, handle) in self.plugins.iter().enumerate() {
            for m in 0..handle.modules.len() {
                flat_to_pair.push((p, m));
            }
        }
        self.order = flat_order.into_iter().map(|i| flat_to_pair[i]).collect();

        log::debug!("Resolved module order: {:?}", self.resolved_order());
        Ok(())
    }

    fn phase_initialize(&mut self) -> Result<(), CompositionError> {
        let Self {
            plugins,
            catalog,
            settings,
            log,
            order,
            ..
        } = self;
        for &(p, m) in order.iter() {
            let PluginHandle {
                descriptor: plugin_desc,
                modules,
                ..
            } = &mut plugins[p];
            let ModuleHandle {
                descriptor,
                instance,
            } = &mut modules[m];

            log::debug!("Initializing module: {}", descriptor.identity());
            let mut ctx = ModuleContext::new(
                &plugin_desc.id,
                descriptor.name(),
                settings.plugin(&plugin_desc.id),
                catalog,
                log,
            );
            instance
                .initialize(&mut ctx)
                .map_err(|source| CompositionError::ModuleHook {
                    phase: LifecyclePhase::Initialize,
                    module: descriptor.identity(),
                    source,
                })?;
            let identity = descriptor.identity();
            descriptor
                .advance(ModuleState::Initialized)
                .map_err(|source| CompositionError::ModuleHook {
                    phase: LifecyclePhase::Initialize,
                    module: identity,
                    source,
                })?;
        }
        Ok(())
    }

    fn phase_configure(&mut self) -> Result<(), CompositionError> {
        let Self {
            plugins,
            catalog,
            settings,
            log,
            order,
            ..
        } = self;
        for &(p, m) in order.iter() {
            let PluginHandle {
                descriptor: plugin_desc,
                modules,
                ..
            } = &mut plugins[p];
            let ModuleHandle {
                descriptor,
                instance,
            } = &mut modules[m];

            log::debug!("Configuring module: {}", descriptor.identity());
            let mut ctx = ModuleContext::new(
                &plugin_desc.id,
                descriptor.name(),
                settings.plugin(&plugin_desc.id),
                catalog,
                log,
            );
            instance
                .configure(&mut ctx)
                .map_err(|source| CompositionError::ModuleHook {
                    phase: LifecyclePhase::Configure,
                    module: descriptor.identity(),
                    source,
                })?;
            let identity = descriptor.identity();
            descriptor
                .advance(ModuleState::Configured)
                .map_err(|source| CompositionError::ModuleHook {
                    phase: LifecyclePhase::Configure,
                    module: identity,
                    source,
                })?;
        }
        Ok(())
    }

    fn phase_register(&mut self, registry: &mut ServiceRegistry) -> Result<(), CompositionError> {
        let Self { plugins, order, .. } = self;
        for &(p, m) in order.iter() {
            let ModuleHandle {
                descriptor,
                instance,
            } = &mut plugins[p].modules[m];
            let identity = descriptor.identity();

            log::debug!("Registering services for module: {}", identity);
            let mut binder = ServiceBinder::new(registry, &identity);
            instance
                .register_services(&mut binder)
                .map_err(|source| CompositionError::ModuleHook {
                    phase: LifecyclePhase::RegisterServices,
                    module: identity.clone(),
                    source,
                })?;
            descriptor
                .advance(ModuleState::ServicesRegistered)
                .map_err(|source| CompositionError::ModuleHook {
                    phase: LifecyclePhase::RegisterServices,
                    module: identity,
                    source,
                })?;
        }
        Ok(())
    }

    /// Collect plugin- and module-level `log` contributions.
    fn collect_logs(&mut self) {
        let Self { plugins, log, .. } = self;
        for handle in plugins.iter() {
            let id = &handle.descriptor.id;
            {
                let mut scope = log.plugin_scope_mut(id);
                handle.plugin.log(&mut scope);
            }
            for module in &handle.modules {
                let mut scope = log.module_scope_mut(id, module.descriptor.name());
                module.instance.log(&mut scope);
            }
        }
    }

    /// Bring the composite live: drive `start`, then `run`, across all
    /// modules in dependency order. A hook failure or an observed
    /// cancellation triggers a best-effort reverse-order stop of every
    /// module that did start, then the startup error is re-raised.
    pub async fn start(&mut self, cancel: &CancellationToken) -> Result<(), StartupError> {
        if self.state != CompositeState::ServicesRegistered {
            return Err(StartupError::InvalidState {
                expected: CompositeState::ServicesRegistered,
                actual: self.state,
            });
        }
        let services = match &self.services {
            Some(s) => s.clone(),
            None => {
                return Err(StartupError::InvalidState {
                    expected: CompositeState::ServicesRegistered,
                    actual: self.state,
                })
            }
        };
        let order = self.order.clone();

        for &(p, m) in &order {
            let identity = self.plugins[p].modules[m].descriptor.identity();
            log::info!("Starting module: {}", identity);

            let outcome = {
                let instance = &mut self.plugins[p].modules[m].instance;
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    res = instance.start(&services, cancel) => Some(res),
                }
            };
            match outcome {
                None => return Err(self.abort_startup_cancelled(identity, &services).await),
                Some(Err(source)) => {
                    return Err(self
                        .abort_startup(LifecyclePhase::Start, identity, source, &services)
                        .await)
                }
                Some(Ok(())) => {
                    if let Err(source) =
                        self.plugins[p].modules[m].descriptor.advance(ModuleState::Started)
                    {
                        return Err(self
                            .abort_startup(LifecyclePhase::Start, identity, source, &services)
                            .await);
                    }
                    self.started.push((p, m));
                }
            }
        }
        self.advance(CompositeState::Started);

        for &(p, m) in &order {
            let identity = self.plugins[p].modules[m].descriptor.identity();
            log::debug!("Running module: {}", identity);

            let outcome = {
                let instance = &mut self.plugins[p].modules[m].instance;
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    res = instance.run(&services) => Some(res),
                }
            };
            match outcome {
                None => return Err(self.abort_startup_cancelled(identity, &services).await),
                Some(Err(source)) => {
                    return Err(self
                        .abort_startup(LifecyclePhase::Run, identity, source, &services)
                        .await)
                }
                Some(Ok(())) => {
                    if let Err(source) =
                        self.plugins[p].modules[m].descriptor.advance(ModuleState::Running)
                    {
                        return Err(self
                            .abort_startup(LifecyclePhase::Run, identity, source, &services)
                            .await);
                    }
                }
            }
        }
        self.advance(CompositeState::Running);

        log::info!("Composite running.");
        Ok(())
    }

    /// Convenience wrapper: start with an upper bound on total startup
    /// time. The timeout cancels a child of the supplied token, so it
    /// routes through the same best-effort stop path as an external
    /// cancellation without cancelling the caller's token.
    pub async fn start_with_timeout(
        &mut self,
        cancel: &CancellationToken,
        timeout: Duration,
    ) -> Result<(), StartupError> {
        let child = cancel.child_token();
        let deadline = child.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            deadline.cancel();
        });
        let result = self.start(&child).await;
        timer.abort();
        result
    }

    async fn abort_startup(
        &mut self,
        phase: LifecyclePhase,
        module: String,
        source: crate::module::error::ModuleError,
        services: &Arc<ServiceRegistry>,
    ) -> StartupError {
        log::error!("Startup failed at module '{}' during {}: {}", module, phase, source);
        self.stop_started(services).await;
        // Error path: the composite never reached Running
        self.state = CompositeState::Stopped;
        StartupError::ModuleFailed {
            phase,
            module,
            source,
        }
    }

    async fn abort_startup_cancelled(
        &mut self,
        module: String,
        services: &Arc<ServiceRegistry>,
    ) -> StartupError {
        log::warn!("Startup cancelled at module '{}'", module);
        self.stop_started(services).await;
        self.state = CompositeState::Stopped;
        StartupError::Cancelled { module }
    }

    /// Stop every started module in reverse start order, best-effort:
    /// failures are logged and collected, never aborting the rest.
    async fn stop_started(&mut self, services: &Arc<ServiceRegistry>) -> Vec<ShutdownWarning> {
        let mut warnings = Vec::new();
        let started: Vec<(usize, usize)> = self.started.drain(..).rev().collect();

        for (p, m) in started {
            let identity = self.plugins[p].modules[m].descriptor.identity();
            log::info!("Stopping module: {}", identity);

            if let Err(source) = self.plugins[p].modules[m].instance.stop(services).await {
                log::error!("Error stopping module {}: {}", identity, source);
                let plugin_id = self.plugins[p].descriptor.id.clone();
                let module_name = self.plugins[p].modules[m].descriptor.name().to_string();
                self.log.capture_module(
                    &plugin_id,
                    &module_name,
                    "shutdown_warning",
                    source.to_string(),
                );
                warnings.push(ShutdownWarning {
                    module: identity,
                    source,
                });
            }
            // Teardown was attempted either way
            self.plugins[p].modules[m]
                .descriptor
                .advance(ModuleState::Stopped)
                .ok();
        }
        warnings
    }

    /// Stop the composite: drive `stop` across all started modules in
    /// reverse dependency order. Per-module failures are returned as
    /// warnings (and captured in the composite log); they never prevent the
    /// remaining modules from stopping. A no-op outside `Started`/`Running`.
    pub async fn stop(&mut self) -> Vec<ShutdownWarning> {
        if self.state != CompositeState::Started && self.state != CompositeState::Running {
            return Vec::new();
        }
        let services = match &self.services {
            Some(s) => s.clone(),
            None => return Vec::new(),
        };
        let warnings = self.stop_started(&services).await;
        // Started (run never finished) jumps straight to Stopped
        self.state = CompositeState::Stopped;
        log::info!(
            "Composite stopped ({} warning{}).",
            warnings.len(),
            if warnings.len() == 1 { "" } else { "s" }
        );
        warnings
    }

    /// Release the container's resources. Valid from any state; idempotent.
    pub fn dispose(&mut self) {
        if self.state == CompositeState::Disposed {
            return;
        }
        log::info!("Disposing composite container");
        self.plugins.clear();
        self.order.clear();
        self.started.clear();
        self.services = None;
        self.state = CompositeState::Disposed;
    }

    /// Advance the container state along the ordinary sequence.
    fn advance(&mut self, next: CompositeState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "invalid container transition {} -> {}",
            self.state,
            next
        );
        self.state = next;
    }

    /// Current container state.
    pub fn state(&self) -> CompositeState {
        self.state
    }

    /// The service registry handle, once composition has produced it.
    pub fn services(&self) -> Option<Arc<ServiceRegistry>> {
        self.services.clone()
    }

    /// The composite log assembled so far.
    pub fn log(&self) -> &CompositeLog {
        &self.log
    }

    /// Export the composite log as an immutable snapshot.
    pub fn export_report(&self) -> CompositeReport {
        self.log.export()
    }

    /// Number of registered plugins.
    pub fn plugin_count(&self) -> usize {
        self.plugins.len()
    }

    /// Number of instantiated modules (0 before composition).
    pub fn module_count(&self) -> usize {
        self.plugins.iter().map(|p| p.modules.len()).sum()
    }

    /// Descriptors of the registered plugins, in registration order.
    pub fn plugin_descriptors(&self) -> impl Iterator<Item = &PluginDescriptor> {
        self.plugins.iter().map(|h| &h.descriptor)
    }

    /// Descriptors of the instantiated modules, in registration order.
    pub fn module_descriptors(&self) -> impl Iterator<Item = &ModuleDescriptor> {
        self.plugins.iter().flat_map(|p| p.modules.iter().map(|m| &m.descriptor))
    }

    /// Lifecycle state of one module.
    pub fn module_state(&self, plugin_id: &str, module: &str) -> Option<ModuleState> {
        self.plugins
            .iter()
            .find(|h| h.descriptor.id == plugin_id)
            .and_then(|h| h.modules.iter().find(|m| m.descriptor.name() == module))
            .map(|m| m.descriptor.state())
    }

    /// The resolved module identities in dependency order (empty before
    /// composition).
    pub fn resolved_order(&self) -> Vec<String> {
        self.order
            .iter()
            .map(|&(p, m)| self.plugins[p].modules[m].descriptor.identity())
            .collect()
    }
}

impl Default for CompositeContainer {
    fn default() -> Self {
        Self::new()
    }
}
