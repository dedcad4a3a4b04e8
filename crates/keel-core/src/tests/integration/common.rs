use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::composite::registry::{ServiceBinder, ServiceRegistry};
use crate::module::context::ModuleContext;
use crate::module::error::ModuleError;
use crate::module::service::{InterfaceRef, ServiceDependency, ServiceScope};
use crate::module::Module;
use crate::plugin::descriptor::{PluginDescriptor, PluginKind};
use crate::plugin::Plugin;
use tokio_util::sync::CancellationToken;

/// Shared recorder of hook invocations, `phase:module` per entry.
pub type Tracker = Arc<Mutex<Vec<String>>>;

pub fn new_tracker() -> Tracker {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn recorded(tracker: &Tracker) -> Vec<String> {
    tracker.lock().unwrap().clone()
}

/// The lifecycle phase a tracked module is configured to fail in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPhase {
    None,
    Start,
    Run,
    Stop,
}

/// Service registered by exposing tracked modules, carrying its provider's
/// module name so consumers can observe who they resolved.
pub struct ProvidedService {
    pub provider: String,
}

/// A module whose hooks record themselves into a shared tracker and whose
/// failure behavior is configurable per phase.
pub struct TrackedModule {
    name: String,
    exposes: Vec<InterfaceRef>,
    consumes: Vec<ServiceDependency>,
    fail: FailPhase,
    start_delay: Option<Duration>,
    tracker: Tracker,
}

impl TrackedModule {
    pub fn new(name: &str, tracker: Tracker) -> Self {
        Self {
            name: name.to_string(),
            exposes: Vec::new(),
            consumes: Vec::new(),
            fail: FailPhase::None,
            start_delay: None,
            tracker,
        }
    }

    pub fn exposing(mut self, interface: InterfaceRef) -> Self {
        self.exposes.push(interface);
        self
    }

    pub fn consuming(mut self, dependency: ServiceDependency) -> Self {
        self.consumes.push(dependency);
        self
    }

    pub fn failing_in(mut self, phase: FailPhase) -> Self {
        self.fail = phase;
        self
    }

    /// Make `start` sleep before completing, for cancellation tests.
    pub fn slow_start(mut self, delay: Duration) -> Self {
        self.start_delay = Some(delay);
        self
    }

    fn record(&self, phase: &str) {
        self.tracker
            .lock()
            .unwrap()
            .push(format!("{}:{}", phase, self.name));
    }
}

#[async_trait]
impl Module for TrackedModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn exposes(&self) -> Vec<InterfaceRef> {
        self.exposes.clone()
    }

    fn consumes(&self) -> Vec<ServiceDependency> {
        self.consumes.clone()
    }

    fn register_services(&self, services: &mut ServiceBinder<'_>) -> Result<(), ModuleError> {
        self.record("register");
        for interface in &self.exposes {
            services.provide(
                interface.clone(),
                ServiceScope::Singleton,
                Arc::new(ProvidedService {
                    provider: self.name.clone(),
                }),
            );
        }
        Ok(())
    }

    fn configure(&mut self, _ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        self.record("configure");
        Ok(())
    }

    async fn start(
        &mut self,
        services: &Arc<ServiceRegistry>,
        _cancel: &CancellationToken,
    ) -> Result<(), ModuleError> {
        if let Some(delay) = self.start_delay {
            tokio::time::sleep(delay).await;
        }
        self.record("start");

        // Observe consumed services; optional dependencies may be absent
        for dep in &self.consumes {
            match services.resolve::<ProvidedService>(&dep.interface) {
                Some(service) => self.record(&format!("resolved:{}", service.provider)),
                None => self.record(&format!("absent:{}", dep.interface)),
            }
        }

        if self.fail == FailPhase::Start {
            return Err(ModuleError::Other("simulated start failure".to_string()));
        }
        Ok(())
    }

    async fn run(&mut self, _services: &Arc<ServiceRegistry>) -> Result<(), ModuleError> {
        self.record("run");
        if self.fail == FailPhase::Run {
            return Err(ModuleError::Other("simulated run failure".to_string()));
        }
        Ok(())
    }

    async fn stop(&mut self, _services: &Arc<ServiceRegistry>) -> Result<(), ModuleError> {
        self.record("stop");
        if self.fail == FailPhase::Stop {
            return Err(ModuleError::Other("simulated stop failure".to_string()));
        }
        Ok(())
    }
}

/// A plugin that hands out a pre-built module list once.
pub struct TrackedPlugin {
    descriptor: PluginDescriptor,
    modules: Mutex<Vec<Box<dyn Module>>>,
}

impl Plugin for TrackedPlugin {
    fn descriptor(&self) -> PluginDescriptor {
        self.descriptor.clone()
    }

    fn modules(&self) -> Vec<Box<dyn Module>> {
        std::mem::take(&mut *self.modules.lock().unwrap())
    }
}

/// Build a boxed application plugin from its modules.
pub fn plugin(id: &str, modules: Vec<Box<dyn Module>>) -> Box<TrackedPlugin> {
    Box::new(TrackedPlugin {
        descriptor: PluginDescriptor::new(id, id, PluginKind::Application),
        modules: Mutex::new(modules),
    })
}
