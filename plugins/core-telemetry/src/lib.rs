//! Core plugin exposing a process-wide telemetry sink service.
//!
//! Other modules resolve [`TelemetrySink`] through the service registry and
//! record named counters; the sink's totals are flushed to the log on stop.
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use keel_core::module::context::ModuleContext;
use keel_core::module::error::ModuleError;
use keel_core::module::service::{InterfaceRef, ServiceScope};
use keel_core::module::Module;
use keel_core::plugin::catalog::TypeRef;
use keel_core::plugin::descriptor::{PluginDescriptor, PluginKind};
use keel_core::plugin::Plugin;
use keel_core::report::ScopedLog;
use keel_core::{ServiceBinder, ServiceRegistry};

/// Interface under which the sink is registered.
pub const TELEMETRY_SINK: InterfaceRef = InterfaceRef::named("telemetry.sink");

/// Thread-safe counter sink shared across the composite.
#[derive(Debug, Default)]
pub struct TelemetrySink {
    counters: Mutex<HashMap<String, u64>>,
}

impl TelemetrySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment a named counter.
    pub fn record(&self, counter: &str) {
        let mut counters = self.counters.lock().expect("telemetry counters poisoned");
        *counters.entry(counter.to_string()).or_insert(0) += 1;
    }

    /// Snapshot of all counters.
    pub fn snapshot(&self) -> HashMap<String, u64> {
        self.counters
            .lock()
            .expect("telemetry counters poisoned")
            .clone()
    }
}

/// Module exposing the sink to the rest of the composite.
#[derive(Default)]
struct SinkModule {
    enabled: bool,
    sink: Option<Arc<TelemetrySink>>,
}

#[async_trait]
impl Module for SinkModule {
    fn name(&self) -> &str {
        "sink"
    }

    fn exposes(&self) -> Vec<InterfaceRef> {
        vec![TELEMETRY_SINK]
    }

    fn initialize(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        self.enabled = ctx
            .setting("enabled")
            .and_then(|v| v.as_bool())
            .unwrap_or(true);
        self.sink = Some(Arc::new(TelemetrySink::new()));
        Ok(())
    }

    fn configure(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        ctx.capture("enabled", self.enabled);
        Ok(())
    }

    fn register_services(&self, services: &mut ServiceBinder<'_>) -> Result<(), ModuleError> {
        if !self.enabled {
            log::info!("Telemetry disabled by configuration; sink not registered");
            return Ok(());
        }
        let sink = self
            .sink
            .clone()
            .ok_or_else(|| ModuleError::Config("telemetry sink not initialized".to_string()))?;
        services.provide(TELEMETRY_SINK, ServiceScope::Singleton, sink);
        Ok(())
    }

    async fn stop(&mut self, _services: &Arc<ServiceRegistry>) -> Result<(), ModuleError> {
        if let Some(sink) = &self.sink {
            for (counter, total) in sink.snapshot() {
                log::info!("telemetry: {} = {}", counter, total);
            }
        }
        Ok(())
    }

    fn log(&self, scope: &mut ScopedLog<'_>) {
        scope.insert("interface", TELEMETRY_SINK.name());
    }
}

/// The telemetry plugin registered by the host.
#[derive(Default)]
pub struct TelemetryPlugin;

impl Plugin for TelemetryPlugin {
    fn descriptor(&self) -> PluginDescriptor {
        PluginDescriptor::new("core-telemetry", "Core Telemetry", PluginKind::Core)
            .with_description("In-process counter sink for composite diagnostics")
    }

    fn types(&self) -> Vec<TypeRef> {
        vec![TypeRef::new("TelemetrySink").implementing(TELEMETRY_SINK)]
    }

    fn modules(&self) -> Vec<Box<dyn Module>> {
        vec![Box::new(SinkModule::default())]
    }

    fn log(&self, scope: &mut ScopedLog<'_>) {
        scope.insert("version", json!(env!("CARGO_PKG_VERSION")));
    }
}
