//! Example plugin: a fixed-precision calculator service.
//!
//! Demonstrates the three composition surfaces a plugin has: contributing
//! catalog types, exposing a service other modules consume, and consuming
//! an optional service (the telemetry sink) itself.
use std::sync::Arc;

use async_trait::async_trait;

use core_telemetry::{TelemetrySink, TELEMETRY_SINK};
use keel_core::module::context::ModuleContext;
use keel_core::module::error::ModuleError;
use keel_core::module::service::{InterfaceRef, ServiceDependency, ServiceScope};
use keel_core::module::Module;
use keel_core::plugin::catalog::TypeRef;
use keel_core::plugin::descriptor::{PluginDescriptor, PluginKind};
use keel_core::plugin::Plugin;
use keel_core::{CancellationToken, ServiceBinder, ServiceRegistry};

/// Interface under which the calculator is registered.
pub const CALC_SERVICE: InterfaceRef = InterfaceRef::named("calc.service");

/// Interface implemented by the contributed operation types.
pub const CALC_OPERATION: InterfaceRef = InterfaceRef::named("calc.op");

/// Marker attached to the operation types this plugin contributes.
pub const OPERATION_MARKER: &str = "calc.operation";

/// A calculator rounding every result to a configured number of decimal
/// places.
#[derive(Debug)]
pub struct CalcService {
    precision: u32,
}

impl CalcService {
    pub fn new(precision: u32) -> Self {
        Self { precision }
    }

    pub fn precision(&self) -> u32 {
        self.precision
    }

    fn round(&self, value: f64) -> f64 {
        let factor = 10f64.powi(self.precision as i32);
        (value * factor).round() / factor
    }

    pub fn add(&self, a: f64, b: f64) -> f64 {
        self.round(a + b)
    }

    pub fn mul(&self, a: f64, b: f64) -> f64 {
        self.round(a * b)
    }
}

/// Module wiring the calculator into the composite.
struct EngineModule {
    precision: u32,
    service: Option<Arc<CalcService>>,
    telemetry: Option<Arc<TelemetrySink>>,
}

impl EngineModule {
    fn new() -> Self {
        Self {
            precision: 2,
            service: None,
            telemetry: None,
        }
    }
}

#[async_trait]
impl Module for EngineModule {
    fn name(&self) -> &str {
        "engine"
    }

    fn exposes(&self) -> Vec<InterfaceRef> {
        vec![CALC_SERVICE]
    }

    fn consumes(&self) -> Vec<ServiceDependency> {
        vec![ServiceDependency::optional(TELEMETRY_SINK)]
    }

    fn initialize(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        self.precision = ctx
            .setting("precision")
            .and_then(|v| v.as_u64())
            .unwrap_or(2) as u32;
        self.service = Some(Arc::new(CalcService::new(self.precision)));
        Ok(())
    }

    fn configure(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        if self.precision > 12 {
            return Err(ModuleError::Config(format!(
                "precision {} exceeds the supported maximum of 12",
                self.precision
            )));
        }
        ctx.capture("precision", self.precision);

        // Operations may be contributed by any plugin in the composite
        let operations: Vec<String> = ctx
            .catalog()
            .find_marked(OPERATION_MARKER)
            .map(|t| t.name().to_string())
            .collect();
        ctx.capture("operations", operations);
        Ok(())
    }

    fn register_services(&self, services: &mut ServiceBinder<'_>) -> Result<(), ModuleError> {
        let service = self
            .service
            .clone()
            .ok_or_else(|| ModuleError::Config("calculator not initialized".to_string()))?;
        services.provide(CALC_SERVICE, ServiceScope::Singleton, service);
        Ok(())
    }

    async fn start(
        &mut self,
        services: &Arc<ServiceRegistry>,
        _cancel: &CancellationToken,
    ) -> Result<(), ModuleError> {
        // Telemetry is optional; run without it when no sink is present
        self.telemetry = services.resolve::<TelemetrySink>(&TELEMETRY_SINK);
        if let Some(sink) = &self.telemetry {
            sink.record("calc.started");
        }
        Ok(())
    }

    async fn run(&mut self, _services: &Arc<ServiceRegistry>) -> Result<(), ModuleError> {
        if let Some(service) = &self.service {
            log::debug!("calculator self-check: 0.1 + 0.2 = {}", service.add(0.1, 0.2));
        }
        Ok(())
    }
}

/// The calculator plugin registered by the host.
#[derive(Default)]
pub struct CalcPlugin;

impl Plugin for CalcPlugin {
    fn descriptor(&self) -> PluginDescriptor {
        PluginDescriptor::new("calc", "Calculator", PluginKind::Application)
            .with_description("Fixed-precision arithmetic service")
    }

    fn types(&self) -> Vec<TypeRef> {
        vec![
            TypeRef::new("AddOperation")
                .implementing(CALC_OPERATION)
                .marked(OPERATION_MARKER),
            TypeRef::new("MulOperation")
                .implementing(CALC_OPERATION)
                .marked(OPERATION_MARKER),
        ]
    }

    fn modules(&self) -> Vec<Box<dyn Module>> {
        vec![Box::new(EngineModule::new())]
    }
}
