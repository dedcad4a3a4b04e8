//! The host's own plugin: consumes the services the other plugins expose
//! and produces a small report once the composite is running.
use std::sync::Arc;

use async_trait::async_trait;

use calc_plugin::{CalcService, CALC_SERVICE};
use core_telemetry::{TelemetrySink, TELEMETRY_SINK};
use keel_core::module::context::ModuleContext;
use keel_core::module::error::ModuleError;
use keel_core::module::service::ServiceDependency;
use keel_core::module::Module;
use keel_core::plugin::descriptor::{PluginDescriptor, PluginKind};
use keel_core::plugin::Plugin;
use keel_core::{CancellationToken, ServiceRegistry};

struct ReportModule {
    calc: Option<Arc<CalcService>>,
    telemetry: Option<Arc<TelemetrySink>>,
}

impl ReportModule {
    fn new() -> Self {
        Self {
            calc: None,
            telemetry: None,
        }
    }
}

#[async_trait]
impl Module for ReportModule {
    fn name(&self) -> &str {
        "report"
    }

    fn consumes(&self) -> Vec<ServiceDependency> {
        vec![
            ServiceDependency::required(CALC_SERVICE),
            ServiceDependency::optional(TELEMETRY_SINK),
        ]
    }

    fn configure(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        ctx.capture("consumes", CALC_SERVICE.name());
        Ok(())
    }

    async fn start(
        &mut self,
        services: &Arc<ServiceRegistry>,
        _cancel: &CancellationToken,
    ) -> Result<(), ModuleError> {
        self.calc = services.resolve::<CalcService>(&CALC_SERVICE);
        if self.calc.is_none() {
            return Err(ModuleError::MissingService {
                interface: CALC_SERVICE,
            });
        }
        self.telemetry = services.resolve::<TelemetrySink>(&TELEMETRY_SINK);
        Ok(())
    }

    async fn run(&mut self, _services: &Arc<ServiceRegistry>) -> Result<(), ModuleError> {
        let calc = self
            .calc
            .as_ref()
            .ok_or_else(|| ModuleError::MissingService {
                interface: CALC_SERVICE,
            })?;

        log::info!(
            "host report: 0.1 + 0.2 = {}, 1.005 * 100 = {}",
            calc.add(0.1, 0.2),
            calc.mul(1.005, 100.0)
        );
        if let Some(sink) = &self.telemetry {
            sink.record("host.report");
        }
        Ok(())
    }
}

/// The plugin representing this host process.
pub struct HostPlugin;

impl Plugin for HostPlugin {
    fn descriptor(&self) -> PluginDescriptor {
        PluginDescriptor::new("keel-host", "Keel Host", PluginKind::Host)
            .with_description("Demo host consuming the calculator and telemetry services")
    }

    fn modules(&self) -> Vec<Box<dyn Module>> {
        vec![Box::new(ReportModule::new())]
    }
}
