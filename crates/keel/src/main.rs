mod host;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use log::{error, info, warn};

use calc_plugin::CalcPlugin;
use core_telemetry::TelemetryPlugin;
use keel_core::{CancellationToken, CompositeContainer, CompositeSettings};

use host::HostPlugin;

/// Keel: a composite-application runtime
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct CliArgs {
    /// Path to a settings file (JSON, TOML or YAML by extension)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compose the plugins and run until Ctrl-C
    Run {
        /// Print the composite log as JSON once the composite is running
        #[arg(long)]
        report: bool,

        /// Abort startup after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
    /// Compose the plugins and list them with their resolved module order
    Plugins {},
}

fn load_settings(path: Option<&Path>) -> Result<CompositeSettings, String> {
    let Some(path) = path else {
        return Ok(CompositeSettings::new());
    };
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read settings file '{}': {}", path.display(), e))?;
    let parsed = match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => CompositeSettings::from_toml_str(&text),
        Some("yaml") | Some("yml") => CompositeSettings::from_yaml_str(&text),
        _ => CompositeSettings::from_json_str(&text),
    };
    parsed.map_err(|e| e.to_string())
}

/// Build the container with every statically registered plugin.
fn build_container(settings: CompositeSettings) -> Result<CompositeContainer, keel_core::Error> {
    let mut container = CompositeContainer::with_settings(settings);
    container.register_plugin(Box::new(TelemetryPlugin))?;
    container.register_plugin(Box::new(CalcPlugin))?;
    container.register_plugin(Box::new(HostPlugin))?;
    Ok(container)
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    let args = CliArgs::parse();

    let settings = match load_settings(args.settings.as_deref()) {
        Ok(settings) => settings,
        Err(message) => {
            error!("{}", message);
            return ExitCode::FAILURE;
        }
    };

    let mut container = match build_container(settings) {
        Ok(container) => container,
        Err(e) => {
            error!("Failed to register plugins: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match args.command {
        Some(Commands::Plugins {}) => {
            if let Err(e) = container.compose() {
                error!("Composition failed: {}", e);
                return ExitCode::FAILURE;
            }
            println!("Registered plugins:");
            for descriptor in container.plugin_descriptors() {
                println!("  - {}", descriptor);
            }
            println!("Resolved module order:");
            for identity in container.resolved_order() {
                println!("  - {}", identity);
            }
            ExitCode::SUCCESS
        }
        Some(Commands::Run {
            report,
            timeout_secs,
        }) => run_composite(&mut container, report, timeout_secs).await,
        None => run_composite(&mut container, false, None).await,
    }
}

async fn run_composite(
    container: &mut CompositeContainer,
    report: bool,
    timeout_secs: Option<u64>,
) -> ExitCode {
    if let Err(e) = container.compose() {
        error!("Composition failed: {}", e);
        return ExitCode::FAILURE;
    }
    info!("Composite assembled; starting modules...");

    // Ctrl-C during startup cancels it; afterwards it requests shutdown
    let cancel = CancellationToken::new();
    {
        let trigger = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                trigger.cancel();
            }
        });
    }

    let started = match timeout_secs {
        Some(secs) => {
            container
                .start_with_timeout(&cancel, Duration::from_secs(secs))
                .await
        }
        None => container.start(&cancel).await,
    };
    if let Err(e) = started {
        error!("Startup failed: {}", e);
        return ExitCode::FAILURE;
    }

    if report {
        match serde_json::to_string_pretty(&container.export_report()) {
            Ok(text) => println!("{}", text),
            Err(e) => warn!("Could not serialize composite report: {}", e),
        }
    }

    info!("Composite running; press Ctrl-C to stop.");
    cancel.cancelled().await;

    let warnings = container.stop().await;
    for warning in &warnings {
        warn!("{}", warning);
    }
    container.dispose();

    // Shutdown warnings are non-fatal; they were surfaced in the logs
    ExitCode::SUCCESS
}
