// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! FleetWatch - fleet telemetry anomaly monitor

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use fleetwatch::core::SystemClock;
use fleetwatch::{Config, DemoFleetProvider, Engine, GeotabProvider, SnapshotProvider, VERSION};

/// Vehicles in the simulated fleet
const DEMO_FLEET_SIZE: usize = 60;

/// FleetWatch - fleet telemetry anomaly monitor
#[derive(Parser, Debug)]
#[command(name = "fleetwatch")]
#[command(version = VERSION)]
#[command(about = "Periodic anomaly detection and alerting over live fleet telemetry")]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Use a simulated fleet instead of the telemetry API
    #[arg(long)]
    demo: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable trace-level logging
    #[arg(long)]
    trace: bool,

    /// Seconds between monitor cycles
    #[arg(long)]
    interval_secs: Option<u64>,

    /// Run a single cycle, print its alerts as JSON and exit
    #[arg(long)]
    once: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let _ = dotenvy::dotenv();

    // Load or create configuration
    let config_path = args.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load_or_create(&config_path)?;

    // Override with environment and command line args
    config.apply_env();
    if args.demo {
        config.demo_mode = true;
    }
    if let Some(secs) = args.interval_secs {
        config.monitor.interval_secs = secs;
    }
    config.validate()?;

    // Initialize logging
    let log_level = if args.trace {
        Level::TRACE
    } else if args.debug {
        Level::DEBUG
    } else {
        config.log_level.parse().unwrap_or(Level::INFO)
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(args.debug)
        .with_line_number(args.debug)
        .with_ansi(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("🚗 {} v{}", config.app_name, VERSION);
    info!("Configuration loaded from {:?}", config_path);
    info!("Demo mode: {}", config.demo_mode);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(config, args.once))
}

fn build_provider(config: &Config) -> Result<Arc<dyn SnapshotProvider>> {
    if config.demo_mode {
        return Ok(Arc::new(DemoFleetProvider::new(DEMO_FLEET_SIZE)));
    }
    if config.telemetry.username.is_none() || config.telemetry.password.is_none() {
        warn!("No telemetry credentials set (GEOTAB_USERNAME / GEOTAB_PASSWORD); cycles will fail until configured");
    }
    Ok(Arc::new(GeotabProvider::new(config.telemetry.clone())?))
}

async fn run(config: Config, once: bool) -> Result<()> {
    let provider = build_provider(&config)?;
    let engine = Engine::new(config.monitor.clone(), provider, Arc::new(SystemClock));

    if once {
        let alerts = engine.trigger_check_now().await;
        println!("{}", serde_json::to_string_pretty(&alerts)?);
        return Ok(());
    }

    // Log alerts as they are first stored
    let mut alerts = engine.subscribe_alerts();
    let logger = tokio::spawn(async move {
        loop {
            match alerts.recv().await {
                Ok(alert) => info!("[{}] {} {}", alert.severity, alert.alert_type, alert.message),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Alert log lagged, skipped {} alerts", n)
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    engine.start().await;
    info!("   Press Ctrl+C to shutdown");

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, cleaning up...");

    engine.shutdown().await;
    let status = engine.status();
    info!("Retained {} alerts at shutdown", status.total_alerts);

    drop(engine);
    logger.abort();

    info!("FleetWatch shutdown complete");
    Ok(())
}
