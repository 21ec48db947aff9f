//! pf-status-relay operator - development runner
//!
//! Runs the controller against the in-memory store, optionally seeded with
//! monitors from a JSON file, and logs every monitor event until interrupted.

use anyhow::Context;
use clap::Parser;
use relay_operator::{
    telemetry, InMemoryStore, MonitorStore, Operator, OperatorConfig,
};
use relay_types::LacpMonitor;
use std::sync::Arc;
use tracing::{error, info, warn};

/// pf-status-relay operator CLI
#[derive(Parser)]
#[command(name = "pf-status-relay-operator")]
#[command(about = "Keeps LACP monitor interface claims and relay workloads converged", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "PF_STATUS_RELAY_CONFIG")]
    config: Option<String>,

    /// JSON file holding an array of monitors to create at startup
    #[arg(short, long)]
    monitors: Option<String>,

    /// Log level, overrides the configuration file
    #[arg(long)]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config =
        OperatorConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    config.logging.json |= cli.json;

    telemetry::init_tracing(&config.logging).context("Failed to initialize tracing")?;

    let store = Arc::new(InMemoryStore::new());
    let watch = store.subscribe();
    let operator = Operator::new(config, store.clone(), store.clone());

    if let Some(path) = &cli.monitors {
        seed(&operator, &store, path).await?;
    }

    let mut events = operator.subscribe();
    tokio::spawn(async move {
        while let Ok(envelope) = events.recv().await {
            info!(
                monitor = %envelope.monitor,
                severity = ?envelope.severity,
                event = ?envelope.event,
                "Monitor event"
            );
        }
    });

    let controller = operator.controller();
    let runner = tokio::spawn(controller.clone().run(watch));

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("Shutting down");

    controller.stop();
    runner.await.context("Controller task failed")?;
    Ok(())
}

/// Create the monitors in `path`, admitting each one first
async fn seed(operator: &Operator, store: &InMemoryStore, path: &str) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read monitors from {}", path))?;
    let monitors: Vec<LacpMonitor> =
        serde_json::from_str(&raw).with_context(|| format!("Invalid monitors in {}", path))?;

    for monitor in monitors {
        let key = monitor.key();
        if let Err(e) = operator.admission().validate_create(&monitor).await {
            warn!(monitor = %key, error = %e, "Monitor rejected");
            continue;
        }
        match store.create_monitor(monitor).await {
            Ok(_) => info!(monitor = %key, "Monitor created"),
            Err(e) => error!(monitor = %key, error = %e, "Failed to create monitor"),
        }
    }

    Ok(())
}
