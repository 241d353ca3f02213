//! Slotwatch CLI
//!
//! Command-line interface for the visa slot monitor.

use std::path::PathBuf;

use clap::Parser;
use slotwatch::{load_config, Config, Mode, Phase, SlotWatchBuilder};
use tracing::Level;

#[derive(Parser)]
#[command(name = "slotwatch")]
#[command(about = "Visa appointment slot monitor")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Dashboard port (overrides config file)
    #[arg(long)]
    dashboard_port: Option<u16>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: Level,

    /// Begin monitoring immediately instead of waiting for a start command
    #[arg(long)]
    start: bool,

    /// Check cadence for this run (overrides saved settings)
    #[arg(long, value_enum)]
    mode: Option<Mode>,

    /// Alert policy, 0 for any slot or 1 for VAC only (overrides saved settings)
    #[arg(long)]
    phase: Option<Phase>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    tracing::debug!(
        "Parsed command line arguments: config={:?}, dashboard_port={:?}, log_level={:?}",
        args.config,
        args.dashboard_port,
        args.log_level
    );

    let mut config = if let Some(config_path) = &args.config {
        tracing::debug!("Loading configuration from {:?}", config_path);
        load_config(config_path)?
    } else {
        tracing::debug!("Using default configuration");
        Config::default()
    };

    if let Some(dashboard_port) = args.dashboard_port {
        config.dashboard.port = dashboard_port;
    }

    tracing::info!("Starting slot monitor for {}", config.target.url);

    let mut builder = SlotWatchBuilder::new(config);
    if args.start {
        builder = builder.start_immediately(args.mode, args.phase);
    } else if args.mode.is_some() || args.phase.is_some() {
        tracing::warn!("--mode and --phase only take effect together with --start");
    }

    builder.build()?.start().await?;

    Ok(())
}
