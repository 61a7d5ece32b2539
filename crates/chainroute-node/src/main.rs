//! Chainroute Node — entry point.
//!
//! Starts the network monitor, routing engine and HTTP API with configuration
//! from a TOML file or defaults.

mod api;
mod config;
mod node;
mod state;

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use config::{ChainrouteConfig, FeeSource};
use node::ChainrouteNode;

/// Chainroute Node
#[derive(Parser, Debug)]
#[command(name = "chainroute-node", version, about = "Chainroute payment routing node")]
struct Args {
    /// Path to the configuration file (TOML).
    #[arg(short, long, default_value = "chainroute.toml")]
    config: PathBuf,

    /// Override the API port.
    #[arg(long)]
    api_port: Option<u16>,

    /// Override the polling interval in milliseconds.
    #[arg(long)]
    update_interval_ms: Option<u64>,

    /// Use the fixed gas price table instead of querying RPC endpoints.
    #[arg(long)]
    fixed_fees: bool,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,

    /// Log as JSON lines instead of text.
    #[arg(long)]
    json_logs: bool,

    /// Generate a default config file and exit.
    #[arg(long)]
    init: bool,
}

fn init_tracing(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    if format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Handle --init flag
    if args.init {
        init_tracing(args.log_level.as_deref().unwrap_or("info"), "text");
        let config = ChainrouteConfig::default();
        config.save(&args.config)?;
        tracing::info!(path = %args.config.display(), "wrote default config");
        return Ok(());
    }

    // Load configuration
    let mut config = ChainrouteConfig::load(&args.config)?;

    // Apply CLI overrides
    if let Some(api_port) = args.api_port {
        config.api.port = api_port;
    }
    if let Some(interval) = args.update_interval_ms {
        config.monitor.update_interval_ms = interval;
    }
    if args.fixed_fees {
        config.monitor.fee_source = FeeSource::Fixed;
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    if args.json_logs {
        config.logging.format = "json".into();
    }

    init_tracing(&config.logging.level, &config.logging.format);
    tracing::info!("Chainroute Node v{}", env!("CARGO_PKG_VERSION"));

    let mut node = ChainrouteNode::new(config)?;
    node.start().await?;

    // Set up graceful shutdown on SIGINT
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
        tracing::info!("received shutdown signal");
    };

    tokio::select! {
        result = node.run() => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP API server error");
            }
        }
        _ = shutdown => {
            tracing::info!("initiating graceful shutdown");
        }
    }

    node.shutdown().await?;
    tracing::info!("Chainroute node exited cleanly");
    Ok(())
}
