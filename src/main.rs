//! Sharding front-end.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────────┐
//!                      │                   FRONT-END                      │
//!   Client request     │  ┌─────────┐   ┌──────────┐   ┌──────────────┐   │
//!   ───────────────────┼─▶│ ingress │──▶│ receiver │──▶│ shard router │───┼──▶ storage node k
//!                      │  └─────────┘   └────┬─────┘   └──────────────┘   │   (k = hash(origin) % N)
//!                      │                     │ new_request                │
//!                      │                     ▼                            │
//!                      │             ┌───────────────┐                    │
//!                      │             │  correlation  │                    │
//!                      │             │     table     │                    │
//!                      │             └───────▲───────┘                    │
//!                      │                     │ lookup / retire            │
//!   Client response    │               ┌─────┴─────┐                      │
//!   ◀──────────────────┼───────────────│ responder │◀─────────────────────┼─── storage node k
//!                      │               │ (1/shard) │──▶ audit sink        │
//!                      │               └───────────┘                      │
//!                      └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use shardgate::config::{load_config, FrontEndConfig};
use shardgate::lifecycle::signals::shutdown_signal;
use shardgate::observability::{logging, metrics};
use shardgate::FrontEndServer;

#[derive(Parser)]
#[command(name = "shardgate")]
#[command(about = "Sharding front-end for storage nodes", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Client listener address (overrides listener.bind_address).
    #[arg(long)]
    bind: Option<String>,

    /// Storage node bridge address (overrides bridge.bind_address).
    #[arg(long)]
    bridge: Option<String>,

    /// Number of storage nodes to wait for (overrides bridge.shards).
    #[arg(long)]
    shards: Option<usize>,

    /// Receiver pool size (overrides listener.receivers).
    #[arg(long)]
    receivers: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => FrontEndConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }
    if let Some(bridge) = cli.bridge {
        config.bridge.bind_address = bridge;
    }
    if let Some(shards) = cli.shards {
        config.bridge.shards = shards;
    }
    if let Some(receivers) = cli.receivers {
        config.listener.receivers = receivers;
    }
    shardgate::config::validate_config(&config).map_err(|errors| {
        errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    })?;

    logging::init_logging(&config.observability.log_level);
    tracing::info!("shardgate v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        bridge_address = %config.bridge.bind_address,
        shards = config.bridge.shards,
        receivers = config.listener.receivers,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let server = tokio::select! {
        started = FrontEndServer::start(&config) => started?,
        _ = shutdown_signal() => {
            tracing::info!("Interrupted during startup");
            return Ok(());
        }
    };

    tokio::select! {
        _ = server.run() => {}
        _ = shutdown_signal() => {}
    }
    server.shutdown().await;

    tracing::info!("Shutdown complete");
    Ok(())
}
