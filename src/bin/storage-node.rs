//! Reference storage node: dials the front-end and serves one shard.

use std::path::PathBuf;

use clap::Parser;

use shardgate::config::{load_storage_config, validate_storage_config, StorageConfig};
use shardgate::lifecycle::signals::shutdown_signal;
use shardgate::observability::logging;
use shardgate::StorageNode;

#[derive(Parser)]
#[command(name = "storage-node")]
#[command(about = "Storage shard for the shardgate front-end", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Front-end bridge address (overrides bridge_address).
    #[arg(long)]
    bridge: Option<String>,

    /// Data directory (overrides root).
    #[arg(long)]
    root: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_storage_config(path)?,
        None => StorageConfig::default(),
    };
    if let Some(bridge) = cli.bridge {
        config.bridge_address = bridge;
    }
    if let Some(root) = cli.root {
        config.root = root;
    }
    validate_storage_config(&config).map_err(|errors| {
        errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    })?;

    logging::init_logging(&config.log_level);
    tracing::info!(
        bridge_address = %config.bridge_address,
        root = %config.root,
        "storage-node starting"
    );

    let node = StorageNode::connect(&config).await?;
    tokio::select! {
        result = node.run() => result?,
        _ = shutdown_signal() => {}
    }

    tracing::info!("storage-node stopped");
    Ok(())
}
