//! # Chain Node
//!
//! Entry point for the chain ingestion and synchronization engine: loads
//! configuration and the genesis document, opens storage, wires
//! `chain-consensus`/`chain-sync`/`chain-peers`/`chain-bus` together, and
//! drives `SyncManagerService`'s background poll loop until shutdown.
//!
//! ## Exit codes
//!
//! - `0`: clean shutdown
//! - `1`: fatal initialization error (bad config, unreadable genesis file)
//! - `2`: storage corruption detected at startup

use clap::Parser;
use tracing::{error, info};

use chain_node::container::{Cli, NodeConfig};
use chain_node::genesis::{build_genesis, GenesisConfig};
use chain_node::wiring::{self, WiringError};
use chain_sync::SyncConfig;
use chain_telemetry::{init_telemetry, TelemetryConfig};

#[tokio::main]
async fn main() {
    std::process::exit(run().await);
}

async fn run() -> i32 {
    let cli = Cli::parse();

    let config = match NodeConfig::resolve(cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("fatal: invalid configuration: {e}");
            return 1;
        }
    };

    let mut telemetry_config = TelemetryConfig::from_env();
    telemetry_config.network = config.network.clone();
    let _telemetry_guard = match init_telemetry(telemetry_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("fatal: failed to initialize telemetry: {e}");
            return 1;
        }
    };

    info!(network = %config.network, p2p_port = config.p2p_port, data_dir = %config.data_dir, "starting chain-node");

    let genesis_config = match GenesisConfig::load(&config.genesis_file) {
        Ok(g) => g,
        Err(e) => {
            error!(error = %e, path = %config.genesis_file.display(), "failed to load genesis document");
            return 1;
        }
    };
    let genesis_load = build_genesis(genesis_config);

    let node = match wiring::build_node(&config.data_dir, genesis_load).await {
        Ok(node) => node,
        Err(e @ WiringError::StorageOpen(_)) => {
            error!(error = %e, "storage corruption or open failure detected at startup");
            return 2;
        }
        Err(e) => {
            error!(error = %e, "fatal error while wiring subsystems");
            return 1;
        }
    };

    node.sync.start(SyncConfig::default());

    info!("chain-node is running. press Ctrl+C to stop.");
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
    }

    info!("shutting down...");
    node.sync.stop().await;

    0
}
