//! # Node Configuration
//!
//! CLI flags (`clap`, derive API) layered over environment variables
//! (`CHAIN_*` prefix) and an optional config file, resolved through the
//! `config` crate. `~`-prefixed paths are expanded with `shellexpand`
//! before use, following `Liquid369-rusty-blox`'s CLI tooling.

use std::path::PathBuf;

use clap::Parser;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration resolution/validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config file {path}: {source}")]
    FileLoad {
        path: String,
        #[source]
        source: config::ConfigError,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Command-line flags. Every flag has a matching `CHAIN_*` environment
/// variable (via `#[arg(env = ...)]`) and falls back to the value in an
/// optional config file, then to the built-in default.
#[derive(Parser, Debug, Clone)]
#[command(name = "chain-node", about = "Chain ingestion and synchronization engine")]
pub struct Cli {
    /// Path to an optional TOML config file layered under CLI/env.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Path to the genesis JSON document.
    #[arg(long, env = "CHAIN_GENESIS_FILE", value_name = "PATH")]
    pub genesis_file: Option<PathBuf>,

    /// Directory for chain data (RocksDB files). `~` is expanded.
    #[arg(long, env = "CHAIN_DATA_DIR", value_name = "PATH")]
    pub data_dir: Option<String>,

    /// TCP port the P2P listener binds to.
    #[arg(long, env = "CHAIN_P2P_PORT")]
    pub p2p_port: Option<u16>,

    /// Network label ("mainnet", "testnet", ...), for log context.
    #[arg(long, env = "CHAIN_NETWORK")]
    pub network: Option<String>,

    /// Address block rewards accrue to when this node mines.
    #[arg(long, env = "CHAIN_BENEFICIARY")]
    pub beneficiary: Option<String>,

    /// Enable local mining (out of scope for the sync engine itself;
    /// recorded so the flag surface matches what operators expect).
    #[arg(long, env = "CHAIN_MINING_ENABLE")]
    pub mining_enable: bool,

    /// Mining worker thread count.
    #[arg(long, env = "CHAIN_MINING_THREADS")]
    pub mining_threads: Option<usize>,
}

/// Fully resolved node configuration: CLI overrides env overrides file
/// overrides defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    pub genesis_file: PathBuf,
    pub data_dir: String,
    pub p2p_port: u16,
    pub network: String,
    pub beneficiary: Option<String>,
    pub mining_enable: bool,
    pub mining_threads: usize,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            genesis_file: PathBuf::from("./genesis.json"),
            data_dir: "./data".to_string(),
            p2p_port: 30303,
            network: "testnet".to_string(),
            beneficiary: None,
            mining_enable: false,
            mining_threads: num_cpus::get(),
        }
    }
}

impl NodeConfig {
    /// Resolve CLI flags, `CHAIN_*` environment variables (already
    /// folded into `cli` by `clap`'s `env` attribute) and an optional
    /// config file into one `NodeConfig`.
    pub fn resolve(cli: Cli) -> Result<Self, ConfigError> {
        let defaults = NodeConfig::default();

        let mut builder = config::Config::builder()
            .set_default("genesis_file", defaults.genesis_file.to_string_lossy().to_string())
            .map_err(|e| ConfigError::Invalid(e.to_string()))?
            .set_default("data_dir", defaults.data_dir.clone())
            .map_err(|e| ConfigError::Invalid(e.to_string()))?
            .set_default("p2p_port", defaults.p2p_port as i64)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?
            .set_default("network", defaults.network.clone())
            .map_err(|e| ConfigError::Invalid(e.to_string()))?
            .set_default("mining_enable", defaults.mining_enable)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?
            .set_default("mining_threads", defaults.mining_threads as i64)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        if let Some(path) = &cli.config {
            builder = builder.add_source(config::File::from(path.as_path()));
        }

        let layered = builder
            .build()
            .map_err(|source| ConfigError::FileLoad {
                path: cli.config.as_ref().map(|p| p.display().to_string()).unwrap_or_default(),
                source,
            })?;

        let mut resolved = NodeConfig {
            genesis_file: PathBuf::from(
                layered.get_string("genesis_file").map_err(|e| ConfigError::Invalid(e.to_string()))?,
            ),
            data_dir: layered.get_string("data_dir").map_err(|e| ConfigError::Invalid(e.to_string()))?,
            p2p_port: layered.get_int("p2p_port").map_err(|e| ConfigError::Invalid(e.to_string()))? as u16,
            network: layered.get_string("network").map_err(|e| ConfigError::Invalid(e.to_string()))?,
            beneficiary: None,
            mining_enable: layered
                .get_bool("mining_enable")
                .map_err(|e| ConfigError::Invalid(e.to_string()))?,
            mining_threads: layered
                .get_int("mining_threads")
                .map_err(|e| ConfigError::Invalid(e.to_string()))? as usize,
        };

        // CLI flags always win over file/default values; `clap`'s `env`
        // attribute already folded `CHAIN_*` env vars into `cli` at this
        // layer, so CLI vs env precedence is handled before we ever get here.
        if let Some(genesis_file) = cli.genesis_file {
            resolved.genesis_file = genesis_file;
        }
        if let Some(data_dir) = cli.data_dir {
            resolved.data_dir = data_dir;
        }
        if let Some(p2p_port) = cli.p2p_port {
            resolved.p2p_port = p2p_port;
        }
        if let Some(network) = cli.network {
            resolved.network = network;
        }
        if let Some(beneficiary) = cli.beneficiary {
            resolved.beneficiary = Some(beneficiary);
        }
        if cli.mining_enable {
            resolved.mining_enable = true;
        }
        if let Some(mining_threads) = cli.mining_threads {
            resolved.mining_threads = mining_threads;
        }

        resolved.data_dir = shellexpand::tilde(&resolved.data_dir).into_owned();

        resolved.validate()?;
        Ok(resolved)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.p2p_port == 0 {
            return Err(ConfigError::Invalid("p2p_port must be nonzero".into()));
        }
        if self.mining_threads == 0 {
            return Err(ConfigError::Invalid("mining_threads must be nonzero".into()));
        }
        Ok(())
    }
}
