//! # Genesis Block Builder
//!
//! Parses the genesis JSON document and builds the height-0
//! [`chain_types::StoredBlock`] plus the [`chain_consensus::NetworkParams`]
//! every other subsystem is configured from. Consumed once at startup.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use chain_consensus::{DifficultyParams, NetworkParams};
use chain_types::{
    merkle_root, Address, Block, BlockHeader, ConnectedSource, Difficulty, StoredBlock,
    StoredBlockBuilder, TimestampMs,
};

/// Genesis creation/loading errors.
#[derive(Debug, Error)]
pub enum GenesisError {
    #[error("failed to read genesis file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse genesis JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid genesis configuration: {0}")]
    InvalidConfig(String),
}

/// An authority/founder entry present at genesis (block-reward
/// distribution target, not a validator set — this chain has no
/// stake-weighted consensus).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenesisAuthority {
    pub address: Address,
    pub label: String,
}

/// Native token metadata carried in the genesis document for wallets and
/// block explorers; the ingestion core itself never reads these fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
}

/// The genesis JSON document: size limits, reward schedule, ASERT
/// difficulty-retarget parameters, authorities, and native token
/// metadata. Everything `chain-consensus::NetworkParams` and the
/// genesis `StoredBlock` need, gathered in one place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenesisConfig {
    /// Network identifier ("mainnet", "testnet", ...), used for log
    /// context and nothing else.
    pub network: String,

    /// Genesis timestamp, epoch milliseconds.
    pub genesis_timestamp: TimestampMs,

    /// Genesis difficulty (also doubles as the ASERT floor unless
    /// `minimum_difficulty` overrides it).
    #[serde(with = "u256_decimal")]
    pub genesis_difficulty: Difficulty,

    /// Minimum difficulty the retarget can ever produce.
    #[serde(with = "u256_decimal")]
    pub minimum_difficulty: Difficulty,

    /// ASERT target block interval, seconds.
    pub target_mining_time_secs: u64,

    /// ASERT half-life, seconds.
    pub half_life_secs: u64,

    /// Maximum encoded header size, bytes.
    pub max_header_size: usize,

    /// Maximum transaction count per block.
    pub max_tx_count: usize,

    /// Maximum encoded block size, bytes.
    pub max_block_size: usize,

    /// Maximum encoded transaction size, bytes.
    pub max_tx_size: usize,

    /// Permitted clock skew for header timestamp validation, milliseconds.
    pub clock_skew_ms: TimestampMs,

    /// Coinbase/block reward at height 0 onward (flat; no halving
    /// schedule modeled yet, tracked as an open question in design notes).
    pub block_reward: u64,

    /// Minimum per-byte fee a transaction must pay to be relayed/mined.
    pub fee_floor: u64,

    /// Address the block reward accrues to when no miner-specific
    /// beneficiary is configured.
    pub reward_pool_address: Address,

    /// Founders/authorities recorded in the genesis document.
    pub authorities: Vec<GenesisAuthority>,

    /// Native token metadata.
    pub token: TokenMetadata,
}

impl GenesisConfig {
    /// Load and parse a genesis document from disk.
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, GenesisError> {
        let path_ref = path.as_ref();
        let contents = std::fs::read_to_string(path_ref).map_err(|source| GenesisError::Read {
            path: path_ref.display().to_string(),
            source,
        })?;
        let config: GenesisConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), GenesisError> {
        if self.target_mining_time_secs == 0 {
            return Err(GenesisError::InvalidConfig(
                "target_mining_time_secs must be nonzero".into(),
            ));
        }
        if self.half_life_secs == 0 {
            return Err(GenesisError::InvalidConfig("half_life_secs must be nonzero".into()));
        }
        if self.max_tx_count == 0 || self.max_block_size == 0 || self.max_header_size == 0 {
            return Err(GenesisError::InvalidConfig(
                "size limits must be nonzero".into(),
            ));
        }
        Ok(())
    }

    /// Derive the `NetworkParams` consumed by `BlockValidator`.
    pub fn network_params(&self) -> NetworkParams {
        NetworkParams {
            max_header_size: self.max_header_size,
            max_tx_count: self.max_tx_count,
            max_block_size: self.max_block_size,
            max_tx_size: self.max_tx_size,
            clock_skew: self.clock_skew_ms,
            difficulty: DifficultyParams::new(
                self.target_mining_time_secs,
                self.half_life_secs,
                self.minimum_difficulty,
            ),
        }
    }
}

/// The built genesis block plus the params derived from its config,
/// ready to seed storage and the event bus.
pub struct GenesisLoad {
    pub config: GenesisConfig,
    pub stored_block: StoredBlock,
    pub network_params: NetworkParams,
}

/// Build the height-0 `StoredBlock` from a parsed `GenesisConfig`. No
/// transactions; a coinbase-only genesis is out of scope since the
/// reward pool balance is an execution-layer concern this crate never
/// touches.
pub fn build_genesis(config: GenesisConfig) -> GenesisLoad {
    let tx_root_hash = merkle_root(std::iter::empty());

    let header = BlockHeader::new(
        1,
        0,
        [0u8; 32],
        tx_root_hash,
        [0u8; 32],
        config.genesis_timestamp,
        config.genesis_difficulty,
        config.reward_pool_address,
        0,
        None,
    );

    let block = Block::new(header, Vec::new());

    let stored_block = StoredBlockBuilder::new(block, ConnectedSource::Genesis)
        .cumulative_difficulty(config.genesis_difficulty)
        .received_at(config.genesis_timestamp)
        .received_from(config.reward_pool_address)
        .build();

    let network_params = config.network_params();

    GenesisLoad { config, stored_block, network_params }
}

/// `U256` has no default `serde` decimal representation; genesis JSON
/// carries difficulty as a decimal string so large values survive
/// round-tripping without truncation.
mod u256_decimal {
    use chain_types::Difficulty;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Difficulty, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Difficulty, D::Error> {
        let s = String::deserialize(deserializer)?;
        Difficulty::from_dec_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> GenesisConfig {
        GenesisConfig {
            network: "testnet".into(),
            genesis_timestamp: 1_700_000_000_000,
            genesis_difficulty: Difficulty::from(1024u64),
            minimum_difficulty: Difficulty::from(1u64),
            target_mining_time_secs: 600,
            half_life_secs: 3600,
            max_header_size: 1024,
            max_tx_count: 5000,
            max_block_size: 4 * 1024 * 1024,
            max_tx_size: 128 * 1024,
            clock_skew_ms: 2 * 60 * 60 * 1000,
            block_reward: 50_000_000_000,
            fee_floor: 1,
            reward_pool_address: [0xAAu8; 20],
            authorities: vec![GenesisAuthority { address: [0x01u8; 20], label: "foundation".into() }],
            token: TokenMetadata { symbol: "CHN".into(), name: "Chain".into(), decimals: 8 },
        }
    }

    #[test]
    fn builds_height_zero_block_with_zero_parent() {
        let load = build_genesis(sample_config());
        assert_eq!(load.stored_block.block.header.height, 0);
        assert_eq!(load.stored_block.block.header.previous_hash, [0u8; 32]);
        assert_eq!(load.stored_block.cumulative_difficulty, Difficulty::from(1024u64));
    }

    #[test]
    fn network_params_carry_the_asert_inputs() {
        let load = build_genesis(sample_config());
        assert_eq!(load.network_params.difficulty.target_mining_time_secs, 600);
        assert_eq!(load.network_params.difficulty.half_life_secs, 3600);
        assert_eq!(load.network_params.max_tx_count_at(0), 5000);
    }

    #[test]
    fn rejects_zero_target_mining_time() {
        let mut config = sample_config();
        config.target_mining_time_secs = 0;
        let json = serde_json::to_string(&config).unwrap();
        let path = std::env::temp_dir().join(format!("genesis-test-{}.json", std::process::id()));
        std::fs::write(&path, json).unwrap();

        let result = GenesisConfig::load(&path);
        std::fs::remove_file(&path).ok();
        assert!(result.is_err());
    }

    #[test]
    fn round_trips_through_json() {
        let config = sample_config();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: GenesisConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.genesis_difficulty, config.genesis_difficulty);
        assert_eq!(parsed.authorities.len(), 1);
    }
}
