//! # Genesis Module
//!
//! The genesis JSON document (size limits, reward schedule, difficulty
//! retarget parameters, authorities, native token metadata) and the
//! loader that turns it into the genesis [`chain_types::StoredBlock`]
//! plus the [`chain_consensus::NetworkParams`] every other subsystem is
//! configured from.

pub mod builder;

pub use builder::{build_genesis, GenesisConfig, GenesisError, GenesisLoad};
