//! # Adapter Implementations
//!
//! Outbound adapters the binary supplies to the library crates: a RocksDB
//! `KeyValueStore` for `chain-storage`, and (via `genesis`) the startup-time
//! construction of everything else from in-memory/reference implementations
//! already shipped by those crates.

pub mod storage;

pub use storage::*;
