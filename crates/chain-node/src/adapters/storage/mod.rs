//! # Production Storage Adapters
//!
//! RocksDB-backed [`chain_storage::ports::outbound::KeyValueStore`].
//! Enable the `rocksdb` feature to build against it; without it the node
//! falls back to `chain_storage::InMemoryKVStore` (dev/test profile).

#[cfg(feature = "rocksdb")]
pub mod rocksdb_adapter;

#[cfg(feature = "rocksdb")]
pub use rocksdb_adapter::{RocksDbConfig, RocksDbStore};
