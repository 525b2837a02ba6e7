//! # Chain Storage
//!
//! Content-addressed persistence for blocks, headers, the height->hash
//! index and the tx->block index (C1: `BlockStore`), fronted by four
//! in-memory caches, plus a stateless read façade over the canonical
//! chain (C2: `ChainQuery`).
//!
//! ## Layout
//!
//! A single embedded key-value store partitioned into four column
//! families: `blocks`, `height_index`, `tx_index`, `metadata`. A
//! `StoredBlock` is created on first successful ingestion and never
//! mutated after; during a reorg it is demoted from canonical (its
//! `height_index` entry removed) but never physically deleted from
//! `blocks`.
//!
//! ## Crate structure (hexagonal architecture)
//!
//! - `domain/` - cache structures and storage configuration
//! - `ports/` - the `BlockStore`/`ChainQuery` driving ports and the
//!   `KeyValueStore` driven port
//! - `service/` - `BlockStoreService`, the concrete implementation

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::config::StorageConfig;
pub use ports::inbound::{BlockStore, ChainQuery, WriteBatch};
pub use ports::outbound::{BatchOperation, ColumnFamily, InMemoryKVStore, KeyValueStore};
pub use service::BlockStoreService;
