//! The block store service: wires a [`KeyValueStore`](crate::ports::outbound::KeyValueStore)
//! adapter to the four in-memory caches and implements [`BlockStore`](crate::ports::inbound::BlockStore)
//! and [`ChainQuery`](crate::ports::inbound::ChainQuery) over it.

mod query;
mod store;

use chain_types::{Hash, Height};

use crate::domain::caches::StorageCaches;
use crate::domain::config::StorageConfig;
use crate::ports::outbound::{ColumnFamily, KeyValueStore, METADATA_LATEST_BLOCK_HASH};

/// The block store service. Generic over the key-value backend so tests can
/// run against [`crate::ports::outbound::InMemoryKVStore`] while `chain-node`
/// wires in a RocksDB-backed implementation.
pub struct BlockStoreService<KV: KeyValueStore> {
    pub(crate) kv: KV,
    pub(crate) caches: StorageCaches,
    pub(crate) config: StorageConfig,
}

impl<KV: KeyValueStore> BlockStoreService<KV> {
    /// Construct a new service, recovering `latest_block_cache` from the
    /// `metadata` column family if the store already has data.
    pub fn new(kv: KV, config: StorageConfig) -> Self {
        let caches = StorageCaches::new(&config);
        let service = Self { kv, caches, config };
        service.recover_latest_from_metadata();
        service
    }

    fn recover_latest_from_metadata(&self) {
        if let Ok(Some(bytes)) = self.kv.get(ColumnFamily::Metadata, METADATA_LATEST_BLOCK_HASH) {
            if let Ok((height, hash)) = bincode::deserialize::<(Height, Hash)>(&bytes) {
                self.caches.latest.set(height, hash);
            }
        }
    }
}
