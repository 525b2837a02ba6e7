//! # Subsystem Wiring
//!
//! Builds the concrete service graph (`chain-storage` → `chain-consensus`
//! → `chain-sync`, fronted by `chain-peers` and `chain-bus`) from a
//! resolved [`crate::container::NodeConfig`] and a loaded
//! [`crate::genesis::GenesisLoad`].
//!
//! Subsystems never call each other directly: `chain-consensus` and
//! `chain-sync` both hold a shared handle onto the event bus and publish
//! through it; nothing here wires a direct method call between them.

use std::sync::Arc;

use thiserror::Error;

use chain_bus::{ChainEvent, EventPublisher, InMemoryEventBus};
use chain_consensus::{
    BestTipCache, BlockIngestionService, BlockValidatorService, OrphanBuffer, ReorgEngineService,
    StorageParentLookup, StubPowVerifier, SystemTimeSource as ConsensusTimeSource,
};
use chain_peers::InMemoryPeerRegistry;
use chain_storage::{BlockStore, BlockStoreService, InMemoryKVStore, StorageConfig, WriteBatch};
use chain_sync::{SyncManagerService, SyncResponderService};

use crate::genesis::GenesisLoad;

/// Concrete storage-service type when built over the RocksDB adapter.
#[cfg(feature = "rocksdb")]
pub type Store = BlockStoreService<crate::adapters::storage::RocksDbStore>;

/// Concrete storage-service type for the in-memory dev/test profile.
#[cfg(not(feature = "rocksdb"))]
pub type Store = BlockStoreService<InMemoryKVStore>;

pub type Validator = BlockValidatorService<StubPowVerifier, ConsensusTimeSource, StorageParentLookup<Store>>;
pub type Reorg = ReorgEngineService<Store, InMemoryEventBus>;
pub type Ingestion = BlockIngestionService<Store, Validator, Reorg>;
pub type Peers = InMemoryPeerRegistry;
pub type Sync = SyncManagerService<Store, Validator, Reorg, Ingestion, Peers>;
pub type Responder = SyncResponderService<Store>;

/// Errors that can occur while assembling the service graph.
#[derive(Debug, Error)]
pub enum WiringError {
    #[error("storage error during genesis seed: {0}")]
    Storage(#[from] chain_types::StorageError),

    #[error("failed to open storage backend: {0}")]
    StorageOpen(String),
}

/// Every long-lived service instance the binary needs to hold onto for
/// the process lifetime.
pub struct Node {
    pub store: Arc<Store>,
    pub events: Arc<InMemoryEventBus>,
    pub peers: Arc<Peers>,
    pub sync: Arc<Sync>,
    pub responder: Arc<Responder>,
}

#[cfg(not(feature = "rocksdb"))]
fn open_store(_data_dir: &str) -> Result<Store, WiringError> {
    Ok(BlockStoreService::new(InMemoryKVStore::new(), StorageConfig::default()))
}

#[cfg(feature = "rocksdb")]
fn open_store(data_dir: &str) -> Result<Store, WiringError> {
    use crate::adapters::storage::{RocksDbConfig, RocksDbStore};
    let config = RocksDbConfig { path: format!("{data_dir}/rocksdb"), ..RocksDbConfig::default() };
    let kv = RocksDbStore::open(config).map_err(|e| WiringError::StorageOpen(e.to_string()))?;
    Ok(BlockStoreService::new(kv, StorageConfig::default()))
}

/// Build the full service graph. Seeds the genesis block into storage if
/// the store is empty, then publishes `BlockConnected` for height 0
/// through the normal event path.
pub async fn build_node(data_dir: &str, genesis: GenesisLoad) -> Result<Node, WiringError> {
    let store = Arc::new(open_store(data_dir)?);
    let events: Arc<InMemoryEventBus> = Arc::new(InMemoryEventBus::new());

    seed_genesis_if_absent(&store, &events, &genesis).await?;

    let tip_cache = Arc::new(BestTipCache::new());
    let orphans = Arc::new(OrphanBuffer::new());

    let validator = Arc::new(BlockValidatorService::new(
        genesis.network_params.clone(),
        StubPowVerifier,
        ConsensusTimeSource,
        StorageParentLookup(Arc::clone(&store)),
    ));
    let reorg = Arc::new(ReorgEngineService::new(Arc::clone(&store), Arc::clone(&events), Arc::clone(&tip_cache)));
    let ingestion = Arc::new(BlockIngestionService::new(
        Arc::clone(&store),
        Arc::clone(&validator),
        Arc::clone(&reorg),
        orphans,
    ));

    let peers = Arc::new(InMemoryPeerRegistry::default());

    let sync = Arc::new(SyncManagerService::new(
        Arc::clone(&store),
        validator,
        reorg,
        ingestion,
        Arc::clone(&peers),
        genesis.network_params,
    ));

    let responder = Arc::new(SyncResponderService::new(Arc::clone(&store)));

    Ok(Node { store, events, peers, sync, responder })
}

async fn seed_genesis_if_absent(
    store: &Arc<Store>,
    events: &Arc<InMemoryEventBus>,
    genesis: &GenesisLoad,
) -> Result<(), WiringError> {
    let genesis_hash = genesis.stored_block.block.hash();
    if store.exists(&genesis_hash)? {
        return Ok(());
    }

    store.write_batch(|batch| {
        batch.save_block(&genesis.stored_block)?;
        batch.connect_tip(0, &genesis_hash)
    })?;

    events
        .publish(ChainEvent::BlockConnected {
            block: genesis.stored_block.block.clone(),
            cumulative_difficulty: genesis.stored_block.cumulative_difficulty,
            total_fees: 0,
            block_reward: genesis.config.block_reward,
            events: Vec::new(),
        })
        .await;

    Ok(())
}
