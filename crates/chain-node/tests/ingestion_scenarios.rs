//! End-to-end coverage for the three ingestion scenarios that exercise
//! `BlockIngestion` (C6) and `ReorgEngine` (C5) together against real
//! storage and a real event bus: fast-forward, orphan-then-parent, and
//! a depth-2 reorg. Incompatible-chain / linkage-failure / pipeline
//! timeout live in `sync_scenarios.rs` since those are properties of
//! `SyncManager`'s peer exchange, not of ingestion itself.

use std::sync::Arc;

use chain_bus::{ChainEvent, EventFilter, InMemoryEventBus};
use chain_consensus::{
    BestTipCache, BlockIngestion, BlockIngestionService, BlockValidator, OrphanBuffer, ReorgEngine,
    ReorgEngineService, ValidationContext,
};
use chain_storage::{BlockStore, BlockStoreService, ChainQuery, InMemoryKVStore, StorageConfig, WriteBatch};
use chain_types::{
    Block, BlockHeader, ConnectedSource, CumulativeDifficulty, Difficulty, Hash, Height,
    IngestionOutcome, StoredBlockBuilder, Tx, ValidationError,
};

struct AcceptAll;

impl BlockValidator for AcceptAll {
    fn validate_header(&self, _header: &BlockHeader, _ctx: &ValidationContext) -> Result<(), ValidationError> {
        Ok(())
    }
    fn validate_body(&self, _header: &BlockHeader, _txs: &[Tx]) -> Result<(), ValidationError> {
        Ok(())
    }
}

fn header(height: Height, previous_hash: Hash, timestamp: u64, difficulty: u64) -> BlockHeader {
    BlockHeader::new(1, height, previous_hash, [0u8; 32], [0u8; 32], timestamp, Difficulty::from(difficulty), [0u8; 20], height, None)
}

fn block(height: Height, previous_hash: Hash, timestamp: u64, difficulty: u64) -> Block {
    Block::new(header(height, previous_hash, timestamp, difficulty), Vec::new())
}

type Store = BlockStoreService<InMemoryKVStore>;
type Reorg = ReorgEngineService<Store, InMemoryEventBus>;
type Ingestion = BlockIngestionService<Store, AcceptAll, Reorg>;

struct Harness {
    ingestion: Ingestion,
    store: Arc<Store>,
    events: Arc<InMemoryEventBus>,
}

fn harness() -> Harness {
    let store = Arc::new(BlockStoreService::new(InMemoryKVStore::new(), StorageConfig::default()));
    let events = Arc::new(InMemoryEventBus::new());
    let tip_cache = Arc::new(BestTipCache::new());
    let reorg = Arc::new(ReorgEngineService::new(store.clone(), events.clone(), tip_cache));
    let orphans = Arc::new(OrphanBuffer::new());
    let ingestion = BlockIngestionService::new(store.clone(), Arc::new(AcceptAll), reorg, orphans);
    Harness { ingestion, store, events }
}

fn seed_root(store: &Store, height: Height, timestamp: u64, difficulty: u64) -> Hash {
    let b = block(height, [0u8; 32], timestamp, difficulty);
    let hash = b.hash();
    let stored = StoredBlockBuilder::new(b, ConnectedSource::Genesis)
        .cumulative_difficulty(CumulativeDifficulty::from(difficulty))
        .received_at(timestamp)
        .build();
    store
        .write_batch(|batch| {
            batch.save_block(&stored)?;
            batch.connect_tip(height, &hash)
        })
        .unwrap();
    hash
}

async fn drain(events: &Arc<InMemoryEventBus>, n: usize) -> Vec<ChainEvent> {
    let mut sub = events.subscribe(EventFilter::all());
    let mut out = Vec::with_capacity(n);
    for _ in 0..n {
        out.push(sub.recv().await.expect("event bus dropped"));
    }
    out
}

fn connected_height(event: &ChainEvent) -> Option<Height> {
    match event {
        ChainEvent::BlockConnected { block, .. } => Some(block.header.height),
        _ => None,
    }
}

fn disconnected_height(event: &ChainEvent) -> Option<Height> {
    match event {
        ChainEvent::BlockDisconnected { block } => Some(block.header.height),
        _ => None,
    }
}

#[tokio::test]
async fn fast_forward_extends_tip_in_order_with_no_disconnects() {
    let h = harness();
    let h10 = seed_root(&h.store, 10, 1_700_000_000_000, 10);

    let sub_events = h.events.clone();
    let subscriber = tokio::spawn(async move { drain(&sub_events, 3).await });
    tokio::task::yield_now().await;

    let h11 = block(11, h10, 1_700_000_010_000, 11);
    let h11_hash = h11.hash();
    let outcome = h.ingestion.process_block(h11, ConnectedSource::Broadcast, [1u8; 20], 0, false).await;
    assert!(matches!(outcome, IngestionOutcome::Connected));

    let h12 = block(12, h11_hash, 1_700_000_020_000, 12);
    let h12_hash = h12.hash();
    let outcome = h.ingestion.process_block(h12, ConnectedSource::Broadcast, [1u8; 20], 0, false).await;
    assert!(matches!(outcome, IngestionOutcome::Connected));

    let h13 = block(13, h12_hash, 1_700_000_030_000, 13);
    let outcome = h.ingestion.process_block(h13, ConnectedSource::Broadcast, [1u8; 20], 0, false).await;
    assert!(matches!(outcome, IngestionOutcome::Connected));

    let events = subscriber.await.unwrap();
    let heights: Vec<Height> = events.iter().map(|e| connected_height(e).expect("expected only Connected events")).collect();
    assert_eq!(heights, vec![11, 12, 13]);
    assert_eq!(h.store.latest_height().unwrap(), Some(13));
}

#[tokio::test]
async fn orphan_is_buffered_then_connected_once_its_parent_arrives() {
    let h = harness();
    let h10 = seed_root(&h.store, 10, 1_700_000_000_000, 10);

    let h11 = block(11, h10, 1_700_000_010_000, 11);
    let h11_hash = h11.hash();
    let h12 = block(12, h11_hash, 1_700_000_020_000, 12);

    // Height 12 is two above the local tip (10): exactly one block (H11)
    // is missing, which is still `Buffered` — `GapDetected` is reserved for
    // a gap of two or more missing blocks. Either way the block lands in
    // the orphan buffer and is promoted once its parent connects.
    let outcome = h.ingestion.process_block(h12, ConnectedSource::Broadcast, [2u8; 20], 0, false).await;
    assert!(matches!(outcome, IngestionOutcome::Buffered));
    assert_eq!(h.store.latest_height().unwrap(), Some(10));

    let sub_events = h.events.clone();
    let subscriber = tokio::spawn(async move { drain(&sub_events, 2).await });
    tokio::task::yield_now().await;

    let outcome = h.ingestion.process_block(h11, ConnectedSource::Broadcast, [1u8; 20], 0, false).await;
    assert!(matches!(outcome, IngestionOutcome::Connected));

    let events = subscriber.await.unwrap();
    let heights: Vec<Height> = events.iter().map(|e| connected_height(e).expect("expected only Connected events")).collect();
    assert_eq!(heights, vec![11, 12]);
    assert_eq!(h.store.latest_height().unwrap(), Some(12));
}

#[tokio::test]
async fn depth_two_reorg_disconnects_old_branch_then_connects_new_branch_in_order() {
    let h = harness();
    let h10 = seed_root(&h.store, 10, 1_700_000_000_000, 10);

    let h11a = block(11, h10, 1_700_000_010_000, 1);
    let h11a_hash = h11a.hash();
    let h12a = block(12, h11a_hash, 1_700_000_020_000, 1);

    let tip_cache = Arc::new(BestTipCache::new());
    let reorg: Arc<Reorg> = Arc::new(ReorgEngineService::new(h.store.clone(), h.events.clone(), tip_cache));

    let h11a_stored = StoredBlockBuilder::new(h11a, ConnectedSource::Broadcast)
        .cumulative_difficulty(CumulativeDifficulty::from(11u64))
        .received_at(1_700_000_010_000)
        .build();
    let h12a_stored = StoredBlockBuilder::new(h12a, ConnectedSource::Broadcast)
        .cumulative_difficulty(CumulativeDifficulty::from(12u64))
        .received_at(1_700_000_020_000)
        .build();
    reorg.fast_forward(vec![h11a_stored, h12a_stored]).await.unwrap();
    assert_eq!(h.store.latest_height().unwrap(), Some(12));

    let h11b = block(11, h10, 1_700_000_011_000, 20);
    let h11b_hash = h11b.hash();
    let h12b = block(12, h11b_hash, 1_700_000_021_000, 20);
    let h12b_hash = h12b.hash();
    let h13b = block(13, h12b_hash, 1_700_000_031_000, 20);

    let h11b_stored = StoredBlockBuilder::new(h11b, ConnectedSource::Broadcast)
        .cumulative_difficulty(CumulativeDifficulty::from(30u64))
        .received_at(1_700_000_011_000)
        .build();
    let h12b_stored = StoredBlockBuilder::new(h12b, ConnectedSource::Broadcast)
        .cumulative_difficulty(CumulativeDifficulty::from(50u64))
        .received_at(1_700_000_021_000)
        .build();
    let h13b_stored = StoredBlockBuilder::new(h13b, ConnectedSource::Broadcast)
        .cumulative_difficulty(CumulativeDifficulty::from(70u64))
        .received_at(1_700_000_031_000)
        .build();

    let sub_events = h.events.clone();
    let subscriber = tokio::spawn(async move { drain(&sub_events, 5).await });
    tokio::task::yield_now().await;

    reorg.reorg(h10, vec![h11b_stored, h12b_stored, h13b_stored]).await.unwrap();

    let events = subscriber.await.unwrap();
    let mut observed = Vec::new();
    for e in &events {
        if let Some(h) = disconnected_height(e) {
            observed.push(("disconnected", h));
        } else if let Some(h) = connected_height(e) {
            observed.push(("connected", h));
        }
    }
    assert_eq!(
        observed,
        vec![
            ("disconnected", 12),
            ("disconnected", 11),
            ("connected", 11),
            ("connected", 12),
            ("connected", 13),
        ]
    );

    assert_eq!(h.store.latest_height().unwrap(), Some(13));
}
