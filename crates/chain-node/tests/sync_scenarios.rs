//! End-to-end coverage for the three `SyncManager` scenarios that need a
//! simulated peer: an incompatible-chain rejection, a linkage failure
//! mid-batch, and a pipeline timeout. Fast-forward/reorg/orphan
//! promotion live in `ingestion_scenarios.rs`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chain_consensus::{BlockValidator, NetworkParams, ValidationContext};
use chain_peers::{InMemoryPeerRegistry, Peer, PeerError, PeerId, PeerRegistry};
use chain_storage::{BlockStore, BlockStoreService, ChainQuery, InMemoryKVStore, StorageConfig, WriteBatch};
use chain_sync::{SyncManager, SyncManagerService, SyncManagerError};
use chain_types::{
    Block, BlockHeader, ConnectedSource, CumulativeDifficulty, Difficulty, Hash, Height,
    StoredBlockBuilder, Tx, ValidationError,
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

struct NoopReorg;

#[async_trait]
impl chain_consensus::ReorgEngine for NoopReorg {
    async fn fast_forward(&self, _new_branch: Vec<chain_types::StoredBlock>) -> Result<(), chain_consensus::ReorgError> {
        Ok(())
    }
    async fn reorg(&self, _common_ancestor: Hash, _new_branch: Vec<chain_types::StoredBlock>) -> Result<(), chain_consensus::ReorgError> {
        Ok(())
    }
}

struct NoopIngestion;

#[async_trait]
impl chain_consensus::BlockIngestion for NoopIngestion {
    async fn process_block(
        &self,
        _block: Block,
        _source: ConnectedSource,
        _received_from: chain_types::Address,
        _received_at: chain_types::TimestampMs,
        _pre_validated: bool,
    ) -> chain_types::IngestionOutcome {
        chain_types::IngestionOutcome::Connected
    }
}

fn header(height: Height, previous_hash: Hash, timestamp: u64, difficulty: u64) -> BlockHeader {
    BlockHeader::new(1, height, previous_hash, [0u8; 32], [0u8; 32], timestamp, Difficulty::from(difficulty), [0u8; 20], height, None)
}

fn params() -> NetworkParams {
    NetworkParams {
        max_header_size: 1024,
        max_tx_count: 10_000,
        max_block_size: 1_000_000,
        max_tx_size: 64_000,
        clock_skew: 2 * 60 * 60 * 1000,
        difficulty: chain_consensus::DifficultyParams::new(600, 3600, chain_types::Difficulty::from(1u64)),
    }
}

type Store = BlockStoreService<InMemoryKVStore>;
type Harness = SyncManagerService<Store, AcceptAll, NoopReorg, NoopIngestion, InMemoryPeerRegistry>;

fn seed_genesis(store: &Store) -> Hash {
    let block = Block::new(header(0, [0u8; 32], 1_700_000_000_000, 1), Vec::new());
    let hash = block.hash();
    let stored = StoredBlockBuilder::new(block, ConnectedSource::Genesis)
        .cumulative_difficulty(CumulativeDifficulty::from(1u64))
        .received_at(1_700_000_000_000)
        .build();
    store
        .write_batch(|batch| {
            batch.save_block(&stored)?;
            batch.connect_tip(0, &hash)
        })
        .unwrap();
    hash
}

/// Behavior under test. `Headers(_)` answers every `GetHeaders` call with
/// the same canned batch once, then empty; `Hang` never resolves a
/// `GetBlockBodies` call, to drive the request-timeout path.
enum PeerBehavior {
    EmptyButClaimsAhead,
    Headers(Vec<BlockHeader>),
    Hang { headers: Vec<BlockHeader> },
}

struct FakePeer {
    id: PeerId,
    height: Height,
    behavior: PeerBehavior,
    headers_served: AtomicU64,
    next_request_id: AtomicU64,
}

#[async_trait]
impl Peer for FakePeer {
    fn id(&self) -> PeerId {
        self.id
    }
    fn advertised_height(&self) -> Height {
        self.height
    }
    fn reserve_request_id(&self) -> u64 {
        self.next_request_id.fetch_add(1, Ordering::Relaxed)
    }
    async fn send_get_headers(&self, _locators: Vec<Hash>, _stop: Option<Hash>, _limit: u32) -> Result<Vec<BlockHeader>, PeerError> {
        if self.headers_served.fetch_add(1, Ordering::Relaxed) > 0 {
            return Ok(Vec::new());
        }
        match &self.behavior {
            PeerBehavior::EmptyButClaimsAhead => Ok(Vec::new()),
            PeerBehavior::Headers(h) => Ok(h.clone()),
            PeerBehavior::Hang { headers } => Ok(headers.clone()),
        }
    }
    async fn send_get_block_bodies(&self, hashes: Vec<Hash>) -> Result<Vec<Vec<Tx>>, PeerError> {
        match &self.behavior {
            PeerBehavior::Hang { .. } => std::future::pending().await,
            _ => Ok(hashes.iter().map(|_| Vec::new()).collect()),
        }
    }
    fn disconnect(&self, _reason: &str) {}
}

fn harness(store: Arc<Store>, peers: Arc<InMemoryPeerRegistry>) -> Harness {
    SyncManagerService::new(store, Arc::new(AcceptAll), Arc::new(NoopReorg), Arc::new(NoopIngestion), peers, params())
}

#[tokio::test]
async fn incompatible_chain_bans_the_peer_and_leaves_it_unreachable_as_a_candidate() {
    let store = Arc::new(BlockStoreService::new(InMemoryKVStore::new(), StorageConfig::default()));
    seed_genesis(&store);

    let peers = Arc::new(InMemoryPeerRegistry::default());
    peers.register(Arc::new(FakePeer {
        id: [9u8; 20],
        height: 5,
        behavior: PeerBehavior::EmptyButClaimsAhead,
        headers_served: AtomicU64::new(0),
        next_request_id: AtomicU64::new(0),
    }));

    let svc = harness(store.clone(), peers.clone());
    let err = svc.perform_sync().await.expect_err("peer claiming a higher tip with no headers must fail sync");
    assert!(matches!(err, SyncManagerError::Chain(chain_types::ChainError::IncompatibleChain)));

    assert!(peers.is_banned(&[9u8; 20]));
    assert!(peers.best_sync_candidate(0).is_none());
    assert_eq!(store.latest_height().unwrap(), Some(0));
}

#[tokio::test]
async fn foreign_genesis_first_batch_bans_the_peer_as_incompatible() {
    let store = Arc::new(BlockStoreService::new(InMemoryKVStore::new(), StorageConfig::default()));
    seed_genesis(&store);

    // h1's previous_hash chains to a genesis we never stored, not to ours.
    let h1 = header(1, [0xFFu8; 32], 1_700_000_001_000, 1);

    let peers = Arc::new(InMemoryPeerRegistry::default());
    peers.register(Arc::new(FakePeer {
        id: [5u8; 20],
        height: 1,
        behavior: PeerBehavior::Headers(vec![h1]),
        headers_served: AtomicU64::new(0),
        next_request_id: AtomicU64::new(0),
    }));

    let svc = harness(store.clone(), peers.clone());
    let err = svc.perform_sync().await.expect_err("a foreign first batch must fail sync while we have a genesis");
    assert!(matches!(err, SyncManagerError::Chain(chain_types::ChainError::IncompatibleChain)));

    assert!(peers.is_banned(&[5u8; 20]));
    assert_eq!(store.latest_height().unwrap(), Some(0));
}

#[tokio::test]
async fn header_linkage_failure_aborts_the_whole_batch_and_leaves_the_store_untouched() {
    let store = Arc::new(BlockStoreService::new(InMemoryKVStore::new(), StorageConfig::default()));
    let genesis_hash = seed_genesis(&store);

    let h1 = header(1, genesis_hash, 1_700_000_001_000, 1);
    let h1_hash = h1.hash();
    let h2 = header(2, h1_hash, 1_700_000_002_000, 1);
    // h3's previous_hash does not match h2's hash: a linkage break
    // partway through the batch, not at its start.
    let h3 = header(3, [0xAAu8; 32], 1_700_000_003_000, 1);
    let h4 = header(4, h3.hash(), 1_700_000_004_000, 1);

    let peers = Arc::new(InMemoryPeerRegistry::default());
    peers.register(Arc::new(FakePeer {
        id: [7u8; 20],
        height: 4,
        behavior: PeerBehavior::Headers(vec![h1, h2, h3, h4]),
        headers_served: AtomicU64::new(0),
        next_request_id: AtomicU64::new(0),
    }));

    let svc = harness(store.clone(), peers.clone());
    let err = svc.perform_sync().await.expect_err("a broken linkage mid-batch must fail sync");
    assert!(matches!(err, SyncManagerError::Validation(ValidationError::InvalidLinkage)));

    assert_eq!(store.latest_height().unwrap(), Some(0));
    assert_eq!(store.latest_stored().unwrap(), Some(genesis_hash));
}

#[tokio::test(start_paused = true)]
async fn a_peer_that_stops_responding_to_body_requests_times_out_with_no_partial_persistence() {
    let store = Arc::new(BlockStoreService::new(InMemoryKVStore::new(), StorageConfig::default()));
    let genesis_hash = seed_genesis(&store);

    let h1 = header(1, genesis_hash, 1_700_000_001_000, 1);
    let h2 = header(2, h1.hash(), 1_700_000_002_000, 1);

    let peers = Arc::new(InMemoryPeerRegistry::default());
    peers.register(Arc::new(FakePeer {
        id: [3u8; 20],
        height: 2,
        behavior: PeerBehavior::Hang { headers: vec![h1, h2] },
        headers_served: AtomicU64::new(0),
        next_request_id: AtomicU64::new(0),
    }));

    let svc = harness(store.clone(), peers.clone());
    let err = svc.perform_sync().await.expect_err("a body request that never resolves must time out");
    assert!(matches!(err, SyncManagerError::Peer(chain_types::SyncError::Timeout(_))));

    assert_eq!(store.latest_height().unwrap(), Some(0));
    assert_eq!(store.latest_stored().unwrap(), Some(genesis_hash));
}
