//! `SyncManager` (C7) and `SyncResponder` (C8): the two halves of the
//! wire-level header/body exchange, one driving it against a chosen
//! peer, the other answering it on behalf of one.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, warn};

use chain_consensus::{BlockIngestion, BlockValidator, NetworkParams, ReorgEngine, ValidationContext};
use chain_peers::{BanReason, Peer, PeerError, PeerId, PeerRegistry};
use chain_storage::{BlockStore, ChainQuery};
use chain_telemetry::{SYNC_BLOCKS_DOWNLOADED, SYNC_STATUS};
use chain_types::{
    Block, BlockHeader, ChainError, ConnectedSource, CumulativeDifficulty, Hash, Height,
    StoredBlock, StoredBlockBuilder, SyncError, Tx, ValidationError,
};

use crate::algorithms::validate_header_batch;
use crate::domain::{
    body_batch_size, pipeline_depth, ChainTip, SyncManagerError, SyncResult, PERSIST_BATCH_SIZE,
    REQUEST_TIMEOUT, SYNC_HEADERS_PER_BATCH,
};
use crate::ports::{SyncManager, SyncResponder};

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn peer_error_to_sync(e: PeerError) -> SyncError {
    match e {
        PeerError::Timeout => SyncError::Timeout(REQUEST_TIMEOUT),
        PeerError::Disconnected | PeerError::ProtocolViolation(_) => SyncError::ProtocolMismatch,
    }
}

fn spawn_body_request(
    peer: Arc<dyn Peer>,
    hashes: Vec<Hash>,
) -> tokio::task::JoinHandle<Result<Vec<Vec<Tx>>, PeerError>> {
    tokio::spawn(async move { peer.send_get_block_bodies(hashes).await })
}

/// Drives header/body download against whichever peer the registry
/// offers up as the best sync candidate, and persists the result through
/// `chain-consensus`'s [`ReorgEngine`].
pub struct SyncManagerService<S, V, R, I, P> {
    store: Arc<S>,
    validator: Arc<V>,
    reorg: Arc<R>,
    ingestion: Arc<I>,
    peers: Arc<P>,
    params: NetworkParams,
    synced: AtomicBool,
    pending_broadcasts: RwLock<HashSet<Hash>>,
    running: AtomicBool,
    loop_handle: std::sync::Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl<S, V, R, I, P> SyncManagerService<S, V, R, I, P>
where
    S: BlockStore + ChainQuery,
    V: BlockValidator,
    R: ReorgEngine,
    I: BlockIngestion,
    P: PeerRegistry,
{
    pub fn new(store: Arc<S>, validator: Arc<V>, reorg: Arc<R>, ingestion: Arc<I>, peers: Arc<P>, params: NetworkParams) -> Self {
        Self {
            store,
            validator,
            reorg,
            ingestion,
            peers,
            params,
            synced: AtomicBool::new(false),
            pending_broadcasts: RwLock::new(HashSet::new()),
            running: AtomicBool::new(false),
            loop_handle: std::sync::Mutex::new(None),
        }
    }

    fn cumulative_difficulty_at(&self, hash: &Hash) -> Result<CumulativeDifficulty, SyncManagerError> {
        Ok(self
            .store
            .get_full(hash)?
            .map(|b| b.cumulative_difficulty)
            .unwrap_or_else(CumulativeDifficulty::zero))
    }

    /// Requests successive `SYNC_HEADERS_PER_BATCH`-sized batches, reusing
    /// the previous batch's final hash as the next locator. Returns the
    /// ancestor the first batch linked to, plus the full header run.
    async fn download_headers(&self, peer: &dyn Peer, local_height: Height) -> Result<(Hash, Vec<BlockHeader>), SyncManagerError> {
        let mut all: Vec<BlockHeader> = Vec::new();
        let mut locators = self.store.locator_hashes()?;
        let mut ancestor = self.store.latest_stored()?.unwrap_or([0u8; 32]);
        let mut first_batch = true;

        loop {
            let response = tokio::time::timeout(
                REQUEST_TIMEOUT,
                peer.send_get_headers(locators.clone(), None, SYNC_HEADERS_PER_BATCH),
            )
            .await
            .map_err(|_| SyncManagerError::from(SyncError::Timeout(REQUEST_TIMEOUT)))?
            .map_err(peer_error_to_sync)?;

            if response.is_empty() {
                if peer.advertised_height() > local_height + all.len() as Height {
                    warn!(peer = ?peer.id(), "peer claims a higher tip but returned no headers");
                    self.peers.ban(peer.id(), BanReason::IncompatibleChain, None);
                    return Err(ChainError::IncompatibleChain.into());
                }
                break;
            }

            validate_header_batch(&response)?;

            if first_batch {
                let first = &response[0];
                if first.height > 0 {
                    match self.store.get_header(&first.previous_hash)? {
                        Some(_) => ancestor = first.previous_hash,
                        None if self.store.latest_stored()?.is_some() => {
                            warn!(peer = ?peer.id(), "peer's first header batch does not chain to our genesis");
                            self.peers.ban(peer.id(), BanReason::IncompatibleChain, None);
                            return Err(ChainError::IncompatibleChain.into());
                        }
                        None => return Err(ValidationError::InvalidLinkage.into()),
                    }
                }
                first_batch = false;
            }

            let mut context = ValidationContext::new();
            for h in &response {
                context.record(h.height, h.hash());
            }
            for h in &response {
                self.validator.validate_header(h, &context)?;
            }

            let got = response.len();
            locators = vec![response[got - 1].hash()];
            all.extend(response);

            if got < SYNC_HEADERS_PER_BATCH as usize {
                break;
            }
        }

        Ok((ancestor, all))
    }

    /// Downloads bodies for `headers` through a FIFO pipeline of up to
    /// `pipeline_depth` in-flight `GetBlockBodies` requests, verifying
    /// and persisting them `PERSIST_BATCH_SIZE` blocks at a time.
    async fn download_and_persist_bodies(
        &self,
        peer: &Arc<dyn Peer>,
        mut ancestor: Hash,
        headers: Vec<BlockHeader>,
    ) -> Result<u64, SyncManagerError> {
        if headers.is_empty() {
            return Ok(0);
        }

        let batch_size = body_batch_size(self.params.max_block_size_at(headers[0].height));
        let pipe = pipeline_depth(batch_size);

        let header_chunks: Vec<&[BlockHeader]> = headers.chunks(batch_size).collect();
        let hash_chunks: Vec<Vec<Hash>> = header_chunks
            .iter()
            .map(|chunk| chunk.iter().map(BlockHeader::hash).collect())
            .collect();

        let mut queue: VecDeque<tokio::task::JoinHandle<Result<Vec<Vec<Tx>>, PeerError>>> = VecDeque::new();
        let mut next = 0usize;
        while queue.len() < pipe && next < hash_chunks.len() {
            queue.push_back(spawn_body_request(peer.clone(), hash_chunks[next].clone()));
            next += 1;
        }

        let mut persisted = 0u64;
        let mut pending_batch: Vec<StoredBlock> = Vec::with_capacity(PERSIST_BATCH_SIZE);
        let mut cumulative = self.cumulative_difficulty_at(&ancestor)?;

        for header_chunk in header_chunks {
            let handle = queue.pop_front().expect("pipeline depth tracked by queue length");
            let bodies = tokio::time::timeout(REQUEST_TIMEOUT, handle)
                .await
                .map_err(|_| SyncManagerError::from(SyncError::Timeout(REQUEST_TIMEOUT)))?
                .map_err(|_join_err| SyncManagerError::from(SyncError::ProtocolMismatch))?
                .map_err(peer_error_to_sync)?;

            if bodies.len() != header_chunk.len() {
                return Err(SyncError::ProtocolMismatch.into());
            }

            if next < hash_chunks.len() {
                queue.push_back(spawn_body_request(peer.clone(), hash_chunks[next].clone()));
                next += 1;
            }

            for (header, txs) in header_chunk.iter().zip(bodies.into_iter()) {
                let computed_root = chain_types::merkle_root(txs.iter().map(Tx::hash));
                if computed_root != header.tx_root_hash {
                    return Err(ValidationError::InvalidMerkleRoot.into());
                }
                self.validator.validate_body(header, &txs)?;

                cumulative += header.difficulty;
                let stored = StoredBlockBuilder::new(Block::new(header.clone(), txs), ConnectedSource::Reorg)
                    .cumulative_difficulty(cumulative)
                    .received_at(now_ms())
                    .received_from(peer.id())
                    .build();
                pending_batch.push(stored);

                if pending_batch.len() >= PERSIST_BATCH_SIZE {
                    let batch = std::mem::replace(&mut pending_batch, Vec::with_capacity(PERSIST_BATCH_SIZE));
                    let n = batch.len() as u64;
                    ancestor = self.persist_batch(ancestor, batch).await?;
                    persisted += n;
                    SYNC_BLOCKS_DOWNLOADED.inc_by(n as f64);
                }
            }
        }

        if !pending_batch.is_empty() {
            let n = pending_batch.len() as u64;
            ancestor = self.persist_batch(ancestor, pending_batch).await?;
            persisted += n;
            SYNC_BLOCKS_DOWNLOADED.inc_by(n as f64);
        }

        Ok(persisted)
    }

    /// Extends the tip directly when `ancestor` already is the current
    /// tip, reorgs onto the new branch otherwise. Returns the new tip
    /// hash, which becomes `ancestor` for the next call.
    async fn persist_batch(&self, ancestor: Hash, batch: Vec<StoredBlock>) -> Result<Hash, SyncManagerError> {
        let next_ancestor = batch.last().map(StoredBlock::hash).unwrap_or(ancestor);
        let extends_tip = self.store.latest_stored()?.map(|tip| tip == ancestor).unwrap_or(true);
        if extends_tip {
            self.reorg.fast_forward(batch).await?;
        } else {
            self.reorg.reorg(ancestor, batch).await?;
        }
        Ok(next_ancestor)
    }

    /// Penalizes and disconnects the peer a failed sync round was driven
    /// against. `IncompatibleChain` already bans and disconnects inside
    /// `download_headers`, so this only covers the remaining failure modes
    /// (timeouts, protocol mismatches, validation failures, storage errors).
    fn fail_peer(&self, peer: &dyn Peer, error: &SyncManagerError) {
        if matches!(error, SyncManagerError::Chain(ChainError::IncompatibleChain)) {
            return;
        }
        warn!(peer = ?peer.id(), error = %error, "sync failed, disconnecting peer");
        peer.disconnect(&format!("sync failed: {error}"));
        self.peers.record_failure(peer.id());
    }

    async fn handle_broadcast_header_inner(&self, from: PeerId, header: BlockHeader) -> Result<(), SyncManagerError> {
        let local_height = self.store.latest_height()?.unwrap_or(0);
        if header.height <= local_height {
            debug!(height = header.height, local_height, "ignoring stale broadcast header");
            return Ok(());
        }
        if header.height > local_height + 1 {
            debug!(height = header.height, local_height, "broadcast header is ahead of a missing parent, deferring to active sync");
            return Ok(());
        }

        let peer = self.peers.peer(&from).ok_or(SyncManagerError::NoPeerAvailable)?;
        let hash = header.hash();
        let bodies = tokio::time::timeout(REQUEST_TIMEOUT, peer.send_get_block_bodies(vec![hash]))
            .await
            .map_err(|_| SyncManagerError::from(SyncError::Timeout(REQUEST_TIMEOUT)))?
            .map_err(peer_error_to_sync)?;
        let txs = bodies.into_iter().next().ok_or(SyncError::EmptyResponse)?;

        let computed_root = chain_types::merkle_root(txs.iter().map(Tx::hash));
        if computed_root != header.tx_root_hash {
            return Err(ValidationError::InvalidMerkleRoot.into());
        }

        self.validator.validate_header(&header, &ValidationContext::new())?;
        self.validator.validate_body(&header, &txs)?;

        let received_at = now_ms();
        let block = Block::new(header, txs);
        let outcome = self
            .ingestion
            .process_block(block, ConnectedSource::Broadcast, from, received_at, true)
            .await;
        debug!(?outcome, peer = ?from, "broadcast block processed");
        Ok(())
    }
}

impl<S, V, R, I, P> SyncManagerService<S, V, R, I, P>
where
    S: BlockStore + ChainQuery + 'static,
    V: BlockValidator + 'static,
    R: ReorgEngine + 'static,
    I: BlockIngestion + 'static,
    P: PeerRegistry + 'static,
{
    /// Spawns the background poll loop: `perform_sync` every
    /// `active_poll_interval_ms` while behind, backing off to
    /// `idle_poll_interval_ms` once caught up. A second `start` call
    /// while already running is a no-op.
    pub fn start(self: &Arc<Self>, config: crate::config::SyncConfig) {
        if self.running.swap(true, Ordering::AcqRel) {
            return;
        }
        let service = Arc::clone(self);
        let handle = tokio::spawn(async move {
            while service.running.load(Ordering::Acquire) {
                if let Err(e) = service.perform_sync().await {
                    warn!(error = %e, "sync round failed");
                }
                let delay = if service.is_synced() {
                    config.idle_poll_interval_ms
                } else {
                    config.active_poll_interval_ms
                };
                tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
            }
        });
        *self.loop_handle.lock().expect("loop handle mutex poisoned") = Some(handle);
    }

    /// Signals the poll loop to stop after its current round and waits
    /// for it to exit.
    pub async fn stop(&self) {
        self.running.store(false, Ordering::Release);
        let handle = self.loop_handle.lock().expect("loop handle mutex poisoned").take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}

#[async_trait]
impl<S, V, R, I, P> SyncManager for SyncManagerService<S, V, R, I, P>
where
    S: BlockStore + ChainQuery,
    V: BlockValidator,
    R: ReorgEngine,
    I: BlockIngestion,
    P: PeerRegistry,
{
    async fn perform_sync(&self) -> Result<SyncResult, SyncManagerError> {
        let start = std::time::Instant::now();
        let local_height = self.store.latest_height()?.unwrap_or(0);
        let local_hash = self.store.latest_stored()?.unwrap_or([0u8; 32]);

        let peer = match self.peers.best_sync_candidate(local_height) {
            Some(p) => p,
            None => {
                self.synced.store(true, Ordering::Release);
                SYNC_STATUS.set(0.0);
                return Ok(SyncResult::already_synced(ChainTip::new(local_hash, local_height)));
            }
        };
        self.synced.store(false, Ordering::Release);
        SYNC_STATUS.set(1.0);

        let target_height = peer.advertised_height();

        let (ancestor, headers) = match self.download_headers(&*peer, local_height).await {
            Ok(result) => result,
            Err(e) => {
                SYNC_STATUS.set(0.0);
                self.fail_peer(&*peer, &e);
                return Err(e);
            }
        };
        let headers_synced = headers.len() as u64;

        let blocks_persisted = match self.download_and_persist_bodies(&peer, ancestor, headers).await {
            Ok(n) => n,
            Err(e) => {
                SYNC_STATUS.set(0.0);
                self.fail_peer(&*peer, &e);
                return Err(e);
            }
        };

        let tip_height = self.store.latest_height()?.unwrap_or(local_height);
        let tip_hash = self.store.latest_stored()?.unwrap_or(local_hash);
        let caught_up = tip_height >= target_height;
        self.synced.store(caught_up, Ordering::Release);
        SYNC_STATUS.set(if caught_up { 0.0 } else { 1.0 });
        self.peers.record_success(peer.id());

        Ok(SyncResult::success(
            headers_synced,
            blocks_persisted,
            ChainTip::new(tip_hash, tip_height),
            start.elapsed().as_millis() as u64,
        ))
    }

    async fn handle_broadcast_header(&self, from: PeerId, header: BlockHeader) -> Result<(), SyncManagerError> {
        let hash = header.hash();
        if self.store.exists(&hash)? {
            return Ok(());
        }
        {
            let mut pending = self.pending_broadcasts.write();
            if !pending.insert(hash) {
                return Ok(());
            }
        }
        let result = self.handle_broadcast_header_inner(from, header).await;
        self.pending_broadcasts.write().remove(&hash);
        result
    }

    fn is_synced(&self) -> bool {
        self.synced.load(Ordering::Acquire)
    }

    fn local_tip(&self) -> ChainTip {
        let height = self.store.latest_height().ok().flatten().unwrap_or(0);
        let hash = self.store.latest_stored().ok().flatten().unwrap_or([0u8; 32]);
        ChainTip::new(hash, height)
    }
}

/// Answers `GetHeaders`/`GetBlockBodies` for peers syncing from us.
pub struct SyncResponderService<S> {
    store: Arc<S>,
}

impl<S: BlockStore + ChainQuery> SyncResponderService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

impl<S: BlockStore + ChainQuery> SyncResponder for SyncResponderService<S> {
    fn get_headers(&self, locators: Vec<Hash>, stop: Option<Hash>, limit: u32) -> Result<Vec<BlockHeader>, SyncManagerError> {
        let Some(ancestor_hash) = self.store.find_common_ancestor(&locators)? else {
            return Ok(Vec::new());
        };
        let Some(ancestor_header) = self.store.get_header(&ancestor_hash)? else {
            return Ok(Vec::new());
        };

        let start = ancestor_header.height + 1;
        let mut end = start + limit.min(2000) as u64;
        if let Some(stop_hash) = stop {
            if let Some(stop_header) = self.store.get_header(&stop_hash)? {
                end = end.min(stop_header.height);
            }
        }
        let tip_height = self.store.latest_height()?.unwrap_or(0);
        end = end.min(tip_height);

        if end < start {
            return Ok(Vec::new());
        }
        Ok(self.store.header_range(start, end)?)
    }

    fn get_block_bodies(&self, hashes: Vec<Hash>) -> Result<Vec<Vec<Tx>>, SyncManagerError> {
        let blocks = self.store.multi_get_full(&hashes)?;
        Ok(blocks.into_iter().map(|b| b.map(|sb| sb.block.txs).unwrap_or_default()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chain_consensus::ReorgError;
    use chain_peers::InMemoryPeerRegistry;
    use chain_storage::{BlockStoreService, InMemoryKVStore, StorageConfig};
    use chain_types::IngestionOutcome;

    fn header(height: Height, previous_hash: Hash, timestamp: u64) -> BlockHeader {
        BlockHeader::new(1, height, previous_hash, [0u8; 32], [0u8; 32], timestamp, CumulativeDifficulty::from(1u64), [0u8; 20], height, None)
    }

    fn stored(height: Height, previous_hash: Hash, timestamp: u64, cumulative: u64) -> StoredBlock {
        let block = Block::new(header(height, previous_hash, timestamp), Vec::new());
        StoredBlockBuilder::new(block, ConnectedSource::Genesis)
            .cumulative_difficulty(CumulativeDifficulty::from(cumulative))
            .received_at(timestamp)
            .build()
    }

    struct PassValidator;
    impl BlockValidator for PassValidator {
        fn validate_header(&self, _header: &BlockHeader, _context: &ValidationContext) -> Result<(), ValidationError> {
            Ok(())
        }
        fn validate_body(&self, _header: &BlockHeader, _txs: &[Tx]) -> Result<(), ValidationError> {
            Ok(())
        }
    }

    struct NoopReorg;
    #[async_trait]
    impl ReorgEngine for NoopReorg {
        async fn fast_forward(&self, _new_branch: Vec<StoredBlock>) -> Result<(), ReorgError> {
            Ok(())
        }
        async fn reorg(&self, _common_ancestor: Hash, _new_branch: Vec<StoredBlock>) -> Result<(), ReorgError> {
            Ok(())
        }
    }

    struct NoopIngestion;
    #[async_trait]
    impl BlockIngestion for NoopIngestion {
        async fn process_block(
            &self,
            _block: Block,
            _source: ConnectedSource,
            _received_from: chain_types::Address,
            _received_at: chain_types::TimestampMs,
            _pre_validated: bool,
        ) -> IngestionOutcome {
            IngestionOutcome::Connected
        }
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

    type Harness = SyncManagerService<BlockStoreService<InMemoryKVStore>, PassValidator, NoopReorg, NoopIngestion, InMemoryPeerRegistry>;

    fn harness() -> Harness {
        let store = Arc::new(BlockStoreService::new(InMemoryKVStore::new(), StorageConfig::default()));
        SyncManagerService::new(
            store,
            Arc::new(PassValidator),
            Arc::new(NoopReorg),
            Arc::new(NoopIngestion),
            Arc::new(InMemoryPeerRegistry::default()),
            params(),
        )
    }

    #[tokio::test]
    async fn perform_sync_reports_already_synced_with_no_peers() {
        let svc = harness();
        let result = svc.perform_sync().await.unwrap();
        assert!(result.success);
        assert_eq!(result.headers_synced, 0);
        assert!(svc.is_synced());
    }

    #[tokio::test]
    async fn local_tip_reflects_the_store() {
        let svc = harness();
        let genesis = stored(0, [0u8; 32], 1_700_000_000_000, 1);
        let genesis_hash = genesis.hash();
        svc.store
            .write_batch(|b| {
                b.save_block(&genesis)?;
                b.connect_tip(0, &genesis_hash)
            })
            .unwrap();

        let tip = svc.local_tip();
        assert_eq!(tip.height, 0);
        assert_eq!(tip.hash, genesis_hash);
    }

    #[tokio::test]
    async fn handle_broadcast_header_ignores_stale_height() {
        let svc = harness();
        let genesis = stored(0, [0u8; 32], 1_700_000_000_000, 1);
        let genesis_hash = genesis.hash();
        svc.store
            .write_batch(|b| {
                b.save_block(&genesis)?;
                b.connect_tip(0, &genesis_hash)
            })
            .unwrap();

        let stale = header(0, [0u8; 32], 1_700_000_000_000);
        svc.handle_broadcast_header([9u8; 20], stale).await.unwrap();
    }

    #[tokio::test]
    async fn handle_broadcast_header_ignores_height_gap() {
        let svc = harness();
        let genesis = stored(0, [0u8; 32], 1_700_000_000_000, 1);
        let genesis_hash = genesis.hash();
        svc.store
            .write_batch(|b| {
                b.save_block(&genesis)?;
                b.connect_tip(0, &genesis_hash)
            })
            .unwrap();

        let far_ahead = header(5, [7u8; 32], 1_700_000_005_000);
        svc.handle_broadcast_header([9u8; 20], far_ahead).await.unwrap();
    }

    type ResponderHarness = SyncResponderService<BlockStoreService<InMemoryKVStore>>;

    fn responder_harness() -> (ResponderHarness, Arc<BlockStoreService<InMemoryKVStore>>) {
        let store = Arc::new(BlockStoreService::new(InMemoryKVStore::new(), StorageConfig::default()));
        (SyncResponderService::new(store.clone()), store)
    }

    #[test]
    fn get_headers_returns_range_following_common_ancestor() {
        let (responder, store) = responder_harness();
        let genesis = stored(0, [0u8; 32], 1_700_000_000_000, 1);
        let genesis_hash = genesis.hash();
        let child = stored(1, genesis_hash, 1_700_000_001_000, 2);
        let child_hash = child.hash();
        store
            .write_batch(|b| {
                b.save_block(&genesis)?;
                b.connect_tip(0, &genesis_hash)?;
                b.save_block(&child)?;
                b.connect_tip(1, &child_hash)
            })
            .unwrap();

        let headers = responder.get_headers(vec![genesis_hash], None, 10).unwrap();
        assert_eq!(headers.len(), 1);
        assert_eq!(headers[0].height, 1);
    }

    #[test]
    fn get_headers_empty_when_locators_match_nothing() {
        let (responder, _store) = responder_harness();
        let headers = responder.get_headers(vec![[0xFFu8; 32]], None, 10).unwrap();
        assert!(headers.is_empty());
    }

    #[test]
    fn get_block_bodies_preserves_order_with_empty_for_miss() {
        let (responder, store) = responder_harness();
        let genesis = stored(0, [0u8; 32], 1_700_000_000_000, 1);
        let genesis_hash = genesis.hash();
        store
            .write_batch(|b| {
                b.save_block(&genesis)?;
                b.connect_tip(0, &genesis_hash)
            })
            .unwrap();

        let missing = [1u8; 32];
        let bodies = responder.get_block_bodies(vec![genesis_hash, missing]).unwrap();
        assert_eq!(bodies.len(), 2);
        assert!(bodies[0].is_empty());
        assert!(bodies[1].is_empty());
    }
}
