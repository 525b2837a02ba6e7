//! `BlockIngestion` (C6): single-block admission state machine.
//!
//! The orphan-promotion step after a successful connect runs iteratively
//! against an explicit work queue rather than recursively, so a long
//! chain of buffered children can't blow the stack.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use chain_storage::{BlockStore, ChainQuery};
use chain_types::{
    Address, Block, BlockHeader, ConnectedSource, CumulativeDifficulty, Hash, IngestionOutcome,
    StoredBlock, StoredBlockBuilder, TimestampMs,
};

use crate::domain::{OrphanBuffer, ValidationContext};
use crate::ports::inbound::{BlockIngestion as BlockIngestionTrait, BlockValidator, ReorgEngine};
use crate::validation::ParentLookup;

/// [`ParentLookup`] backed by `chain-storage`: finds a header by hash
/// regardless of whether it is on the canonical chain.
pub struct StorageParentLookup<S>(pub Arc<S>);

impl<S: BlockStore> ParentLookup for StorageParentLookup<S> {
    fn header_by_hash(&self, hash: &Hash) -> Option<BlockHeader> {
        self.0.get_header(hash).ok().flatten()
    }
}

pub struct BlockIngestionService<S, V, R> {
    store: Arc<S>,
    validator: Arc<V>,
    reorg: Arc<R>,
    orphans: Arc<OrphanBuffer>,
}

impl<S, V, R> BlockIngestionService<S, V, R>
where
    S: BlockStore + ChainQuery,
    V: BlockValidator,
    R: ReorgEngine,
{
    pub fn new(store: Arc<S>, validator: Arc<V>, reorg: Arc<R>, orphans: Arc<OrphanBuffer>) -> Self {
        Self { store, validator, reorg, orphans }
    }

    fn ingest_one<'a>(
        &'a self,
        block: Block,
        source: ConnectedSource,
        received_from: Address,
        received_at: TimestampMs,
        pre_validated: bool,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = IngestionOutcome> + Send + 'a>> {
        Box::pin(async move {
            let hash = block.hash();
            let height = block.header.height;

            if self.orphans.contains(&hash) {
                return IngestionOutcome::Ignored;
            }
            match self.store.exists(&hash) {
                Ok(true) => return IngestionOutcome::Ignored,
                Ok(false) => {}
                Err(e) => return IngestionOutcome::Rejected(e.to_string()),
            }

            let parent_stored = if height == 0 {
                None
            } else {
                match self.store.get_full(&block.header.previous_hash) {
                    Ok(found) => found,
                    Err(e) => return IngestionOutcome::Rejected(e.to_string()),
                }
            };

            if height > 0 && parent_stored.is_none() {
                let tip_height = match self.store.latest_height() {
                    Ok(h) => h.unwrap_or(0),
                    Err(e) => return IngestionOutcome::Rejected(e.to_string()),
                };

                let stored = StoredBlockBuilder::new(block, source)
                    .received_at(received_at)
                    .received_from(received_from)
                    .build();
                if !self.orphans.add(stored, received_from, received_at) {
                    return IngestionOutcome::Rejected("orphan buffer full or duplicate".to_string());
                }
                chain_telemetry::ORPHANS_COUNT.inc();

                // A single missing block (the orphan is the tip's immediate
                // successor, just with the wrong parent hash, or exactly one
                // block above it) is routine and resolves itself once that
                // block arrives; report it as `Buffered`. Two or more
                // missing blocks means the gap needs an explicit header
                // fetch starting at `missing_from`.
                return if height > tip_height + 2 {
                    IngestionOutcome::GapDetected { missing_from: tip_height + 1 }
                } else {
                    IngestionOutcome::Buffered
                };
            }

            if !pre_validated {
                let context = ValidationContext::new();
                if let Err(e) = self.validator.validate_header(&block.header, &context) {
                    return IngestionOutcome::Rejected(e.to_string());
                }
                if let Err(e) = self.validator.validate_body(&block.header, &block.txs) {
                    return IngestionOutcome::Rejected(e.to_string());
                }
            }

            let cumulative_difficulty = parent_stored
                .as_ref()
                .map(|p| p.cumulative_difficulty)
                .unwrap_or_else(CumulativeDifficulty::zero)
                + block.header.difficulty;

            let stored = StoredBlockBuilder::new(block, source)
                .cumulative_difficulty(cumulative_difficulty)
                .received_at(received_at)
                .received_from(received_from)
                .build();

            let outcome = self.connect_or_fork(stored).await;
            if matches!(outcome, IngestionOutcome::Connected | IngestionOutcome::StoredNoncanon) {
                self.promote_orphans(hash).await;
            }
            outcome
        })
    }

    async fn connect_or_fork(&self, stored: StoredBlock) -> IngestionOutcome {
        let current_tip_hash = match self.store.latest_stored() {
            Ok(h) => h,
            Err(e) => return IngestionOutcome::Rejected(e.to_string()),
        };

        let extends_tip = current_tip_hash.map(|tip| tip == stored.previous_hash()).unwrap_or(true);

        if extends_tip {
            return match self.reorg.fast_forward(vec![stored]).await {
                Ok(()) => IngestionOutcome::Connected,
                Err(e) => IngestionOutcome::Rejected(e.to_string()),
            };
        }

        let current_difficulty = match current_tip_hash {
            Some(tip_hash) => match self.store.get_full(&tip_hash) {
                Ok(Some(tip_block)) => tip_block.cumulative_difficulty,
                Ok(None) => CumulativeDifficulty::zero(),
                Err(e) => return IngestionOutcome::Rejected(e.to_string()),
            },
            None => CumulativeDifficulty::zero(),
        };

        if stored.cumulative_difficulty > current_difficulty {
            let parent_hash = stored.previous_hash();
            match self.reorg.reorg(parent_hash, vec![stored]).await {
                Ok(()) => IngestionOutcome::Connected,
                Err(_) => IngestionOutcome::StoredNoncanon,
            }
        } else if let Err(e) = self.store.write_batch(|batch| batch.save_block(&stored)) {
            IngestionOutcome::Rejected(e.to_string())
        } else {
            IngestionOutcome::StoredNoncanon
        }
    }

    /// Breadth-first promotion of every buffered orphan whose parent just
    /// connected, via an explicit queue rather than recursion.
    async fn promote_orphans(&self, connected_hash: Hash) {
        let mut queue: VecDeque<Hash> = VecDeque::new();
        queue.push_back(connected_hash);

        while let Some(parent_hash) = queue.pop_front() {
            for orphan in self.orphans.pop_children(&parent_hash) {
                let child_hash = orphan.block.hash();
                let outcome = self
                    .ingest_one(
                        orphan.block.block,
                        orphan.block.connected_source,
                        orphan.received_from,
                        orphan.received_at,
                        false,
                    )
                    .await;
                debug!(?outcome, "promoted orphan");
                if matches!(outcome, IngestionOutcome::Connected | IngestionOutcome::StoredNoncanon) {
                    queue.push_back(child_hash);
                } else {
                    warn!(?outcome, "orphan failed to connect after parent arrived");
                }
            }
        }
    }
}

#[async_trait]
impl<S, V, R> BlockIngestionTrait for BlockIngestionService<S, V, R>
where
    S: BlockStore + ChainQuery,
    V: BlockValidator,
    R: ReorgEngine,
{
    async fn process_block(
        &self,
        block: Block,
        source: ConnectedSource,
        received_from: Address,
        received_at: TimestampMs,
        pre_validated: bool,
    ) -> IngestionOutcome {
        self.ingest_one(block, source, received_from, received_at, pre_validated).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chain_bus::InMemoryEventBus;
    use chain_storage::{BlockStoreService, InMemoryKVStore, StorageConfig};
    use chain_types::{ValidationError, Tx};

    use crate::domain::{BestTipCache, ValidationContext as VCtx};
    use crate::service::ReorgEngineService;

    struct AcceptAllValidator;
    impl BlockValidator for AcceptAllValidator {
        fn validate_header(&self, _header: &BlockHeader, _ctx: &VCtx) -> Result<(), ValidationError> {
            Ok(())
        }
        fn validate_body(&self, _header: &BlockHeader, _txs: &[Tx]) -> Result<(), ValidationError> {
            Ok(())
        }
    }

    struct RejectValidator;
    impl BlockValidator for RejectValidator {
        fn validate_header(&self, _header: &BlockHeader, _ctx: &VCtx) -> Result<(), ValidationError> {
            Err(ValidationError::InvalidPoW)
        }
        fn validate_body(&self, _header: &BlockHeader, _txs: &[Tx]) -> Result<(), ValidationError> {
            Ok(())
        }
    }

    type Store = BlockStoreService<InMemoryKVStore>;
    type Reorg = ReorgEngineService<Store, InMemoryEventBus>;

    fn header(height: u64, previous_hash: Hash, timestamp: u64, nonce: u64) -> BlockHeader {
        BlockHeader::new(
            1,
            height,
            previous_hash,
            [0u8; 32],
            [0u8; 32],
            timestamp,
            CumulativeDifficulty::from(1u64),
            [0u8; 20],
            nonce,
            None,
        )
    }

    fn block(height: u64, previous_hash: Hash, timestamp: u64, nonce: u64) -> Block {
        Block::new(header(height, previous_hash, timestamp, nonce), Vec::new())
    }

    fn harness<V>(validator: V) -> BlockIngestionService<Store, V, Reorg>
    where
        V: BlockValidator,
    {
        let store = Arc::new(BlockStoreService::new(InMemoryKVStore::new(), StorageConfig::default()));
        let events = Arc::new(InMemoryEventBus::new());
        let tip_cache = Arc::new(BestTipCache::new());
        let reorg = Arc::new(ReorgEngineService::new(store.clone(), events, tip_cache));
        let orphans = Arc::new(OrphanBuffer::new());
        BlockIngestionService::new(store, Arc::new(validator), reorg, orphans)
    }

    #[tokio::test]
    async fn duplicate_block_is_ignored() {
        let svc = harness(AcceptAllValidator);
        let genesis = block(0, [0u8; 32], 1_700_000_000_000, 0);
        let outcome = svc
            .process_block(genesis.clone(), ConnectedSource::Genesis, [0u8; 20], 0, true)
            .await;
        assert!(matches!(outcome, IngestionOutcome::Connected));

        let outcome = svc
            .process_block(genesis, ConnectedSource::Genesis, [0u8; 20], 0, true)
            .await;
        assert!(matches!(outcome, IngestionOutcome::Ignored));
    }

    #[tokio::test]
    async fn extends_tip_connects() {
        let svc = harness(AcceptAllValidator);
        let genesis = block(0, [0u8; 32], 1_700_000_000_000, 0);
        let genesis_hash = genesis.hash();
        let outcome = svc
            .process_block(genesis, ConnectedSource::Genesis, [0u8; 20], 0, true)
            .await;
        assert!(matches!(outcome, IngestionOutcome::Connected));

        let child = block(1, genesis_hash, 1_700_000_001_000, 1);
        let outcome = svc
            .process_block(child, ConnectedSource::Broadcast, [1u8; 20], 0, true)
            .await;
        assert!(matches!(outcome, IngestionOutcome::Connected));
        assert_eq!(svc.store.latest_height().unwrap(), Some(1));
    }

    #[tokio::test]
    async fn missing_parent_with_small_gap_is_buffered() {
        let svc = harness(AcceptAllValidator);
        let unknown_parent = [0xABu8; 32];
        let orphan = block(1, unknown_parent, 1_700_000_001_000, 1);
        let outcome = svc
            .process_block(orphan, ConnectedSource::Broadcast, [1u8; 20], 0, true)
            .await;
        assert!(matches!(outcome, IngestionOutcome::Buffered));
    }

    #[tokio::test]
    async fn missing_parent_with_large_gap_is_gap_detected() {
        let svc = harness(AcceptAllValidator);
        let unknown_parent = [0xABu8; 32];
        let orphan = block(50, unknown_parent, 1_700_000_001_000, 1);
        let outcome = svc
            .process_block(orphan, ConnectedSource::Broadcast, [1u8; 20], 0, true)
            .await;
        assert!(matches!(outcome, IngestionOutcome::GapDetected { missing_from: 1 }));
    }

    #[tokio::test]
    async fn invalid_block_is_rejected() {
        let svc = harness(RejectValidator);
        let bad = block(0, [0u8; 32], 1_700_000_000_000, 0);
        let outcome = svc
            .process_block(bad, ConnectedSource::Genesis, [0u8; 20], 0, false)
            .await;
        assert!(matches!(outcome, IngestionOutcome::Rejected(_)));
    }

    #[tokio::test]
    async fn orphan_promotes_once_parent_connects() {
        let svc = harness(AcceptAllValidator);
        let genesis = block(0, [0u8; 32], 1_700_000_000_000, 0);
        let genesis_hash = genesis.hash();
        svc.process_block(genesis, ConnectedSource::Genesis, [0u8; 20], 0, true).await;

        let grandchild_parent = block(1, genesis_hash, 1_700_000_001_000, 1).hash();
        let grandchild = block(2, grandchild_parent, 1_700_000_002_000, 2);
        let outcome = svc
            .process_block(grandchild, ConnectedSource::Broadcast, [1u8; 20], 0, true)
            .await;
        assert!(matches!(outcome, IngestionOutcome::Buffered));
        assert_eq!(svc.orphans.len(), 1);

        let child = block(1, genesis_hash, 1_700_000_001_000, 1);
        let outcome = svc
            .process_block(child, ConnectedSource::Broadcast, [1u8; 20], 0, true)
            .await;
        assert!(matches!(outcome, IngestionOutcome::Connected));

        assert!(svc.orphans.is_empty());
        assert_eq!(svc.store.latest_height().unwrap(), Some(2));
    }
}
