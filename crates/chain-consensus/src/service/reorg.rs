//! `ReorgEngine` (C5): atomic canonical-chain swap.
//!
//! Grounded on `LMDGhostStore`'s shape (cache of headers plus a cached
//! "current best" pointer, invalidated on write and lazily recomputed on
//! read) with the fork-choice rule itself replaced by cumulative
//! difficulty comparison.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use chain_bus::{ChainEvent, EventPublisher};
use chain_storage::{BlockStore, ChainQuery};
use chain_types::{Hash, StoredBlock};

use crate::domain::{BestTipCache, TipSummary};
use crate::errors::ReorgError;
use crate::ports::inbound::ReorgEngine as ReorgEngineTrait;

pub struct ReorgEngineService<S, E> {
    store: Arc<S>,
    events: Arc<E>,
    tip_cache: Arc<BestTipCache>,
}

impl<S, E> ReorgEngineService<S, E>
where
    S: BlockStore + ChainQuery,
    E: EventPublisher,
{
    pub fn new(store: Arc<S>, events: Arc<E>, tip_cache: Arc<BestTipCache>) -> Self {
        Self { store, events, tip_cache }
    }

    /// Canonical blocks strictly above `common_ancestor`'s height, in
    /// descending height order.
    fn old_branch(&self, common_ancestor: Hash) -> Result<Vec<StoredBlock>, ReorgError> {
        let ancestor_height = match self.store.get_header(&common_ancestor)? {
            Some(h) => h.height,
            None => return Ok(Vec::new()),
        };
        let tip_height = match self.store.latest_height()? {
            Some(h) => h,
            None => return Ok(Vec::new()),
        };
        if tip_height <= ancestor_height {
            return Ok(Vec::new());
        }
        let mut branch = self.store.height_range(ancestor_height + 1, tip_height)?;
        branch.sort_by_key(StoredBlock::height);
        branch.reverse();
        Ok(branch)
    }

    fn current_tip(&self) -> Result<Option<StoredBlock>, ReorgError> {
        match self.store.latest_stored()? {
            Some(hash) => Ok(self.store.get_full(&hash)?),
            None => Ok(None),
        }
    }

    async fn apply(&self, old_branch: Vec<StoredBlock>, new_branch: Vec<StoredBlock>) -> Result<(), ReorgError> {
        self.store.write_batch(|batch| {
            for block in &old_branch {
                batch.disconnect_tip(block.height())?;
            }
            for block in &new_branch {
                batch.save_block(block)?;
                batch.connect_tip(block.height(), &block.hash())?;
            }
            Ok(())
        })?;

        self.tip_cache.invalidate();
        if let Some(new_tip) = new_branch.last() {
            self.tip_cache.set(TipSummary {
                height: new_tip.height(),
                hash: new_tip.hash(),
                cumulative_difficulty: new_tip.cumulative_difficulty,
                timestamp: new_tip.block.header.timestamp,
            });
        }

        for block in &old_branch {
            self.events
                .publish(ChainEvent::BlockDisconnected { block: block.block.clone() })
                .await;
        }
        for block in &new_branch {
            self.events
                .publish(ChainEvent::BlockConnected {
                    block: block.block.clone(),
                    cumulative_difficulty: block.cumulative_difficulty,
                    total_fees: block.block.txs.iter().map(|tx| tx.fee).sum(),
                    block_reward: 0,
                    events: Vec::new(),
                })
                .await;
        }

        chain_telemetry::CHAIN_HEIGHT.set(
            new_branch
                .last()
                .map(|b| b.height() as f64)
                .unwrap_or_default(),
        );

        Ok(())
    }
}

#[async_trait]
impl<S, E> ReorgEngineTrait for ReorgEngineService<S, E>
where
    S: BlockStore + ChainQuery,
    E: EventPublisher,
{
    async fn fast_forward(&self, new_branch: Vec<StoredBlock>) -> Result<(), ReorgError> {
        debug!(len = new_branch.len(), "fast-forward");
        self.apply(Vec::new(), new_branch).await
    }

    async fn reorg(&self, common_ancestor: Hash, new_branch: Vec<StoredBlock>) -> Result<(), ReorgError> {
        let current_tip = self.current_tip()?;
        let challenger = new_branch.last().ok_or(ReorgError::NotBetterChain)?;

        // Strictly more work always wins; on a tie, prefer the chain
        // whose tip has the earlier timestamp.
        let better = match &current_tip {
            None => true,
            Some(current) => {
                challenger.cumulative_difficulty > current.cumulative_difficulty
                    || (challenger.cumulative_difficulty == current.cumulative_difficulty
                        && current.block.header.timestamp > challenger.block.header.timestamp)
            }
        };
        if !better {
            return Err(ReorgError::NotBetterChain);
        }

        let old_branch = self.old_branch(common_ancestor)?;
        info!(
            disconnected = old_branch.len(),
            connected = new_branch.len(),
            "reorg"
        );
        chain_telemetry::REORGS_COUNT.inc();
        self.apply(old_branch, new_branch).await
    }
}
