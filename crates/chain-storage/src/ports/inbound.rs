//! Inbound ports: the primary APIs the block store exposes — `BlockStore`
//! (C1) and the stateless `ChainQuery` façade over it (C2).

use chain_types::{BlockHeader, Hash, Height, StorageError, StoredBlock, Tx};

/// Content-addressed persistence for blocks, headers, the height->hash
/// index and the tx->block index, fronted by the four in-memory caches.
pub trait BlockStore: Send + Sync {
    /// Cache lookup first, then a single point read on miss. Populates both
    /// the full and header caches on success.
    fn get_full(&self, hash: &Hash) -> Result<Option<StoredBlock>, StorageError>;

    /// Like [`BlockStore::get_full`] but decodes with the transaction bodies
    /// skipped. Populates only the header cache on success.
    fn get_header(&self, hash: &Hash) -> Result<Option<BlockHeader>, StorageError>;

    /// Batched point-read over full blocks.
    fn multi_get_full(&self, hashes: &[Hash]) -> Result<Vec<Option<StoredBlock>>, StorageError>;

    /// Batched point-read over headers only.
    fn multi_get_header(&self, hashes: &[Hash]) -> Result<Vec<Option<BlockHeader>>, StorageError>;

    /// Iterate `height_index` forward from `from` up to and including `to`,
    /// then multi-fetch full blocks. Populates the height cache.
    fn height_range(&self, from: Height, to: Height) -> Result<Vec<StoredBlock>, StorageError>;

    /// Same as [`BlockStore::height_range`] but returns headers only.
    fn header_range(&self, from: Height, to: Height) -> Result<Vec<BlockHeader>, StorageError>;

    /// Presence check without decoding.
    fn exists(&self, hash: &Hash) -> Result<bool, StorageError>;

    /// Resolve a transaction hash to the hash of the block that contains it,
    /// via the `tx_index` column family.
    fn block_hash_for_tx(&self, tx_hash: &Hash) -> Result<Option<Hash>, StorageError>;

    /// Resolve a transaction by hash: tx cache lookup first, then
    /// `tx_index` -> containing block -> its position within that block.
    /// Populates the tx cache on success.
    fn get_tx(&self, tx_hash: &Hash) -> Result<Option<Tx>, StorageError>;

    /// Open a write batch, run `op` against the [`WriteBatch`] to enqueue
    /// puts/deletes, commit with durable sync, then drain the deferred
    /// cache-invalidation queue. On any error the batch is aborted and
    /// pending invalidations are discarded — no partial effect is visible.
    fn write_batch<F>(&self, op: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut dyn WriteBatch) -> Result<(), StorageError>;
}

/// Handle passed into the closure given to [`BlockStore::write_batch`].
///
/// Every method enqueues puts/deletes against the underlying column
/// families; nothing is visible to readers (including the caches) until the
/// batch commits.
pub trait WriteBatch {
    /// Persist a new `StoredBlock` under `blocks`, and its transactions
    /// under `tx_index`. Does not touch `height_index`.
    fn save_block(&mut self, block: &StoredBlock) -> Result<(), StorageError>;

    /// Point `height_index[block.height]` at `hash`, marking it canonical.
    fn connect_tip(&mut self, height: Height, hash: &Hash) -> Result<(), StorageError>;

    /// Remove the `height_index` entry at `height`. The block body and its
    /// `tx_index` entries are left untouched — blocks are demoted from
    /// canonical, never deleted.
    fn disconnect_tip(&mut self, height: Height) -> Result<(), StorageError>;

    /// Remove the `height_index` entry at `height` without implying a block
    /// is still stored at a different height (used when truncating past the
    /// chain's current extent).
    fn remove_height(&mut self, height: Height) -> Result<(), StorageError>;
}

/// Stateless read façade over [`BlockStore`], used by synchronization and
/// reorg logic to reason about the canonical chain.
pub trait ChainQuery: Send + Sync {
    /// Resolve `hash` to a stored block, then check that `height_index` at
    /// that block's height still points back at it.
    fn canonical_at(&self, hash: &Hash) -> Result<bool, StorageError>;

    /// A Bitcoin-style exponential locator: tip, tip-1, tip-2, tip-4,
    /// tip-8, ..., doubling, plus genesis.
    fn locator_hashes(&self) -> Result<Vec<Hash>, StorageError>;

    /// For `locators` (most-recent-first), the first entry found in the
    /// canonical chain whose height matches its position in our canonical
    /// chain. Falls back to genesis, or `None` if no genesis is stored.
    fn find_common_ancestor(&self, locators: &[Hash]) -> Result<Option<Hash>, StorageError>;

    /// Served from `latest_block_cache`.
    fn latest_height(&self) -> Result<Option<Height>, StorageError>;

    /// Served from `latest_block_cache`.
    fn latest_stored(&self) -> Result<Option<Hash>, StorageError>;
}
