//! # Core Domain Entities
//!
//! The chain's data model: hashes, headers, transactions, blocks, and the
//! storage-layer wrapper around a block.
//!
//! ## Clusters
//!
//! - **Chain**: `BlockHeader`, `Tx`, `Block`
//! - **Storage**: `StoredBlock`, `ConnectedSource`
//! - **Difficulty**: `Difficulty`, `CumulativeDifficulty`

use once_cell::sync::OnceCell;
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// A 32-byte content digest.
pub type Hash = [u8; 32];

/// A 20-byte account identifier.
pub type Address = [u8; 20];

/// Chain height. Genesis is height 0.
pub type Height = u64;

/// Arbitrary-precision non-negative difficulty value.
pub type Difficulty = U256;

/// Arbitrary-precision non-negative running sum of `Difficulty`.
pub type CumulativeDifficulty = U256;

/// Epoch-millisecond timestamp.
pub type TimestampMs = u64;

/// Transaction type tag. Interpretation of `payload` depends on this and
/// on `version`; execution semantics live outside this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxType {
    /// A plain value transfer.
    Transfer,
    /// A coinbase/reward transaction (first transaction of a block).
    Coinbase,
    /// A governance ("BIP") vote or proposal transaction.
    Governance,
    /// A token-definition or token-transfer transaction.
    Token,
}

/// An immutable, hash-addressed transaction.
///
/// `hash()` is computed from the canonical encoding of every field except
/// `hash_cache` and memoized: the first caller pays for the digest, every
/// later caller (including on a cloned value, since `OnceCell` is cloned
/// empty) observes the same bytes re-derived from the same encoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tx {
    pub sender: Address,
    pub recipient: Option<Address>,
    pub amount: u64,
    pub fee: u64,
    pub nonce: u64,
    pub tx_type: TxType,
    pub version: u16,
    pub payload: Vec<u8>,
    pub signature: Option<Vec<u8>>,
    #[serde(skip, default)]
    hash_cache: OnceCell<Hash>,
}

impl Tx {
    pub fn new(
        sender: Address,
        recipient: Option<Address>,
        amount: u64,
        fee: u64,
        nonce: u64,
        tx_type: TxType,
        version: u16,
        payload: Vec<u8>,
        signature: Option<Vec<u8>>,
    ) -> Self {
        Self {
            sender,
            recipient,
            amount,
            fee,
            nonce,
            tx_type,
            version,
            payload,
            signature,
            hash_cache: OnceCell::new(),
        }
    }

    /// Content hash, computed once and memoized (property P6).
    pub fn hash(&self) -> Hash {
        *self.hash_cache.get_or_init(|| canonical_tx_hash(self))
    }

    /// Encoded size in bytes, used for the per-tx size cap.
    pub fn size(&self) -> usize {
        bincode::serialize(self).map(|b| b.len()).unwrap_or(0)
    }
}

fn canonical_tx_hash(tx: &Tx) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(tx.sender);
    if let Some(r) = tx.recipient {
        hasher.update([1u8]);
        hasher.update(r);
    } else {
        hasher.update([0u8]);
    }
    hasher.update(tx.amount.to_be_bytes());
    hasher.update(tx.fee.to_be_bytes());
    hasher.update(tx.nonce.to_be_bytes());
    hasher.update([tx.tx_type as u8]);
    hasher.update(tx.version.to_be_bytes());
    hasher.update(&tx.payload);
    if let Some(sig) = &tx.signature {
        hasher.update(sig);
    }
    hasher.finalize().into()
}

/// An immutable, hash-addressed block header.
///
/// `hash()` is the digest of the canonical encoding of every field below
/// and is computed once, memoized the same way as [`Tx::hash`] (invariant
/// I5, property P6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockHeader {
    pub version: u16,
    pub height: Height,
    pub previous_hash: Hash,
    pub tx_root_hash: Hash,
    pub state_root_hash: Hash,
    pub timestamp: TimestampMs,
    pub difficulty: Difficulty,
    pub coinbase: Address,
    pub nonce: u64,
    pub signature: Option<Vec<u8>>,
    #[serde(skip, default)]
    hash_cache: OnceCell<Hash>,
}

impl BlockHeader {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        version: u16,
        height: Height,
        previous_hash: Hash,
        tx_root_hash: Hash,
        state_root_hash: Hash,
        timestamp: TimestampMs,
        difficulty: Difficulty,
        coinbase: Address,
        nonce: u64,
        signature: Option<Vec<u8>>,
    ) -> Self {
        Self {
            version,
            height,
            previous_hash,
            tx_root_hash,
            state_root_hash,
            timestamp,
            difficulty,
            coinbase,
            nonce,
            signature,
            hash_cache: OnceCell::new(),
        }
    }

    /// Header hash, computed once and memoized (invariant I5, property P6).
    pub fn hash(&self) -> Hash {
        *self.hash_cache.get_or_init(|| canonical_header_hash(self))
    }

    /// Encoded size in bytes (the `size` derived field).
    pub fn size(&self) -> usize {
        bincode::serialize(self).map(|b| b.len()).unwrap_or(0)
    }

    pub fn is_genesis(&self) -> bool {
        self.height == 0
    }
}

fn canonical_header_hash(h: &BlockHeader) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(h.version.to_be_bytes());
    hasher.update(h.height.to_be_bytes());
    hasher.update(h.previous_hash);
    hasher.update(h.tx_root_hash);
    hasher.update(h.state_root_hash);
    hasher.update(h.timestamp.to_be_bytes());
    let mut diff_bytes = [0u8; 32];
    h.difficulty.to_big_endian(&mut diff_bytes);
    hasher.update(diff_bytes);
    hasher.update(h.coinbase);
    hasher.update(h.nonce.to_be_bytes());
    if let Some(sig) = &h.signature {
        hasher.update(sig);
    }
    hasher.finalize().into()
}

/// Binary merkle root over an ordered sequence of tx hashes (Bitcoin-style:
/// an odd node at a level is duplicated rather than left unpaired). Empty
/// input hashes to the all-zero digest, matching an empty genesis body.
pub fn merkle_root(hashes: impl Iterator<Item = Hash>) -> Hash {
    let mut level: Vec<Hash> = hashes.collect();
    if level.is_empty() {
        return [0u8; 32];
    }
    while level.len() > 1 {
        if level.len() % 2 == 1 {
            level.push(*level.last().unwrap());
        }
        level = level
            .chunks(2)
            .map(|pair| {
                let mut hasher = Sha256::new();
                hasher.update(pair[0]);
                hasher.update(pair[1]);
                hasher.finalize().into()
            })
            .collect();
    }
    level[0]
}

/// Header plus its ordered transaction list.
///
/// Invariant: `tx_root_hash == merkle_root(txs)` — checked by
/// `chain-consensus::BlockValidator`, not enforced at construction time,
/// since partially-decoded (header-only) blocks never build this type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub txs: Vec<Tx>,
}

impl Block {
    pub fn new(header: BlockHeader, txs: Vec<Tx>) -> Self {
        Self { header, txs }
    }

    pub fn hash(&self) -> Hash {
        self.header.hash()
    }

    pub fn height(&self) -> Height {
        self.header.height
    }
}

/// Where a block came from, for bookkeeping and log/metric labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectedSource {
    Genesis,
    Miner,
    Broadcast,
    Reorg,
}

/// Storage wrapper around a [`Block`].
///
/// Built only through [`StoredBlockBuilder`]; once built a `StoredBlock`
/// is never mutated in place — a reorg demotes a block by removing its
/// `height_index` entry elsewhere, it never edits this struct.
///
/// The `partial` form (`body absent`) is produced by header-only decodes
/// and carries an empty `txs` with `is_partial = true`; callers must not
/// treat an empty `txs` on a non-partial block as equivalent to a partial
/// one (an empty block is legal only at genesis in most network params,
/// but the type does not enforce that — `BlockValidator` does).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredBlock {
    pub block: Block,
    pub cumulative_difficulty: CumulativeDifficulty,
    pub received_at: TimestampMs,
    pub received_from: Address,
    pub connected_source: ConnectedSource,
    pub is_partial: bool,
    /// `tx_hash -> position within block.txs`. Empty when `is_partial`.
    tx_index: BTreeMap<Hash, u32>,
    #[serde(skip, default)]
    hash_cache: OnceCell<Hash>,
    #[serde(skip, default)]
    size_cache: OnceCell<usize>,
}

impl StoredBlock {
    pub fn hash(&self) -> Hash {
        *self.hash_cache.get_or_init(|| self.block.header.hash())
    }

    pub fn height(&self) -> Height {
        self.block.header.height
    }

    pub fn previous_hash(&self) -> Hash {
        self.block.header.previous_hash
    }

    /// Position of `tx_hash` within this block, if present.
    pub fn tx_position(&self, tx_hash: &Hash) -> Option<u32> {
        self.tx_index.get(tx_hash).copied()
    }

    pub fn tx_hashes(&self) -> impl Iterator<Item = &Hash> {
        self.tx_index.keys()
    }

    /// Encoded size in bytes, memoized like the header hash.
    pub fn encoded_size(&self) -> usize {
        *self
            .size_cache
            .get_or_init(|| bincode::serialize(self).map(|b| b.len()).unwrap_or(0))
    }
}

/// Builder for [`StoredBlock`] — the only way to construct one, so the
/// `tx_index` can never drift from `block.txs` (invariant I4).
pub struct StoredBlockBuilder {
    block: Block,
    cumulative_difficulty: CumulativeDifficulty,
    received_at: TimestampMs,
    received_from: Address,
    connected_source: ConnectedSource,
    is_partial: bool,
}

impl StoredBlockBuilder {
    pub fn new(block: Block, connected_source: ConnectedSource) -> Self {
        Self {
            block,
            cumulative_difficulty: CumulativeDifficulty::zero(),
            received_at: 0,
            received_from: [0u8; 20],
            connected_source,
            is_partial: false,
        }
    }

    pub fn cumulative_difficulty(mut self, cd: CumulativeDifficulty) -> Self {
        self.cumulative_difficulty = cd;
        self
    }

    pub fn received_at(mut self, ts: TimestampMs) -> Self {
        self.received_at = ts;
        self
    }

    pub fn received_from(mut self, addr: Address) -> Self {
        self.received_from = addr;
        self
    }

    pub fn partial(mut self, is_partial: bool) -> Self {
        self.is_partial = is_partial;
        self
    }

    pub fn build(self) -> StoredBlock {
        let tx_index = if self.is_partial {
            BTreeMap::new()
        } else {
            self.block
                .txs
                .iter()
                .enumerate()
                .map(|(pos, tx)| (tx.hash(), pos as u32))
                .collect()
        };

        StoredBlock {
            block: self.block,
            cumulative_difficulty: self.cumulative_difficulty,
            received_at: self.received_at,
            received_from: self.received_from,
            connected_source: self.connected_source,
            is_partial: self.is_partial,
            tx_index,
            hash_cache: OnceCell::new(),
            size_cache: OnceCell::new(),
        }
    }
}
