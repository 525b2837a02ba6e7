//! Bounded buffer for blocks whose parent is not yet known (C3).
//!
//! Shaped after the teacher's `BlockAssemblyBuffer`: a bounded map keyed
//! by hash with TTL- and size-bounded eviction, plus a secondary index
//! here keyed by `previous_hash` so a newly connected parent can look up
//! its waiting children in one step.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use chain_types::{Address, Hash, StoredBlock, TimestampMs};
use parking_lot::RwLock;

/// How long an orphan is kept without its parent arriving.
pub const ORPHAN_TTL: Duration = Duration::from_secs(600);

/// Maximum number of orphans held at once; admission beyond this is
/// rejected (dropped, counted) rather than evicting something else.
pub const ORPHAN_CAP: usize = 1000;

/// A block buffered because its parent isn't stored yet.
#[derive(Clone)]
pub struct Orphan {
    pub block: StoredBlock,
    pub received_from: Address,
    pub received_at: TimestampMs,
    inserted_at: Instant,
}

struct Inner {
    by_hash: HashMap<Hash, Orphan>,
    by_parent: HashMap<Hash, Vec<Hash>>,
}

/// Concurrent orphan buffer; sweeps are serialized by the same lock that
/// guards admission, matching the teacher's "concurrent map, sweep under
/// an internal lock" shape.
pub struct OrphanBuffer {
    inner: RwLock<Inner>,
    rejected: std::sync::atomic::AtomicU64,
}

impl OrphanBuffer {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                by_hash: HashMap::new(),
                by_parent: HashMap::new(),
            }),
            rejected: std::sync::atomic::AtomicU64::new(0),
        }
    }

    /// Admit `block` as an orphan. Rejected (and counted) if already
    /// present or if the buffer is at capacity.
    pub fn add(&self, block: StoredBlock, received_from: Address, received_at: TimestampMs) -> bool {
        let hash = block.hash();
        let parent = block.previous_hash();
        let mut inner = self.inner.write();

        if inner.by_hash.contains_key(&hash) {
            return false;
        }
        if inner.by_hash.len() >= ORPHAN_CAP {
            self.rejected.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            return false;
        }

        inner.by_hash.insert(
            hash,
            Orphan {
                block,
                received_from,
                received_at,
                inserted_at: Instant::now(),
            },
        );
        inner.by_parent.entry(parent).or_default().push(hash);
        true
    }

    /// Remove and return every orphan directly parented on `parent`, for
    /// recursive promotion once `parent` connects.
    pub fn pop_children(&self, parent: &Hash) -> Vec<Orphan> {
        let mut inner = self.inner.write();
        let Some(hashes) = inner.by_parent.remove(parent) else {
            return Vec::new();
        };
        hashes
            .into_iter()
            .filter_map(|h| inner.by_hash.remove(&h))
            .collect()
    }

    pub fn contains(&self, hash: &Hash) -> bool {
        self.inner.read().by_hash.contains_key(hash)
    }

    pub fn len(&self) -> usize {
        self.inner.read().by_hash.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Count of admissions rejected for being over capacity (P10 adjacent
    /// bookkeeping, surfaced to `chain-telemetry`).
    pub fn rejected_count(&self) -> u64 {
        self.rejected.load(std::sync::atomic::Ordering::Relaxed)
    }

    /// Evict every orphan older than [`ORPHAN_TTL`] (property P10).
    pub fn sweep(&self) -> usize {
        let mut inner = self.inner.write();
        let now = Instant::now();
        let expired: Vec<Hash> = inner
            .by_hash
            .iter()
            .filter(|(_, o)| now.duration_since(o.inserted_at) >= ORPHAN_TTL)
            .map(|(h, _)| *h)
            .collect();

        for hash in &expired {
            if let Some(orphan) = inner.by_hash.remove(hash) {
                let parent = orphan.block.previous_hash();
                if let Some(siblings) = inner.by_parent.get_mut(&parent) {
                    siblings.retain(|h| h != hash);
                    if siblings.is_empty() {
                        inner.by_parent.remove(&parent);
                    }
                }
            }
        }
        expired.len()
    }
}

impl Default for OrphanBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chain_types::{Block, BlockHeader, ConnectedSource, CumulativeDifficulty, StoredBlockBuilder};

    fn block(height: u64, previous_hash: Hash, nonce: u64) -> StoredBlock {
        let header = BlockHeader::new(
            1,
            height,
            previous_hash,
            [0u8; 32],
            [0u8; 32],
            1_700_000_000_000,
            CumulativeDifficulty::from(1u64),
            [0u8; 20],
            nonce,
            None,
        );
        StoredBlockBuilder::new(Block::new(header, Vec::new()), ConnectedSource::Broadcast).build()
    }

    #[test]
    fn add_then_contains() {
        let buf = OrphanBuffer::new();
        let b = block(5, [1u8; 32], 0);
        let hash = b.hash();
        assert!(buf.add(b, [0u8; 20], 0));
        assert!(buf.contains(&hash));
    }

    #[test]
    fn duplicate_admission_rejected() {
        let buf = OrphanBuffer::new();
        let b = block(5, [1u8; 32], 0);
        assert!(buf.add(b.clone(), [0u8; 20], 0));
        assert!(!buf.add(b, [0u8; 20], 0));
    }

    #[test]
    fn pop_children_returns_and_removes() {
        let buf = OrphanBuffer::new();
        let parent = [9u8; 32];
        let child = block(5, parent, 0);
        buf.add(child.clone(), [0u8; 20], 0);

        let popped = buf.pop_children(&parent);
        assert_eq!(popped.len(), 1);
        assert_eq!(popped[0].block.hash(), child.hash());
        assert!(!buf.contains(&child.hash()));
        assert!(buf.pop_children(&parent).is_empty());
    }

    #[test]
    fn capacity_is_enforced() {
        let buf = OrphanBuffer::new();
        for i in 0..ORPHAN_CAP {
            let b = block(i as u64, [i as u8; 32], i as u64);
            assert!(buf.add(b, [0u8; 20], 0));
        }
        let overflow = block(9999, [0xFFu8; 32], 0);
        assert!(!buf.add(overflow, [0u8; 20], 0));
        assert_eq!(buf.rejected_count(), 1);
    }
}
