//! Cached pointer to the current best tip.
//!
//! The teacher's fork-choice store (`LMDGhostStore`) keeps a tree of
//! headers plus a weight cache that is invalidated on every vote and
//! lazily recomputed on the next head query. A PoW chain doesn't need
//! the tree — cumulative difficulty totally orders candidates — but the
//! same "invalidate on write, recompute on read" shape is worth keeping
//! so [`crate::service::ingestion::BlockIngestionService`] doesn't have
//! to round-trip through `chain-storage` on every single block just to
//! learn the current tip's cumulative difficulty.

use std::sync::atomic::{AtomicBool, Ordering};

use chain_types::{CumulativeDifficulty, Hash, Height, TimestampMs};
use parking_lot::RwLock;

#[derive(Clone, Copy, Debug)]
pub struct TipSummary {
    pub height: Height,
    pub hash: Hash,
    pub cumulative_difficulty: CumulativeDifficulty,
    pub timestamp: TimestampMs,
}

pub struct BestTipCache {
    summary: RwLock<Option<TipSummary>>,
    valid: AtomicBool,
}

impl BestTipCache {
    pub fn new() -> Self {
        Self {
            summary: RwLock::new(None),
            valid: AtomicBool::new(false),
        }
    }

    /// Invalidate the cache; the next caller to need the tip must refill
    /// it via [`Self::set`] after re-reading `chain-storage`.
    pub fn invalidate(&self) {
        self.valid.store(false, Ordering::Release);
    }

    pub fn is_valid(&self) -> bool {
        self.valid.load(Ordering::Acquire)
    }

    pub fn get(&self) -> Option<TipSummary> {
        if !self.is_valid() {
            return None;
        }
        *self.summary.read()
    }

    /// Populate the cache with a freshly-read tip summary, marking it valid.
    pub fn set(&self, summary: TipSummary) {
        *self.summary.write() = Some(summary);
        self.valid.store(true, Ordering::Release);
    }
}

impl Default for BestTipCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> TipSummary {
        TipSummary {
            height: 10,
            hash: [1u8; 32],
            cumulative_difficulty: CumulativeDifficulty::from(100u64),
            timestamp: 1,
        }
    }

    #[test]
    fn starts_invalid() {
        let cache = BestTipCache::new();
        assert!(cache.get().is_none());
    }

    #[test]
    fn set_then_get() {
        let cache = BestTipCache::new();
        cache.set(summary());
        let got = cache.get().unwrap();
        assert_eq!(got.height, 10);
    }

    #[test]
    fn invalidate_clears_validity_not_value() {
        let cache = BestTipCache::new();
        cache.set(summary());
        cache.invalidate();
        assert!(cache.get().is_none());
        assert!(!cache.is_valid());
    }
}
