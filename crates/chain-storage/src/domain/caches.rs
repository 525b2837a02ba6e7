//! The four in-memory caches that protect BlockStore's hot paths, plus the
//! single atomic `latest_block_cache` slot.

use std::collections::{HashMap, VecDeque};
use std::sync::RwLock;

use chain_types::{BlockHeader, Hash, Height, StoredBlock, Tx};

/// A capacity-bounded cache with FIFO eviction.
///
/// The store doesn't need recency-aware eviction to satisfy the invalidation
/// contract in 4.1 (cache entries are only ever invalidated post-commit or
/// evicted for space); FIFO is the simplest policy that bounds memory.
pub(crate) struct BoundedCache<V> {
    capacity: usize,
    entries: RwLock<(HashMap<Hash, V>, VecDeque<Hash>)>,
}

impl<V: Clone> BoundedCache<V> {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: RwLock::new((HashMap::new(), VecDeque::new())),
        }
    }

    pub(crate) fn get(&self, key: &Hash) -> Option<V> {
        self.entries.read().unwrap().0.get(key).cloned()
    }

    pub(crate) fn insert(&self, key: Hash, value: V) {
        if self.capacity == 0 {
            return;
        }
        let mut guard = self.entries.write().unwrap();
        let (map, order) = &mut *guard;
        if !map.contains_key(&key) {
            order.push_back(key);
        }
        map.insert(key, value);
        while map.len() > self.capacity {
            if let Some(oldest) = order.pop_front() {
                map.remove(&oldest);
            } else {
                break;
            }
        }
    }

    pub(crate) fn invalidate(&self, key: &Hash) {
        let mut guard = self.entries.write().unwrap();
        guard.0.remove(key);
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.read().unwrap().0.len()
    }
}

/// Height -> hash cache, keyed by height rather than hash.
pub(crate) struct HeightCache {
    capacity: usize,
    entries: RwLock<(HashMap<Height, Hash>, VecDeque<Height>)>,
}

impl HeightCache {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: RwLock::new((HashMap::new(), VecDeque::new())),
        }
    }

    pub(crate) fn get(&self, height: Height) -> Option<Hash> {
        self.entries.read().unwrap().0.get(&height).copied()
    }

    pub(crate) fn insert(&self, height: Height, hash: Hash) {
        if self.capacity == 0 {
            return;
        }
        let mut guard = self.entries.write().unwrap();
        let (map, order) = &mut *guard;
        if !map.contains_key(&height) {
            order.push_back(height);
        }
        map.insert(height, hash);
        while map.len() > self.capacity {
            if let Some(oldest) = order.pop_front() {
                map.remove(&oldest);
            } else {
                break;
            }
        }
    }

    pub(crate) fn invalidate(&self, height: Height) {
        self.entries.write().unwrap().0.remove(&height);
    }
}

/// The single atomic slot tracking the current tip, served to
/// `latest_height()`/`latest_stored()` without touching the block store.
pub(crate) struct LatestBlockCache {
    slot: RwLock<Option<(Height, Hash)>>,
}

impl LatestBlockCache {
    pub(crate) fn new() -> Self {
        Self {
            slot: RwLock::new(None),
        }
    }

    pub(crate) fn get(&self) -> Option<(Height, Hash)> {
        *self.slot.read().unwrap()
    }

    pub(crate) fn set(&self, height: Height, hash: Hash) {
        *self.slot.write().unwrap() = Some((height, hash));
    }
}

/// Bundles the four caches and the atomic tip slot together.
pub(crate) struct StorageCaches {
    pub(crate) full: BoundedCache<StoredBlock>,
    pub(crate) header: BoundedCache<BlockHeader>,
    pub(crate) height: HeightCache,
    pub(crate) tx: BoundedCache<Tx>,
    pub(crate) latest: LatestBlockCache,
}

impl StorageCaches {
    pub(crate) fn new(config: &super::config::StorageConfig) -> Self {
        Self {
            full: BoundedCache::new(config.full_cache_capacity),
            header: BoundedCache::new(config.header_cache_capacity),
            height: HeightCache::new(config.height_cache_capacity),
            tx: BoundedCache::new(config.tx_cache_capacity),
            latest: LatestBlockCache::new(),
        }
    }
}
