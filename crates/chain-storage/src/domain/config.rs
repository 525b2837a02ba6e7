//! Storage engine configuration.

/// Configuration for the block store and its in-memory caches.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Maximum number of entries held in the full-block cache.
    pub full_cache_capacity: usize,
    /// Maximum number of entries held in the header-only cache.
    pub header_cache_capacity: usize,
    /// Maximum number of entries held in the height->hash cache.
    pub height_cache_capacity: usize,
    /// Maximum number of entries held in the tx->Tx cache.
    pub tx_cache_capacity: usize,
    /// Maximum number of blocks returned by a single `height_range`/`header_range` call.
    pub max_range_size: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            full_cache_capacity: 2_000,
            header_cache_capacity: 10_000,
            height_cache_capacity: 10_000,
            tx_cache_capacity: 50_000,
            max_range_size: 2_000,
        }
    }
}

impl StorageConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_full_cache_capacity(mut self, capacity: usize) -> Self {
        self.full_cache_capacity = capacity;
        self
    }

    pub fn with_max_range_size(mut self, size: u64) -> Self {
        self.max_range_size = size;
        self
    }
}
