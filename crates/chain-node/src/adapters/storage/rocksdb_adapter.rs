//! # RocksDB Storage Adapter
//!
//! `chain_storage::ports::outbound::KeyValueStore` over a single
//! `rocksdb::DB` handle, one real column family per
//! [`chain_storage::ColumnFamily`].
//!
//! ## Configuration
//!
//! Tuned for blockchain workloads: a large block cache, bloom filters on
//! point lookups, Snappy compression, and `sync_writes` controlling
//! whether commits fsync before returning (on for production, off for
//! throwaway test databases).

use std::io;
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use rocksdb::{ColumnFamilyDescriptor, Options, WriteBatch as RocksWriteBatch, DB};

use chain_storage::ports::outbound::{BatchOperation, ColumnFamily, KeyValueStore};
use chain_types::StorageError;

fn io_err(message: impl Into<String>) -> StorageError {
    StorageError::Io(io::Error::new(io::ErrorKind::Other, message.into()))
}

/// RocksDB configuration for production use.
#[derive(Debug, Clone)]
pub struct RocksDbConfig {
    /// Path to the database directory.
    pub path: String,
    /// Block cache size in bytes (default: 256MB).
    pub block_cache_size: usize,
    /// Write buffer size in bytes (default: 64MB).
    pub write_buffer_size: usize,
    /// Maximum number of write buffers (default: 3).
    pub max_write_buffer_number: i32,
    /// Target file size for level-1 (default: 64MB).
    pub target_file_size_base: u64,
    /// fsync after each write. On for production, off for ephemeral test DBs.
    pub sync_writes: bool,
}

impl Default for RocksDbConfig {
    fn default() -> Self {
        Self {
            path: "./data/rocksdb".to_string(),
            block_cache_size: 256 * 1024 * 1024,
            write_buffer_size: 64 * 1024 * 1024,
            max_write_buffer_number: 3,
            target_file_size_base: 64 * 1024 * 1024,
            sync_writes: true,
        }
    }
}

impl RocksDbConfig {
    /// Config for tests: smaller buffers, no fsync.
    pub fn for_testing(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            block_cache_size: 8 * 1024 * 1024,
            write_buffer_size: 4 * 1024 * 1024,
            max_write_buffer_number: 2,
            target_file_size_base: 4 * 1024 * 1024,
            sync_writes: false,
        }
    }
}

fn cf_name(cf: ColumnFamily) -> &'static str {
    cf.name()
}

/// RocksDB-backed [`KeyValueStore`].
pub struct RocksDbStore {
    db: Arc<RwLock<DB>>,
    config: RocksDbConfig,
}

impl RocksDbStore {
    /// Open or create a database at `config.path`, one column family per
    /// [`ColumnFamily::ALL`].
    pub fn open(config: RocksDbConfig) -> Result<Self, StorageError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        opts.set_write_buffer_size(config.write_buffer_size);
        opts.set_max_write_buffer_number(config.max_write_buffer_number);
        opts.set_target_file_size_base(config.target_file_size_base);
        opts.set_compression_type(rocksdb::DBCompressionType::Snappy);

        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        block_opts.set_block_cache(&rocksdb::Cache::new_lru_cache(config.block_cache_size));
        opts.set_block_based_table_factory(&block_opts);

        let cf_descriptors: Vec<ColumnFamilyDescriptor> = ColumnFamily::ALL
            .iter()
            .map(|cf| {
                let mut cf_opts = Options::default();
                cf_opts.set_compression_type(rocksdb::DBCompressionType::Snappy);
                ColumnFamilyDescriptor::new(cf_name(*cf), cf_opts)
            })
            .collect();

        let db = DB::open_cf_descriptors(&opts, &config.path, cf_descriptors)
            .map_err(|e| io_err(format!("failed to open RocksDB at {}: {e}", config.path)))?;

        Ok(Self { db: Arc::new(RwLock::new(db)), config })
    }

    /// Open with default tuning at `path`.
    pub fn open_default(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let config = RocksDbConfig {
            path: path.as_ref().to_string_lossy().to_string(),
            ..Default::default()
        };
        Self::open(config)
    }

    fn cf_handle<'a>(db: &'a DB, cf: ColumnFamily) -> Result<&'a rocksdb::ColumnFamily, StorageError> {
        db.cf_handle(cf_name(cf))
            .ok_or_else(|| StorageError::Corruption(format!("missing column family {}", cf_name(cf))))
    }
}

impl KeyValueStore for RocksDbStore {
    fn get(&self, cf: ColumnFamily, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        let db = self.db.read();
        let handle = Self::cf_handle(&db, cf)?;
        db.get_cf(handle, key).map_err(|e| io_err(format!("RocksDB get failed: {e}")))
    }

    fn exists(&self, cf: ColumnFamily, key: &[u8]) -> Result<bool, StorageError> {
        let db = self.db.read();
        let handle = Self::cf_handle(&db, cf)?;
        db.get_pinned_cf(handle, key)
            .map(|v| v.is_some())
            .map_err(|e| io_err(format!("RocksDB exists check failed: {e}")))
    }

    fn scan_from(
        &self,
        cf: ColumnFamily,
        from: &[u8],
        limit: usize,
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StorageError> {
        let db = self.db.read();
        let handle = Self::cf_handle(&db, cf)?;
        let iter = db.iterator_cf(handle, rocksdb::IteratorMode::From(from, rocksdb::Direction::Forward));

        let mut results = Vec::with_capacity(limit.min(1024));
        for item in iter {
            if results.len() >= limit {
                break;
            }
            let (key, value) = item.map_err(|e| io_err(format!("RocksDB scan failed: {e}")))?;
            results.push((key.to_vec(), value.to_vec()));
        }
        Ok(results)
    }

    fn write_batch(&self, operations: Vec<BatchOperation>) -> Result<(), StorageError> {
        let db = self.db.write();
        let mut batch = RocksWriteBatch::default();

        for op in operations {
            match op {
                BatchOperation::Put { cf, key, value } => {
                    let handle = Self::cf_handle(&db, cf)?;
                    batch.put_cf(handle, &key, &value);
                }
                BatchOperation::Delete { cf, key } => {
                    let handle = Self::cf_handle(&db, cf)?;
                    batch.delete_cf(handle, &key);
                }
            }
        }

        let mut write_opts = rocksdb::WriteOptions::default();
        write_opts.set_sync(self.config.sync_writes);

        db.write_opt(batch, &write_opts)
            .map_err(|e| io_err(format!("RocksDB batch write failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(temp: &TempDir) -> RocksDbStore {
        let config = RocksDbConfig::for_testing(temp.path().to_string_lossy().to_string());
        RocksDbStore::open(config).unwrap()
    }

    #[test]
    fn put_then_get_round_trips() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);

        store
            .write_batch(vec![BatchOperation::put(ColumnFamily::Blocks, b"k1".to_vec(), b"v1".to_vec())])
            .unwrap();

        assert_eq!(store.get(ColumnFamily::Blocks, b"k1").unwrap(), Some(b"v1".to_vec()));
        assert!(store.exists(ColumnFamily::Blocks, b"k1").unwrap());
        assert!(!store.exists(ColumnFamily::Blocks, b"missing").unwrap());
    }

    #[test]
    fn column_families_are_isolated() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);

        store
            .write_batch(vec![BatchOperation::put(ColumnFamily::Blocks, b"k".to_vec(), b"block-value".to_vec())])
            .unwrap();

        assert_eq!(store.get(ColumnFamily::Metadata, b"k").unwrap(), None);
    }

    #[test]
    fn batch_write_is_atomic_in_shape() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);

        store
            .write_batch(vec![
                BatchOperation::put(ColumnFamily::Blocks, b"a".to_vec(), b"1".to_vec()),
                BatchOperation::put(ColumnFamily::Blocks, b"b".to_vec(), b"2".to_vec()),
            ])
            .unwrap();

        assert!(store.exists(ColumnFamily::Blocks, b"a").unwrap());
        assert!(store.exists(ColumnFamily::Blocks, b"b").unwrap());
    }

    #[test]
    fn scan_from_respects_limit_and_order() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);

        store
            .write_batch(vec![
                BatchOperation::put(ColumnFamily::HeightIndex, 1u64.to_be_bytes().to_vec(), b"h1".to_vec()),
                BatchOperation::put(ColumnFamily::HeightIndex, 2u64.to_be_bytes().to_vec(), b"h2".to_vec()),
                BatchOperation::put(ColumnFamily::HeightIndex, 3u64.to_be_bytes().to_vec(), b"h3".to_vec()),
            ])
            .unwrap();

        let results = store
            .scan_from(ColumnFamily::HeightIndex, &1u64.to_be_bytes(), 2)
            .unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].1, b"h1");
        assert_eq!(results[1].1, b"h2");
    }
}
