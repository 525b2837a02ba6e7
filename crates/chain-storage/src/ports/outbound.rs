//! Outbound ports: the dependencies the block store requires from the host.
//!
//! The store is laid out over a single embedded key-value store partitioned
//! into four column families (`blocks`, `height_index`, `tx_index`,
//! `metadata`). A column-family-aware `KeyValueStore` is the only outbound
//! dependency; `chain-node` supplies the production RocksDB adapter, this
//! crate supplies an in-memory one for tests and light usage.

use chain_types::StorageError;

/// The four column families the block store partitions its data into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnFamily {
    /// key = block hash (32 B), value = encoded `StoredBlock`.
    Blocks,
    /// key = big-endian u64 height, value = canonical block hash.
    HeightIndex,
    /// key = tx hash, value = block hash containing it.
    TxIndex,
    /// keyed singletons: `LATEST_BLOCK_HASH`, schema version, etc.
    Metadata,
}

impl ColumnFamily {
    pub const ALL: [ColumnFamily; 4] = [
        ColumnFamily::Blocks,
        ColumnFamily::HeightIndex,
        ColumnFamily::TxIndex,
        ColumnFamily::Metadata,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ColumnFamily::Blocks => "blocks",
            ColumnFamily::HeightIndex => "height_index",
            ColumnFamily::TxIndex => "tx_index",
            ColumnFamily::Metadata => "metadata",
        }
    }
}

/// Metadata singleton key: the current canonical tip hash.
pub const METADATA_LATEST_BLOCK_HASH: &[u8] = b"LATEST_BLOCK_HASH";
/// Metadata singleton key: the storage schema version.
pub const METADATA_SCHEMA_VERSION: &[u8] = b"SCHEMA_VERSION";

/// Abstract interface for the embedded key-value database.
///
/// Production: a RocksDB adapter with one real column family per
/// [`ColumnFamily`] (owned by `chain-node`). Testing: [`InMemoryKVStore`].
pub trait KeyValueStore: Send + Sync {
    /// Point read within a column family.
    fn get(&self, cf: ColumnFamily, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError>;

    /// Presence check without decoding the value.
    fn exists(&self, cf: ColumnFamily, key: &[u8]) -> Result<bool, StorageError>;

    /// Iterate a column family in key order starting at `from` (inclusive),
    /// yielding at most `limit` entries.
    fn scan_from(
        &self,
        cf: ColumnFamily,
        from: &[u8],
        limit: usize,
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StorageError>;

    /// Execute an atomic batch write: either every operation lands, or none
    /// do. Durability must be fsync-equivalent before this returns.
    fn write_batch(&self, operations: Vec<BatchOperation>) -> Result<(), StorageError>;
}

/// A single put/delete within a [`ColumnFamily`], queued by a write batch.
#[derive(Debug, Clone)]
pub enum BatchOperation {
    Put {
        cf: ColumnFamily,
        key: Vec<u8>,
        value: Vec<u8>,
    },
    Delete {
        cf: ColumnFamily,
        key: Vec<u8>,
    },
}

impl BatchOperation {
    pub fn put(cf: ColumnFamily, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        BatchOperation::Put {
            cf,
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn delete(cf: ColumnFamily, key: impl Into<Vec<u8>>) -> Self {
        BatchOperation::Delete {
            cf,
            key: key.into(),
        }
    }
}

/// In-memory key-value store used by tests and by light/dev node profiles
/// that don't want to link RocksDB.
#[derive(Default)]
pub struct InMemoryKVStore {
    data: std::sync::RwLock<std::collections::HashMap<ColumnFamily, std::collections::BTreeMap<Vec<u8>, Vec<u8>>>>,
}

impl InMemoryKVStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for InMemoryKVStore {
    fn get(&self, cf: ColumnFamily, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self
            .data
            .read()
            .unwrap()
            .get(&cf)
            .and_then(|m| m.get(key).cloned()))
    }

    fn exists(&self, cf: ColumnFamily, key: &[u8]) -> Result<bool, StorageError> {
        Ok(self
            .data
            .read()
            .unwrap()
            .get(&cf)
            .map(|m| m.contains_key(key))
            .unwrap_or(false))
    }

    fn scan_from(
        &self,
        cf: ColumnFamily,
        from: &[u8],
        limit: usize,
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StorageError> {
        let guard = self.data.read().unwrap();
        let Some(map) = guard.get(&cf) else {
            return Ok(Vec::new());
        };
        Ok(map
            .range(from.to_vec()..)
            .take(limit)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn write_batch(&self, operations: Vec<BatchOperation>) -> Result<(), StorageError> {
        let mut guard = self.data.write().unwrap();
        for op in operations {
            match op {
                BatchOperation::Put { cf, key, value } => {
                    guard.entry(cf).or_default().insert(key, value);
                }
                BatchOperation::Delete { cf, key } => {
                    if let Some(m) = guard.get_mut(&cf) {
                        m.remove(&key);
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get() {
        let store = InMemoryKVStore::new();
        store
            .write_batch(vec![BatchOperation::put(
                ColumnFamily::Blocks,
                b"h1".to_vec(),
                b"block-bytes".to_vec(),
            )])
            .unwrap();
        assert_eq!(
            store.get(ColumnFamily::Blocks, b"h1").unwrap(),
            Some(b"block-bytes".to_vec())
        );
        assert!(store.exists(ColumnFamily::Blocks, b"h1").unwrap());
        assert!(!store.exists(ColumnFamily::HeightIndex, b"h1").unwrap());
    }

    #[test]
    fn batch_is_all_or_nothing_in_shape() {
        let store = InMemoryKVStore::new();
        store
            .write_batch(vec![
                BatchOperation::put(ColumnFamily::Blocks, b"a".to_vec(), b"1".to_vec()),
                BatchOperation::put(ColumnFamily::HeightIndex, b"\x00".to_vec(), b"a".to_vec()),
            ])
            .unwrap();
        assert!(store.exists(ColumnFamily::Blocks, b"a").unwrap());
        assert!(store.exists(ColumnFamily::HeightIndex, b"\x00").unwrap());
    }

    #[test]
    fn scan_from_respects_order_and_limit() {
        let store = InMemoryKVStore::new();
        store
            .write_batch(vec![
                BatchOperation::put(ColumnFamily::HeightIndex, 0u64.to_be_bytes().to_vec(), b"g".to_vec()),
                BatchOperation::put(ColumnFamily::HeightIndex, 1u64.to_be_bytes().to_vec(), b"h1".to_vec()),
                BatchOperation::put(ColumnFamily::HeightIndex, 2u64.to_be_bytes().to_vec(), b"h2".to_vec()),
            ])
            .unwrap();
        let scanned = store
            .scan_from(ColumnFamily::HeightIndex, &1u64.to_be_bytes(), 10)
            .unwrap();
        assert_eq!(scanned.len(), 2);
        assert_eq!(scanned[0].1, b"h1".to_vec());
        assert_eq!(scanned[1].1, b"h2".to_vec());
    }

    #[test]
    fn delete_removes_entry() {
        let store = InMemoryKVStore::new();
        store
            .write_batch(vec![BatchOperation::put(ColumnFamily::Metadata, b"k".to_vec(), b"v".to_vec())])
            .unwrap();
        store
            .write_batch(vec![BatchOperation::delete(ColumnFamily::Metadata, b"k".to_vec())])
            .unwrap();
        assert_eq!(store.get(ColumnFamily::Metadata, b"k").unwrap(), None);
    }
}
