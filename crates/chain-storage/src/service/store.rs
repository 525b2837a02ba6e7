use chain_types::{BlockHeader, Hash, Height, StorageError, StoredBlock};

use crate::ports::inbound::{BlockStore, WriteBatch};
use crate::ports::outbound::{BatchOperation, ColumnFamily, KeyValueStore, METADATA_LATEST_BLOCK_HASH};

use super::BlockStoreService;

fn height_key(height: Height) -> Vec<u8> {
    height.to_be_bytes().to_vec()
}

fn decode_block(bytes: &[u8]) -> Result<StoredBlock, StorageError> {
    bincode::deserialize(bytes).map_err(|e| StorageError::Corruption(e.to_string()))
}

fn encode_block(block: &StoredBlock) -> Result<Vec<u8>, StorageError> {
    bincode::serialize(block).map_err(|e| StorageError::Serialization(e.to_string()))
}

impl<KV: KeyValueStore> BlockStoreService<KV> {
    fn fetch_full(&self, hash: &Hash) -> Result<Option<StoredBlock>, StorageError> {
        if let Some(cached) = self.caches.full.get(hash) {
            return Ok(Some(cached));
        }
        let Some(bytes) = self.kv.get(ColumnFamily::Blocks, hash)? else {
            return Ok(None);
        };
        let block = decode_block(&bytes)?;
        self.caches.full.insert(*hash, block.clone());
        self.caches.header.insert(*hash, block.block.header.clone());
        Ok(Some(block))
    }
}

impl<KV: KeyValueStore> BlockStore for BlockStoreService<KV> {
    fn get_full(&self, hash: &Hash) -> Result<Option<StoredBlock>, StorageError> {
        self.fetch_full(hash)
    }

    fn get_header(&self, hash: &Hash) -> Result<Option<BlockHeader>, StorageError> {
        if let Some(header) = self.caches.header.get(hash) {
            return Ok(Some(header));
        }
        if let Some(full) = self.caches.full.get(hash) {
            let header = full.block.header.clone();
            self.caches.header.insert(*hash, header.clone());
            return Ok(Some(header));
        }
        // The serializer has no columnar layout to skip the tx bytes with,
        // so the header path decodes the full block and discards the body.
        let Some(bytes) = self.kv.get(ColumnFamily::Blocks, hash)? else {
            return Ok(None);
        };
        let block = decode_block(&bytes)?;
        let header = block.block.header.clone();
        self.caches.header.insert(*hash, header.clone());
        Ok(Some(header))
    }

    fn multi_get_full(&self, hashes: &[Hash]) -> Result<Vec<Option<StoredBlock>>, StorageError> {
        hashes.iter().map(|h| self.fetch_full(h)).collect()
    }

    fn multi_get_header(&self, hashes: &[Hash]) -> Result<Vec<Option<BlockHeader>>, StorageError> {
        hashes.iter().map(|h| self.get_header(h)).collect()
    }

    fn height_range(&self, from: Height, to: Height) -> Result<Vec<StoredBlock>, StorageError> {
        if to < from {
            return Ok(Vec::new());
        }
        let span = (to - from + 1).min(self.config.max_range_size);
        let entries = self
            .kv
            .scan_from(ColumnFamily::HeightIndex, &height_key(from), span as usize)?;
        let mut out = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            let height = Height::from_be_bytes(key.try_into().map_err(|_| {
                StorageError::Corruption("malformed height_index key".to_string())
            })?);
            if height > to {
                break;
            }
            let hash: Hash = value
                .try_into()
                .map_err(|_| StorageError::Corruption("malformed height_index value".to_string()))?;
            self.caches.height.insert(height, hash);
            if let Some(block) = self.fetch_full(&hash)? {
                out.push(block);
            }
        }
        Ok(out)
    }

    fn header_range(&self, from: Height, to: Height) -> Result<Vec<BlockHeader>, StorageError> {
        self.height_range(from, to)
            .map(|blocks| blocks.into_iter().map(|b| b.block.header).collect())
    }

    fn exists(&self, hash: &Hash) -> Result<bool, StorageError> {
        if self.caches.full.get(hash).is_some() || self.caches.header.get(hash).is_some() {
            return Ok(true);
        }
        self.kv.exists(ColumnFamily::Blocks, hash)
    }

    fn block_hash_for_tx(&self, tx_hash: &Hash) -> Result<Option<Hash>, StorageError> {
        let Some(bytes) = self.kv.get(ColumnFamily::TxIndex, tx_hash)? else {
            return Ok(None);
        };
        let hash: Hash = bytes
            .try_into()
            .map_err(|_| StorageError::Corruption("malformed tx_index value".to_string()))?;
        Ok(Some(hash))
    }

    fn get_tx(&self, tx_hash: &Hash) -> Result<Option<chain_types::Tx>, StorageError> {
        if let Some(tx) = self.caches.tx.get(tx_hash) {
            return Ok(Some(tx));
        }
        let Some(block_hash) = self.block_hash_for_tx(tx_hash)? else {
            return Ok(None);
        };
        let Some(block) = self.fetch_full(&block_hash)? else {
            return Ok(None);
        };
        let Some(position) = block.tx_position(tx_hash) else {
            return Ok(None);
        };
        let tx = block.block.txs.get(position as usize).cloned();
        if let Some(tx) = &tx {
            self.caches.tx.insert(*tx_hash, tx.clone());
        }
        Ok(tx)
    }

    fn write_batch<F>(&self, op: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut dyn WriteBatch) -> Result<(), StorageError>,
    {
        let mut batch = BatchHandle::default();
        op(&mut batch)?;
        self.kv.write_batch(batch.ops)?;
        for effect in batch.post_commit {
            effect.apply(&self.caches);
        }
        Ok(())
    }
}

/// Deferred cache effect, applied only after the underlying write batch
/// commits successfully — readers never observe a torn state.
enum CacheEffect {
    InsertFull(Hash, StoredBlock),
    InvalidateHeader(Hash),
    InsertHeight(Height, Hash),
    InvalidateHeight(Height),
    SetLatest(Height, Hash),
}

impl CacheEffect {
    fn apply(self, caches: &crate::domain::caches::StorageCaches) {
        match self {
            CacheEffect::InsertFull(hash, block) => caches.full.insert(hash, block),
            CacheEffect::InvalidateHeader(hash) => caches.header.invalidate(&hash),
            CacheEffect::InsertHeight(height, hash) => caches.height.insert(height, hash),
            CacheEffect::InvalidateHeight(height) => caches.height.invalidate(height),
            CacheEffect::SetLatest(height, hash) => caches.latest.set(height, hash),
        }
    }
}

#[derive(Default)]
struct BatchHandle {
    ops: Vec<BatchOperation>,
    post_commit: Vec<CacheEffect>,
}

impl WriteBatch for BatchHandle {
    fn save_block(&mut self, block: &StoredBlock) -> Result<(), StorageError> {
        let hash = block.hash();
        let bytes = encode_block(block)?;
        self.ops.push(BatchOperation::put(ColumnFamily::Blocks, hash.to_vec(), bytes));
        for tx_hash in block.tx_hashes() {
            self.ops.push(BatchOperation::put(
                ColumnFamily::TxIndex,
                tx_hash.to_vec(),
                hash.to_vec(),
            ));
        }
        self.post_commit.push(CacheEffect::InsertFull(hash, block.clone()));
        self.post_commit.push(CacheEffect::InvalidateHeader(hash));
        Ok(())
    }

    fn connect_tip(&mut self, height: Height, hash: &Hash) -> Result<(), StorageError> {
        self.ops.push(BatchOperation::put(
            ColumnFamily::HeightIndex,
            height_key(height),
            hash.to_vec(),
        ));
        let metadata = bincode::serialize(&(height, *hash))
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.ops.push(BatchOperation::put(
            ColumnFamily::Metadata,
            METADATA_LATEST_BLOCK_HASH.to_vec(),
            metadata,
        ));
        self.post_commit.push(CacheEffect::InsertHeight(height, *hash));
        self.post_commit.push(CacheEffect::SetLatest(height, *hash));
        Ok(())
    }

    fn disconnect_tip(&mut self, height: Height) -> Result<(), StorageError> {
        self.ops
            .push(BatchOperation::delete(ColumnFamily::HeightIndex, height_key(height)));
        self.post_commit.push(CacheEffect::InvalidateHeight(height));
        Ok(())
    }

    fn remove_height(&mut self, height: Height) -> Result<(), StorageError> {
        self.ops
            .push(BatchOperation::delete(ColumnFamily::HeightIndex, height_key(height)));
        self.post_commit.push(CacheEffect::InvalidateHeight(height));
        Ok(())
    }
}
