use chain_types::{Hash, Height, StorageError};

use crate::ports::inbound::{BlockStore, ChainQuery};
use crate::ports::outbound::{ColumnFamily, KeyValueStore};

use super::BlockStoreService;

impl<KV: KeyValueStore> BlockStoreService<KV> {
    fn hash_at_height(&self, height: Height) -> Result<Option<Hash>, StorageError> {
        if let Some(hash) = self.caches.height.get(height) {
            return Ok(Some(hash));
        }
        let Some(bytes) = self.kv.get(ColumnFamily::HeightIndex, &height.to_be_bytes())? else {
            return Ok(None);
        };
        let hash: Hash = bytes
            .try_into()
            .map_err(|_| StorageError::Corruption("malformed height_index value".to_string()))?;
        self.caches.height.insert(height, hash);
        Ok(Some(hash))
    }
}

impl<KV: KeyValueStore> ChainQuery for BlockStoreService<KV> {
    fn canonical_at(&self, hash: &Hash) -> Result<bool, StorageError> {
        let Some(block) = self.get_full(hash)? else {
            return Ok(false);
        };
        Ok(self.hash_at_height(block.height())? == Some(*hash))
    }

    fn locator_hashes(&self) -> Result<Vec<Hash>, StorageError> {
        let Some((tip_height, tip_hash)) = self.caches.latest.get() else {
            return Ok(Vec::new());
        };
        let mut locators = vec![tip_hash];
        if tip_height == 0 {
            return Ok(locators);
        }
        let mut step: u64 = 1;
        let mut height = tip_height;
        let mut subtractions = 0u32;
        loop {
            height = height.saturating_sub(step);
            match self.hash_at_height(height)? {
                Some(hash) => locators.push(hash),
                None => break,
            }
            subtractions += 1;
            if subtractions >= 2 {
                step = step.saturating_mul(2);
            }
            if height == 0 {
                break;
            }
        }
        Ok(locators)
    }

    fn find_common_ancestor(&self, locators: &[Hash]) -> Result<Option<Hash>, StorageError> {
        for hash in locators {
            let Some(block) = self.get_full(hash)? else {
                continue;
            };
            if self.hash_at_height(block.height())? == Some(*hash) {
                return Ok(Some(*hash));
            }
        }
        self.hash_at_height(0)
    }

    fn latest_height(&self) -> Result<Option<Height>, StorageError> {
        Ok(self.caches.latest.get().map(|(height, _)| height))
    }

    fn latest_stored(&self) -> Result<Option<Hash>, StorageError> {
        Ok(self.caches.latest.get().map(|(_, hash)| hash))
    }
}
