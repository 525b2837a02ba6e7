//! The per-batch linkage context `BlockValidator` consults alongside
//! the canonical chain, so headers within one incoming batch can
//! reference each other before any of them are persisted.

use std::collections::HashMap;

use chain_types::{Hash, Height};

#[derive(Default, Debug, Clone)]
pub struct ValidationContext {
    height_to_hash: HashMap<Height, Hash>,
}

impl ValidationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, height: Height, hash: Hash) {
        self.height_to_hash.insert(height, hash);
    }

    pub fn hash_at(&self, height: Height) -> Option<Hash> {
        self.height_to_hash.get(&height).copied()
    }
}
