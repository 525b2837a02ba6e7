//! `BlockValidator` (C4): stateless header and body checks.

use chain_types::{merkle_root, BlockHeader, Hash, Tx, ValidationError};

use crate::domain::{DifficultyAdjuster, DifficultyAnchor, NetworkParams, ValidationContext};
use crate::ports::inbound::BlockValidator as BlockValidatorPort;
use crate::ports::outbound::{PowVerifier, TimeSource};

/// Resolves a header by hash, either from storage or from an in-flight
/// sync batch not yet persisted. Looked up by hash rather than height so
/// a non-canonical fork ancestor is found just as reliably as a
/// canonical one.
pub trait ParentLookup: Send + Sync {
    fn header_by_hash(&self, hash: &Hash) -> Option<BlockHeader>;
}

/// Concrete [`BlockValidatorPort`]. Depends on a [`PowVerifier`] (the
/// actual digest algorithm is out of scope) and a [`TimeSource`]
/// (injectable so tests don't race the wall clock).
pub struct BlockValidatorService<P, T, L> {
    params: NetworkParams,
    pow: P,
    time: T,
    parents: L,
}

impl<P, T, L> BlockValidatorService<P, T, L>
where
    P: PowVerifier,
    T: TimeSource,
    L: ParentLookup,
{
    pub fn new(params: NetworkParams, pow: P, time: T, parents: L) -> Self {
        Self { params, pow, time, parents }
    }
}

impl<P, T, L> BlockValidatorPort for BlockValidatorService<P, T, L>
where
    P: PowVerifier,
    T: TimeSource,
    L: ParentLookup,
{
    fn validate_header(&self, header: &BlockHeader, context: &ValidationContext) -> Result<(), ValidationError> {
        let size = header.size();
        if size > self.params.max_header_size_at(header.height) {
            return Err(ValidationError::InvalidHeader(format!(
                "header size {size} exceeds cap {}",
                self.params.max_header_size_at(header.height)
            )));
        }

        let parent = if header.height == 0 {
            None
        } else {
            // A same-batch predecessor may not be in storage yet; its hash
            // alone is enough to confirm linkage, but the full header
            // (needed below for timestamp/difficulty) still has to come
            // from `parents`.
            if let Some(expected) = context.hash_at(header.height - 1) {
                if expected != header.previous_hash {
                    return Err(ValidationError::InvalidLinkage);
                }
            }
            match self.parents.header_by_hash(&header.previous_hash) {
                Some(parent) if parent.height + 1 == header.height => Some(parent),
                Some(_) => return Err(ValidationError::InvalidLinkage),
                None => {
                    return Err(ValidationError::InvalidHeader(
                        "previous_hash does not reference a known block".to_string(),
                    ));
                }
            }
        };

        if !self.pow.satisfies_target(header) {
            return Err(ValidationError::InvalidPoW);
        }

        let now = self.time.now_ms();
        if header.timestamp > now + self.params.clock_skew {
            return Err(ValidationError::InvalidHeader(format!(
                "timestamp {} exceeds now+skew {}",
                header.timestamp,
                now + self.params.clock_skew
            )));
        }

        if let Some(parent) = parent {
            if header.timestamp <= parent.timestamp {
                return Err(ValidationError::InvalidHeader(
                    "timestamp does not exceed parent's".to_string(),
                ));
            }

            let anchor = DifficultyAnchor {
                height: parent.height,
                timestamp: parent.timestamp,
                difficulty: parent.difficulty,
            };
            let adjuster = DifficultyAdjuster::new(self.params.difficulty.clone());
            let expected = adjuster.next_difficulty(&anchor, header.height, header.timestamp);
            if header.difficulty != expected {
                return Err(ValidationError::InvalidDifficulty {
                    expected: expected.to_string(),
                    actual: header.difficulty.to_string(),
                });
            }
        }

        Ok(())
    }

    fn validate_body(&self, header: &BlockHeader, txs: &[Tx]) -> Result<(), ValidationError> {
        if txs.len() > self.params.max_tx_count_at(header.height) {
            return Err(ValidationError::InvalidBody(format!(
                "tx count {} exceeds cap {}",
                txs.len(),
                self.params.max_tx_count_at(header.height)
            )));
        }

        let body_size: usize = txs.iter().map(Tx::size).sum();
        if body_size > self.params.max_block_size_at(header.height) {
            return Err(ValidationError::InvalidBody(format!(
                "body size {body_size} exceeds cap {}",
                self.params.max_block_size_at(header.height)
            )));
        }

        let computed_root = merkle_root(txs.iter().map(Tx::hash));
        if computed_root != header.tx_root_hash {
            return Err(ValidationError::InvalidMerkleRoot);
        }

        for tx in txs {
            if tx.size() > self.params.max_tx_size {
                return Err(ValidationError::InvalidBody(format!(
                    "tx {:?} exceeds max size {}",
                    tx.hash(),
                    self.params.max_tx_size
                )));
            }
            if tx.fee > i64::MAX as u64 {
                return Err(ValidationError::InvalidBody("fee overflows signed range".to_string()));
            }
        }

        Ok(())
    }
}
