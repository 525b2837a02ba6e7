//! Inbound ports: the primary APIs this crate exposes — `BlockValidator`
//! (C4), `ReorgEngine` (C5) and `BlockIngestion` (C6).

use async_trait::async_trait;

use chain_types::{
    Address, Block, BlockHeader, ConnectedSource, Hash, IngestionOutcome, StoredBlock,
    TimestampMs, Tx, ValidationError,
};

use crate::domain::ValidationContext;
use crate::errors::ReorgError;

/// Stateless header/body validation. The only state it consults is the
/// per-batch [`ValidationContext`] the caller builds for a single
/// incoming batch — `BlockValidator` itself holds no chain state.
pub trait BlockValidator: Send + Sync {
    /// Header checks: size caps, linkage, PoW, timestamp monotonicity,
    /// difficulty retarget, coinbase/signature consistency.
    fn validate_header(&self, header: &BlockHeader, context: &ValidationContext) -> Result<(), ValidationError>;

    /// Body checks: merkle root against `header.tx_root_hash`, each tx's
    /// stateless validity.
    fn validate_body(&self, header: &BlockHeader, txs: &[Tx]) -> Result<(), ValidationError>;
}

/// Atomic canonical-chain swap (C5). Every method runs the full
/// `write_batch` -> commit -> drain-cache -> publish-events protocol
/// described in spec section 4.5; callers never observe a state where
/// only part of it happened.
#[async_trait]
pub trait ReorgEngine: Send + Sync {
    /// `old_branch` is empty: `new_branch` extends the current tip
    /// directly. Still goes through the same write-batch path as
    /// [`ReorgEngine::reorg`].
    async fn fast_forward(&self, new_branch: Vec<StoredBlock>) -> Result<(), ReorgError>;

    /// Swap the canonical chain from the current tip to `new_branch`,
    /// which must build on `common_ancestor`. Rejected with
    /// [`ReorgError::NotBetterChain`] if `new_branch`'s cumulative
    /// difficulty does not exceed (or tie-and-postdate) the current tip.
    async fn reorg(&self, common_ancestor: Hash, new_branch: Vec<StoredBlock>) -> Result<(), ReorgError>;
}

/// Single-block admission (C6): the state machine described in spec
/// section 4.6, driving `BlockValidator` and `ReorgEngine` and routing
/// through the orphan buffer.
#[async_trait]
pub trait BlockIngestion: Send + Sync {
    #[allow(clippy::too_many_arguments)]
    async fn process_block(
        &self,
        block: Block,
        source: ConnectedSource,
        received_from: Address,
        received_at: TimestampMs,
        pre_validated: bool,
    ) -> IngestionOutcome;
}
