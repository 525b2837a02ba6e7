//! Error types owned by this crate rather than `chain_types`: decisions
//! specific to the reorg/ingestion state machines, not shared data.

use chain_types::StorageError;
use thiserror::Error;

/// Failure modes of [`crate::ports::inbound::ReorgEngine`].
#[derive(Debug, Error)]
pub enum ReorgError {
    /// The candidate branch is not strictly better (or equal-and-newer)
    /// than the current tip.
    #[error("candidate branch does not exceed the current tip's cumulative difficulty")]
    NotBetterChain,

    #[error(transparent)]
    Storage(#[from] StorageError),
}
