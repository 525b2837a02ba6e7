//! Error types owned by this crate: the sync driver's own failure modes,
//! layered on top of `chain_types::{SyncError, ChainError}` and the
//! collaborator errors it calls through to.

use chain_types::{ChainError, StorageError, SyncError, ValidationError};
use thiserror::Error;

/// Failure modes of [`crate::ports::SyncManager::perform_sync`] and
/// [`crate::ports::SyncManager::handle_broadcast_header`].
#[derive(Debug, Error)]
pub enum SyncManagerError {
    /// No peer is both connected and ahead of our local tip.
    #[error("no sync candidate available")]
    NoPeerAvailable,

    #[error(transparent)]
    Peer(#[from] SyncError),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Reorg(#[from] chain_consensus::ReorgError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
