//! # Error Types
//!
//! Error taxonomy shared across subsystems: storage failures, validation
//! rejections, chain-level incompatibility, sync failures, and ingestion
//! outcomes.

use thiserror::Error;

/// Errors raised by the block store (C1) and chain query layer (C2).
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage corruption: {0}")]
    Corruption(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("block not found: {0}")]
    NotFound(String),
}

/// Errors raised while validating a header or block body (C4).
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    #[error("invalid body: {0}")]
    InvalidBody(String),

    #[error("invalid linkage: previous_hash does not match the claimed parent")]
    InvalidLinkage,

    #[error("invalid merkle root: tx_root_hash does not match the block's transactions")]
    InvalidMerkleRoot,

    #[error("invalid proof of work: header hash does not satisfy the target implied by difficulty")]
    InvalidPoW,

    #[error("invalid difficulty: expected {expected}, got {actual}")]
    InvalidDifficulty { expected: String, actual: String },
}

/// Chain-level rejection: the block is individually well-formed but does
/// not fit the chain this node is tracking.
#[derive(Debug, Clone, Error)]
pub enum ChainError {
    #[error("incompatible chain: common ancestor is below the configured finality depth")]
    IncompatibleChain,
}

/// Errors raised by the sync manager (C7) while driving a peer exchange.
#[derive(Debug, Clone, Error)]
pub enum SyncError {
    #[error("sync request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("protocol mismatch: peer responded with an unexpected message kind")]
    ProtocolMismatch,

    #[error("peer returned an empty response to a non-empty request")]
    EmptyResponse,
}

/// The outcome of handing a block to ingestion (C6). Only `Rejected` is a
/// failure; the rest are ordinary control-flow results, so this is a
/// result code rather than an `Error` impl.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestionOutcome {
    /// Extended the current best tip.
    Connected,
    /// Valid and connected to a known ancestor, but not the best chain.
    StoredNoncanon,
    /// Parent not yet known; held in the orphan buffer.
    Buffered,
    /// Already known (duplicate of a stored block or a buffered orphan).
    Ignored,
    /// Connects to a known ancestor but leaves a height gap to the tip.
    GapDetected { missing_from: crate::entities::Height },
    /// Individually well-formed but rejected by validation or chain rules.
    Rejected(String),
}

/// Top-level error aggregating every subsystem's error type, used at
/// crate boundaries that can fail for more than one reason (e.g.
/// `chain-consensus::BlockIngestion::ingest`).
#[derive(Debug, Error)]
pub enum ChainTypeError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Sync(#[from] SyncError),
}
