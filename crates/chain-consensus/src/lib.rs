//! # Chain Consensus
//!
//! Block validation, atomic reorgs and single-block ingestion for the
//! chain ingestion engine: `BlockValidator` (C4), `ReorgEngine` (C5) and
//! `BlockIngestion` (C6).
//!
//! ## Crate structure (hexagonal architecture)
//!
//! - `domain/` - the difficulty adjuster, orphan buffer, best-tip cache,
//!   network parameters and the per-batch validation context
//! - `ports/` - the `BlockValidator`/`ReorgEngine`/`BlockIngestion`
//!   driving ports and the `PowVerifier`/`TimeSource` driven ports
//! - `service/` - `BlockValidatorService`, `ReorgEngineService` and
//!   `BlockIngestionService`, the concrete implementations
//!
//! `BlockValidator` is the only piece that is genuinely stateless: it
//! consults only a caller-supplied [`domain::ValidationContext`].
//! `ReorgEngine` and `BlockIngestion` both hold shared handles onto
//! `chain-storage`'s `BlockStore`/`ChainQuery` and `chain-bus`'s
//! `EventPublisher`.

pub mod domain;
pub mod errors;
pub mod ports;
pub mod service;
pub mod validation;

pub use domain::{
    BestTipCache, DifficultyAdjuster, DifficultyAnchor, DifficultyParams, NetworkParams, Orphan,
    OrphanBuffer, TipSummary, ValidationContext, ORPHAN_CAP, ORPHAN_TTL,
};
pub use errors::ReorgError;
pub use ports::{
    BlockIngestion, BlockValidator, PowVerifier, ReorgEngine, StubPowVerifier, SystemTimeSource,
    TimeSource,
};
pub use service::{BlockIngestionService, ReorgEngineService, StorageParentLookup};
pub use validation::{BlockValidatorService, ParentLookup};
