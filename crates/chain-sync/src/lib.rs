//! # Chain Sync
//!
//! Header/body download pipeline (C7, `SyncManager`) and wire-request
//! responder (C8, `SyncResponder`) for the chain ingestion engine.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! Drive catch-up sync against the best available peer — locator-based
//! header download, per-batch linkage/PoW validation, pipelined body
//! download, batched persistence through `chain-consensus`'s reorg
//! engine — and answer the same `GetHeaders`/`GetBlockBodies` requests
//! on behalf of peers syncing from us. Also handles unsolicited
//! single-header broadcasts from already-connected peers.
//!
//! ## Module Structure
//!
//! ```text
//! chain-sync/
//! ├── domain/          # SyncManagerError, protocol constants, ChainTip/SyncResult
//! ├── algorithms/       # Batch-internal header continuity checking
//! ├── ports/            # SyncManager / SyncResponder traits
//! ├── application/      # SyncManagerService, SyncResponderService
//! └── config.rs         # SyncConfig (poll cadence)
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use algorithms::validate_header_batch;
pub use application::{SyncManagerService, SyncResponderService};
pub use config::SyncConfig;
pub use domain::{
    body_batch_size, pipeline_depth, ChainTip, SyncManagerError, SyncResult, MAX_FRAME_SIZE,
    PERSIST_BATCH_SIZE, REQUEST_TIMEOUT, SYNC_HEADERS_PER_BATCH,
};
pub use ports::{SyncManager, SyncResponder};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
