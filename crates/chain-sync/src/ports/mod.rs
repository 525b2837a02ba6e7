//! Ports layer: the `SyncManager`/`SyncResponder` driving APIs. Driven
//! dependencies (peer I/O, storage, validation, reorg) are consumed
//! directly from `chain-peers`, `chain-storage` and `chain-consensus`
//! rather than re-wrapped in local traits.

pub mod inbound;

pub use inbound::{SyncManager, SyncResponder};
