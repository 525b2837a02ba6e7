//! # Chain Types Crate
//!
//! Domain entities and wire-protocol messages shared by every subsystem
//! crate: hashes, headers, transactions, blocks, the storage wrapper
//! types, and the peer-to-peer message set.
//!
//! ## Design Principles
//!
//! - **Single source of truth**: every crate that needs `Hash`,
//!   `BlockHeader`, `Tx`, or `Block` depends on this crate rather than
//!   redefining them.
//! - **Content addressing**: `BlockHeader` and `Tx` memoize their own
//!   hash once computed, so repeated lookups never rehash.

pub mod entities;
pub mod errors;
pub mod wire;

pub use entities::*;
pub use errors::*;
pub use wire::*;
