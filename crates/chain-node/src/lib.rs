//! # Chain Node Library
//!
//! Exposes the node's internal modules (config, genesis, adapters,
//! wiring) for integration testing. `main.rs` is the actual entry point.

pub mod adapters;
pub mod container;
pub mod genesis;
pub mod wiring;
