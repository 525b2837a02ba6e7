//! Network parameters consumed by `BlockValidator`.
//!
//! Modeled per the design note on global singletons: an immutable
//! bundle loaded once from the genesis document and passed by
//! reference, with fork-activation queries as pure functions of
//! `(params, height)` rather than mutable state anyone has to thread
//! through a constructor.

use chain_types::{Height, TimestampMs};

use super::difficulty::DifficultyParams;

#[derive(Clone, Debug)]
pub struct NetworkParams {
    pub max_header_size: usize,
    pub max_tx_count: usize,
    pub max_block_size: usize,
    pub max_tx_size: usize,
    pub clock_skew: TimestampMs,
    pub difficulty: DifficultyParams,
}

impl NetworkParams {
    /// Header size cap. A single constant today; kept as a function of
    /// height so a future fork can raise it without touching callers.
    pub fn max_header_size_at(&self, _height: Height) -> usize {
        self.max_header_size
    }

    pub fn max_tx_count_at(&self, _height: Height) -> usize {
        self.max_tx_count
    }

    pub fn max_block_size_at(&self, _height: Height) -> usize {
        self.max_block_size
    }
}
