//! Domain layer: the data and bookkeeping structures `BlockValidator`,
//! `ReorgEngine` and `BlockIngestion` operate over.

pub mod best_tip;
pub mod context;
pub mod difficulty;
pub mod orphan;
pub mod params;

pub use best_tip::{BestTipCache, TipSummary};
pub use context::ValidationContext;
pub use difficulty::{DifficultyAdjuster, DifficultyAnchor, DifficultyParams};
pub use orphan::{Orphan, OrphanBuffer, ORPHAN_CAP, ORPHAN_TTL};
pub use params::NetworkParams;
