//! Service layer: concrete implementations of the inbound ports.

mod ingestion;
mod reorg;

pub use ingestion::{BlockIngestionService, StorageParentLookup};
pub use reorg::ReorgEngineService;
