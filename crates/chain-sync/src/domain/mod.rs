//! Domain layer: the sync driver's own error type and the protocol
//! constants/value objects the rest of the crate builds on.

pub mod errors;
pub mod value_objects;

pub use errors::SyncManagerError;
pub use value_objects::{
    body_batch_size, pipeline_depth, ChainTip, SyncResult, MAX_FRAME_SIZE, PERSIST_BATCH_SIZE,
    REQUEST_TIMEOUT, SYNC_HEADERS_PER_BATCH,
};
