//! Sync-protocol constants and the small value types the sync driver
//! passes around between its own steps and back out to callers.

use chain_types::{Hash, Height};
use serde::{Deserialize, Serialize};

/// Headers requested per `GetHeaders` round during active sync.
pub const SYNC_HEADERS_PER_BATCH: u32 = 1000;

/// Downloaded blocks accumulated before each `reorg`/`fast_forward` call.
pub const PERSIST_BATCH_SIZE: usize = 250;

/// How long a single peer request may take before it's treated as a
/// [`chain_types::SyncError::Timeout`].
pub const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(20);

/// Assumed upper bound on a single wire frame, used to size body batches
/// so a `GetBlockBodies` response can't itself exceed the frame limit.
pub const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Number of blocks to request per `GetBlockBodies` call, sized so that
/// `body_batch_size * max_block_size` comfortably fits in one frame.
///
/// `floor(0.85 * MAX_FRAME_SIZE / max_block_size)`, clamped to at least 1.
pub fn body_batch_size(max_block_size: usize) -> usize {
    if max_block_size == 0 {
        return 1;
    }
    let budget = (MAX_FRAME_SIZE as f64 * 0.85) as usize;
    (budget / max_block_size).max(1)
}

/// In-flight `GetBlockBodies` requests to keep outstanding at once during
/// body download, so the peer link stays saturated without unbounded
/// memory growth from buffering too many pending responses.
///
/// `clamp(3 + body_batch_size / 2, 3, 8)`.
pub fn pipeline_depth(body_batch_size: usize) -> usize {
    (3 + body_batch_size / 2).clamp(3, 8)
}

/// Current chain tip as reported by a peer or produced locally after a
/// sync round.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChainTip {
    pub hash: Hash,
    pub height: Height,
}

impl ChainTip {
    pub fn new(hash: Hash, height: Height) -> Self {
        Self { hash, height }
    }
}

/// Outcome of one `perform_sync` round.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncResult {
    pub success: bool,
    pub headers_synced: u64,
    pub blocks_persisted: u64,
    pub tip: ChainTip,
    pub duration_ms: u64,
}

impl SyncResult {
    pub fn success(headers_synced: u64, blocks_persisted: u64, tip: ChainTip, duration_ms: u64) -> Self {
        Self { success: true, headers_synced, blocks_persisted, tip, duration_ms }
    }

    pub fn failed(tip: ChainTip, duration_ms: u64) -> Self {
        Self { success: false, headers_synced: 0, blocks_persisted: 0, tip, duration_ms }
    }

    /// Already at the peer's reported tip; nothing to do this round.
    pub fn already_synced(tip: ChainTip) -> Self {
        Self { success: true, headers_synced: 0, blocks_persisted: 0, tip, duration_ms: 0 }
    }
}
