//! Inbound ports: the primary APIs this crate exposes — `SyncManager`
//! (C7), the node's own sync driver, and `SyncResponder` (C8), its
//! mirror image answering the same wire requests on behalf of peers
//! syncing from us.

use async_trait::async_trait;

use chain_peers::PeerId;
use chain_types::{BlockHeader, Hash, Tx};

use crate::domain::{ChainTip, SyncManagerError, SyncResult};

/// Drives header/body download from peers and keeps the local chain
/// caught up. One `perform_sync` call is one locator round-trip plus
/// however many header/body batches it takes to catch up to the peer's
/// advertised tip at the time the round started.
#[async_trait]
pub trait SyncManager: Send + Sync {
    /// Pick a sync candidate via the peer registry and drive it through
    /// header download, header validation and body download/persist
    /// until the local tip reaches (or the peer disconnects before) the
    /// candidate's advertised height at round start.
    async fn perform_sync(&self) -> Result<SyncResult, SyncManagerError>;

    /// Handle an unsolicited single-header broadcast (`request_id == 0`):
    /// dedup against storage/the orphan buffer/in-flight broadcast
    /// downloads, then either ingest directly (small height lag) or
    /// fetch the one missing body and ingest that.
    async fn handle_broadcast_header(
        &self,
        from: PeerId,
        header: BlockHeader,
    ) -> Result<(), SyncManagerError>;

    fn is_synced(&self) -> bool;

    /// Current local tip, independent of any peer's view.
    fn local_tip(&self) -> ChainTip;
}

/// Answers the wire requests a peer syncing from us would send: the
/// mirror image of what [`SyncManager`] issues.
pub trait SyncResponder: Send + Sync {
    /// Resolve `locators` to a common ancestor and return up to
    /// `min(limit, 2000)` headers immediately following it, bounded by
    /// `stop` and by our own tip.
    fn get_headers(
        &self,
        locators: Vec<Hash>,
        stop: Option<Hash>,
        limit: u32,
    ) -> Result<Vec<BlockHeader>, SyncManagerError>;

    /// Resolve each hash to its full block's transactions, preserving
    /// request order; a hash we don't have yields an empty `Vec` at that
    /// position rather than shortening the response.
    fn get_block_bodies(&self, hashes: Vec<Hash>) -> Result<Vec<Vec<Tx>>, SyncManagerError>;
}
