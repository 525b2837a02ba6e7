//! `PeerRegistry`: the external interface the sync/ingestion core consumes.

use std::sync::Arc;
use std::time::Duration;

use chain_types::Height;

use crate::domain::{BanReason, PeerId};
use crate::ports::outbound::Peer;

pub trait PeerRegistry: Send + Sync {
    /// Register a newly connected peer, replacing any prior handle with
    /// the same id.
    fn register(&self, peer: Arc<dyn Peer>);

    fn unregister(&self, id: &PeerId);

    /// Look up a specific connected peer by id, e.g. to act on the
    /// sender of an unsolicited broadcast.
    fn peer(&self, id: &PeerId) -> Option<Arc<dyn Peer>>;

    /// Highest-advertised-height connected, unbanned peer above
    /// `local_height`, or `None` if we're already caught up with everyone.
    fn best_sync_candidate(&self, local_height: Height) -> Option<Arc<dyn Peer>>;

    /// Up to `k` unbanned peers (excluding `exclude`), highest reputation
    /// first, for broadcast fan-out.
    fn best_peers(&self, k: usize, exclude: &[PeerId]) -> Vec<Arc<dyn Peer>>;

    fn record_success(&self, id: PeerId);

    /// Returns `true` if this failure triggered an automatic ban.
    fn record_failure(&self, id: PeerId) -> bool;

    fn ban(&self, id: PeerId, reason: BanReason, duration: Option<Duration>);

    fn is_banned(&self, id: &PeerId) -> bool;
}
