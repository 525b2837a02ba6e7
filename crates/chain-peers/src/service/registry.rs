//! In-memory `PeerRegistry`: a concurrent map of connected peers plus a
//! [`ReputationTracker`] shared across them.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chain_types::Height;
use parking_lot::RwLock;
use tracing::info;

use crate::domain::{BanReason, PeerId, PeerReputationConfig, ReputationTracker};
use crate::ports::{Peer, PeerRegistry};

pub struct InMemoryPeerRegistry {
    peers: RwLock<HashMap<PeerId, Arc<dyn Peer>>>,
    reputation: ReputationTracker,
}

impl InMemoryPeerRegistry {
    pub fn new(config: PeerReputationConfig) -> Self {
        Self { peers: RwLock::new(HashMap::new()), reputation: ReputationTracker::new(config) }
    }
}

impl Default for InMemoryPeerRegistry {
    fn default() -> Self {
        Self::new(PeerReputationConfig::default())
    }
}

impl PeerRegistry for InMemoryPeerRegistry {
    fn register(&self, peer: Arc<dyn Peer>) {
        self.peers.write().insert(peer.id(), peer);
    }

    fn unregister(&self, id: &PeerId) {
        self.peers.write().remove(id);
    }

    fn peer(&self, id: &PeerId) -> Option<Arc<dyn Peer>> {
        self.peers.read().get(id).cloned()
    }

    fn best_sync_candidate(&self, local_height: Height) -> Option<Arc<dyn Peer>> {
        self.peers
            .read()
            .values()
            .filter(|p| !self.reputation.is_banned(&p.id()))
            .filter(|p| p.advertised_height() > local_height)
            .max_by_key(|p| (p.advertised_height(), (self.reputation.score(&p.id()) * 1000.0) as i64))
            .cloned()
    }

    fn best_peers(&self, k: usize, exclude: &[PeerId]) -> Vec<Arc<dyn Peer>> {
        let peers = self.peers.read();
        let mut candidates: Vec<_> = peers
            .values()
            .filter(|p| !exclude.contains(&p.id()))
            .filter(|p| !self.reputation.is_banned(&p.id()))
            .cloned()
            .collect();
        candidates.sort_by(|a, b| {
            self.reputation
                .score(&b.id())
                .partial_cmp(&self.reputation.score(&a.id()))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        candidates.truncate(k);
        candidates
    }

    fn record_success(&self, id: PeerId) {
        self.reputation.record_success(id);
    }

    fn record_failure(&self, id: PeerId) -> bool {
        let banned = self.reputation.record_failure(id);
        if banned {
            info!(peer = ?id, "peer auto-banned after repeated failures");
            if let Some(peer) = self.peers.read().get(&id) {
                peer.disconnect("reputation below auto-ban threshold");
            }
        }
        banned
    }

    fn ban(&self, id: PeerId, reason: BanReason, duration: Option<Duration>) {
        info!(peer = ?id, ?reason, "banning peer");
        self.reputation.ban(id, reason, duration);
        if let Some(peer) = self.peers.read().get(&id) {
            peer.disconnect("banned");
        }
    }

    fn is_banned(&self, id: &PeerId) -> bool {
        self.reputation.is_banned(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chain_types::{BlockHeader, Hash, Tx};
    use std::sync::atomic::{AtomicU64, Ordering};

    use crate::ports::PeerError;

    struct FakePeer {
        id: PeerId,
        height: Height,
        next_request_id: AtomicU64,
    }

    #[async_trait]
    impl Peer for FakePeer {
        fn id(&self) -> PeerId {
            self.id
        }
        fn advertised_height(&self) -> Height {
            self.height
        }
        fn reserve_request_id(&self) -> u64 {
            self.next_request_id.fetch_add(1, Ordering::Relaxed)
        }
        async fn send_get_headers(
            &self,
            _locators: Vec<Hash>,
            _stop: Option<Hash>,
            _limit: u32,
        ) -> Result<Vec<BlockHeader>, PeerError> {
            Ok(Vec::new())
        }
        async fn send_get_block_bodies(&self, _hashes: Vec<Hash>) -> Result<Vec<Vec<Tx>>, PeerError> {
            Ok(Vec::new())
        }
        fn disconnect(&self, _reason: &str) {}
    }

    fn peer(id: u8, height: Height) -> Arc<dyn Peer> {
        Arc::new(FakePeer { id: [id; 20], height, next_request_id: AtomicU64::new(0) })
    }

    #[test]
    fn best_sync_candidate_picks_highest_height_above_local() {
        let registry = InMemoryPeerRegistry::default();
        registry.register(peer(1, 10));
        registry.register(peer(2, 50));
        registry.register(peer(3, 5));

        let candidate = registry.best_sync_candidate(20).unwrap();
        assert_eq!(candidate.id(), [2u8; 20]);
    }

    #[test]
    fn best_sync_candidate_none_when_caught_up() {
        let registry = InMemoryPeerRegistry::default();
        registry.register(peer(1, 10));
        assert!(registry.best_sync_candidate(10).is_none());
    }

    #[test]
    fn banned_peer_is_excluded_from_sync_candidates() {
        let registry = InMemoryPeerRegistry::default();
        registry.register(peer(1, 50));
        registry.ban([1u8; 20], BanReason::IncompatibleChain, None);
        assert!(registry.best_sync_candidate(10).is_none());
    }

    #[test]
    fn repeated_failures_auto_ban_via_registry() {
        let registry = InMemoryPeerRegistry::default();
        registry.register(peer(9, 50));
        let mut banned = false;
        for _ in 0..10 {
            banned = registry.record_failure([9u8; 20]);
        }
        assert!(banned);
        assert!(registry.is_banned(&[9u8; 20]));
    }

    #[test]
    fn best_peers_excludes_named_ids() {
        let registry = InMemoryPeerRegistry::default();
        registry.register(peer(1, 10));
        registry.register(peer(2, 10));
        let picked = registry.best_peers(5, &[[1u8; 20]]);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].id(), [2u8; 20]);
    }

    #[test]
    fn peer_lookup_by_id() {
        let registry = InMemoryPeerRegistry::default();
        registry.register(peer(1, 10));
        assert!(registry.peer(&[1u8; 20]).is_some());
        assert!(registry.peer(&[2u8; 20]).is_none());
        registry.unregister(&[1u8; 20]);
        assert!(registry.peer(&[1u8; 20]).is_none());
    }
}
