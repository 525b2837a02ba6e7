//! Peer reputation: a decaying score plus a ban list, merged into one
//! tracker since both key off the same peer id and the same clock.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::RwLock;

use super::{BanReason, PeerId};

#[derive(Debug, Clone)]
pub struct PeerReputationConfig {
    /// Points added on a successful sync/request round-trip.
    pub success_reward: f64,
    /// Points subtracted on a failed request (timeout, bad response).
    pub failure_penalty: f64,
    /// Score at or below which a peer is auto-banned.
    pub auto_ban_threshold: f64,
    /// How long an auto-ban (as opposed to a manual ban) lasts.
    pub auto_ban_duration: Duration,
}

impl Default for PeerReputationConfig {
    fn default() -> Self {
        Self {
            success_reward: 1.0,
            failure_penalty: -10.0,
            auto_ban_threshold: -50.0,
            auto_ban_duration: Duration::from_secs(3600),
        }
    }
}

struct Entry {
    score: f64,
    banned_until: Option<std::time::Instant>,
}

/// Concurrent score-plus-ban-list tracker, one entry per peer seen so far.
pub struct ReputationTracker {
    config: PeerReputationConfig,
    entries: RwLock<HashMap<PeerId, Entry>>,
}

impl ReputationTracker {
    pub fn new(config: PeerReputationConfig) -> Self {
        Self { config, entries: RwLock::new(HashMap::new()) }
    }

    fn entry<'a>(entries: &'a mut HashMap<PeerId, Entry>, id: PeerId) -> &'a mut Entry {
        entries.entry(id).or_insert(Entry { score: 0.0, banned_until: None })
    }

    pub fn record_success(&self, id: PeerId) {
        let mut entries = self.entries.write();
        Self::entry(&mut entries, id).score += self.config.success_reward;
    }

    /// Returns `true` if this failure pushed the peer's score at or below
    /// the auto-ban threshold, banning it for [`PeerReputationConfig::auto_ban_duration`].
    pub fn record_failure(&self, id: PeerId) -> bool {
        let mut entries = self.entries.write();
        let entry = Self::entry(&mut entries, id);
        entry.score += self.config.failure_penalty;
        if entry.score <= self.config.auto_ban_threshold {
            entry.banned_until = Some(std::time::Instant::now() + self.config.auto_ban_duration);
            return true;
        }
        false
    }

    /// Manual ban with an explicit duration (`None` = until process restart).
    pub fn ban(&self, id: PeerId, _reason: BanReason, duration: Option<Duration>) {
        let mut entries = self.entries.write();
        let entry = Self::entry(&mut entries, id);
        entry.banned_until = Some(
            duration
                .map(|d| std::time::Instant::now() + d)
                .unwrap_or_else(|| std::time::Instant::now() + Duration::from_secs(u32::MAX as u64)),
        );
    }

    pub fn is_banned(&self, id: &PeerId) -> bool {
        self.entries
            .read()
            .get(id)
            .and_then(|e| e.banned_until)
            .is_some_and(|until| until > std::time::Instant::now())
    }

    pub fn score(&self, id: &PeerId) -> f64 {
        self.entries.read().get(id).map(|e| e.score).unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_raises_score() {
        let tracker = ReputationTracker::new(PeerReputationConfig::default());
        let id = [1u8; 20];
        tracker.record_success(id);
        tracker.record_success(id);
        assert_eq!(tracker.score(&id), 2.0);
    }

    #[test]
    fn repeated_failures_auto_ban() {
        let tracker = ReputationTracker::new(PeerReputationConfig::default());
        let id = [2u8; 20];
        let mut banned = false;
        for _ in 0..6 {
            banned = tracker.record_failure(id);
        }
        assert!(banned);
        assert!(tracker.is_banned(&id));
    }

    #[test]
    fn manual_ban_is_immediate() {
        let tracker = ReputationTracker::new(PeerReputationConfig::default());
        let id = [3u8; 20];
        assert!(!tracker.is_banned(&id));
        tracker.ban(id, BanReason::IncompatibleChain, Some(Duration::from_secs(60)));
        assert!(tracker.is_banned(&id));
    }
}
