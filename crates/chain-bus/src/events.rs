//! # Chain Events
//!
//! Every event the chain-ingestion core publishes to the in-process bus
//! (C10). Consumers include projections, webhooks, and (indirectly) the
//! metrics registry in `chain-telemetry`.

use chain_types::{Address, Block, CumulativeDifficulty, Hash, Tx};
use serde::{Deserialize, Serialize};

/// All events that can be published to the event bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ChainEvent {
    /// A block was connected to the canonical chain — either extending
    /// the tip directly or as part of a reorg's "connect" side.
    BlockConnected {
        block: Block,
        cumulative_difficulty: CumulativeDifficulty,
        total_fees: u64,
        block_reward: u64,
        /// Sub-events the execution layer attaches (token transfers,
        /// governance votes, …); opaque to the ingestion core.
        events: Vec<serde_json::Value>,
    },

    /// A block was disconnected from the canonical chain during a reorg.
    BlockDisconnected { block: Block },

    /// This node produced (mined) a block locally.
    BlockMined { block: Block },

    /// A transaction was admitted to the mempool.
    MempoolTxAdded { tx: Tx },

    /// A transaction left the mempool (mined, evicted, or expired).
    MempoolTxRemoved { tx_hash: Hash },

    /// A peer announced a new full block or header (unsolicited wire
    /// broadcast, surfaced on the bus for projections that want raw
    /// network visibility).
    PeerAnnouncedBlock { from: Address, block_hash: Hash },

    /// A block was rejected during validation.
    BlockRejected { hash: Hash, reason: String },
}

impl ChainEvent {
    /// Topic for filtering.
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::BlockConnected { .. } => EventTopic::Connected,
            Self::BlockDisconnected { .. } => EventTopic::Disconnected,
            Self::BlockMined { .. } => EventTopic::Mined,
            Self::MempoolTxAdded { .. } | Self::MempoolTxRemoved { .. } => EventTopic::Mempool,
            Self::PeerAnnouncedBlock { .. } => EventTopic::Peer,
            Self::BlockRejected { .. } => EventTopic::Rejected,
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    Connected,
    Disconnected,
    Mined,
    Mempool,
    Peer,
    Rejected,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
}

impl EventFilter {
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self { topics }
    }

    #[must_use]
    pub fn matches(&self, event: &ChainEvent) -> bool {
        self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_rejected() -> ChainEvent {
        ChainEvent::BlockRejected {
            hash: [0u8; 32],
            reason: "bad pow".into(),
        }
    }

    #[test]
    fn filter_all_matches_everything() {
        let filter = EventFilter::all();
        assert!(filter.matches(&sample_rejected()));
    }

    #[test]
    fn filter_by_topic() {
        let filter = EventFilter::topics(vec![EventTopic::Connected]);
        assert!(!filter.matches(&sample_rejected()));

        let mempool_removed = ChainEvent::MempoolTxRemoved { tx_hash: [1u8; 32] };
        let mempool_filter = EventFilter::topics(vec![EventTopic::Mempool]);
        assert!(mempool_filter.matches(&mempool_removed));
    }
}
