//! The `Peer` handle a registry hands out, and a `TimeSource` seam for
//! deterministic ban-expiry tests.

use std::fmt;

use async_trait::async_trait;
use chain_types::{BlockHeader, Hash, Height, Tx};

use crate::domain::PeerId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerError {
    Timeout,
    Disconnected,
    ProtocolViolation(String),
}

impl fmt::Display for PeerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "peer request timed out"),
            Self::Disconnected => write!(f, "peer is disconnected"),
            Self::ProtocolViolation(reason) => write!(f, "protocol violation: {reason}"),
        }
    }
}

impl std::error::Error for PeerError {}

/// A live connection to a remote peer. `chain-sync` drives these methods;
/// the actual framing and transport live in `chain-node`'s wiring.
#[async_trait]
pub trait Peer: Send + Sync {
    fn id(&self) -> PeerId;

    /// Most recently advertised chain height, updated on every `NewHeader`/
    /// `NewBlock` broadcast and handshake.
    fn advertised_height(&self) -> Height;

    /// Strictly monotonic per-peer request id, used to correlate a
    /// response with its request.
    fn reserve_request_id(&self) -> u64;

    async fn send_get_headers(
        &self,
        locators: Vec<Hash>,
        stop: Option<Hash>,
        limit: u32,
    ) -> Result<Vec<BlockHeader>, PeerError>;

    async fn send_get_block_bodies(&self, hashes: Vec<Hash>) -> Result<Vec<Vec<Tx>>, PeerError>;

    fn disconnect(&self, reason: &str);
}

pub trait TimeSource: Send + Sync {
    fn now_ms(&self) -> u64;
}

pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now_ms(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}
