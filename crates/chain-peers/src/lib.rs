//! # Chain Peers
//!
//! Peer registry and reputation tracking (C9): `best_sync_candidate` /
//! `best_peers` for `chain-sync` to pick partners from, plus the
//! success/failure/ban bookkeeping that feeds those choices.
//!
//! Trimmed from a full Kademlia DHT peer-discovery stack down to the
//! slice the ingestion engine actually needs: this crate does no peer
//! *discovery* (no routing table, no ENR, no QUIC transport) — it only
//! tracks reputation for peers `chain-node`'s transport layer has already
//! connected and registered.

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::{BanReason, PeerId, PeerRegistryError, PeerReputationConfig};
pub use ports::{Peer, PeerError, PeerRegistry, SystemTimeSource, TimeSource};
pub use service::InMemoryPeerRegistry;
