//! Ports layer: the driving `PeerRegistry` API and the driven `Peer`/
//! `TimeSource` collaborators it's built from.

mod inbound;
mod outbound;

pub use inbound::PeerRegistry;
pub use outbound::{Peer, PeerError, SystemTimeSource, TimeSource};
