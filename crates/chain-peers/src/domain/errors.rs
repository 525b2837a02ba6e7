//! Domain errors and ban reasons.

use std::fmt;

use super::PeerId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerRegistryError {
    UnknownPeer(PeerId),
    PeerBanned(PeerId),
}

impl fmt::Display for PeerRegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownPeer(id) => write!(f, "unknown peer {}", hex(id)),
            Self::PeerBanned(id) => write!(f, "peer {} is banned", hex(id)),
        }
    }
}

impl std::error::Error for PeerRegistryError {}

fn hex(id: &PeerId) -> String {
    id.iter().map(|b| format!("{b:02x}")).collect()
}

/// Reasons a peer can be banned. `InvalidSignature` is deliberately
/// excluded: on a UDP/gossip transport, IP addresses can be spoofed, so a
/// bad signature alone is treated as a silent drop rather than a ban that
/// could be used to frame a victim peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BanReason {
    IncompatibleChain,
    ProtocolViolation,
    RepeatedTimeouts,
    Manual,
}
