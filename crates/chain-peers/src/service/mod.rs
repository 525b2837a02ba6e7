//! Service layer: the concrete in-memory `PeerRegistry`.

mod registry;

pub use registry::InMemoryPeerRegistry;
