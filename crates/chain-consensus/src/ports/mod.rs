//! Ports layer: the driving APIs this crate exposes (`inbound`) and the
//! collaborators it calls out to (`outbound`).

mod inbound;
mod outbound;

pub use inbound::*;
pub use outbound::*;
