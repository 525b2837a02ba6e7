//! Application layer: the concrete services implementing the
//! `SyncManager`/`SyncResponder` ports.

pub mod service;

pub use service::{SyncManagerService, SyncResponderService};
