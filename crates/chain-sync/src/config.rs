//! Sync service configuration: the poll cadence `SyncManagerService::start`
//! loops on. The wire-protocol batch sizes/timeouts live as constants in
//! [`crate::domain::value_objects`] rather than here — they're part of
//! the protocol, not a deployment knob.

use serde::{Deserialize, Serialize};

/// Poll cadence for the sync driver's background loop.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Delay between `perform_sync` rounds while actively catching up.
    pub active_poll_interval_ms: u64,

    /// Delay between rounds once caught up with every known peer.
    pub idle_poll_interval_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            active_poll_interval_ms: 100,
            idle_poll_interval_ms: 5_000,
        }
    }
}

impl SyncConfig {
    /// Config for tests: fast enough that a loop iteration or two doesn't
    /// stall the test suite.
    pub fn for_testing() -> Self {
        Self { active_poll_interval_ms: 5, idle_poll_interval_ms: 20 }
    }
}
