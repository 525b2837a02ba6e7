//! # Chain Telemetry
//!
//! Structured logging (via `tracing`) and a Prometheus metrics registry
//! for the chain-ingestion engine.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use chain_telemetry::{TelemetryConfig, init_telemetry};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = TelemetryConfig::from_env();
//!     let _guard = init_telemetry(config).expect("failed to init telemetry");
//!     // application code runs here
//! }
//! ```
//!
//! ## Environment variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `CHAIN_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `CHAIN_JSON_LOGS` | `false` (`true` in a container) | JSON-formatted logs |
//! | `CHAIN_METRICS_PORT` | `9100` | Prometheus metrics port |
//! | `CHAIN_NETWORK` | `testnet` | Network label attached to logs |

#![allow(dead_code)]

mod config;
mod logging;
mod metrics;

pub use config::TelemetryConfig;
pub use logging::LoggingGuard;
pub use metrics::{
    encode_metrics, register_metrics, MetricsHandle, BLOCK_VALIDATION_DURATION,
    BLOCK_WRITE_DURATION, CHAIN_HEIGHT, MEMPOOL_SIZE, ORPHANS_COUNT, PEERS_CONNECTED,
    REORGS_COUNT, SYNC_BLOCKS_DOWNLOADED, SYNC_STATUS,
};

use thiserror::Error;

/// Telemetry initialization errors.
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("failed to initialize metrics: {0}")]
    MetricsInit(String),

    #[error("invalid telemetry configuration: {0}")]
    Config(String),
}

/// Initialize logging and metrics for the process.
///
/// Returns a guard that should be held for the process lifetime.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics_handle = register_metrics()?;
    let logging_guard = logging::init_logging(&config)?;

    Ok(TelemetryGuard {
        _logging: logging_guard,
        _metrics: metrics_handle,
    })
}

/// Guard that keeps telemetry active for the process lifetime.
pub struct TelemetryGuard {
    _logging: LoggingGuard,
    _metrics: MetricsHandle,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "chain-node");
    }
}
