//! Structured logging setup.
//!
//! Logs carry consistent fields — `height`, `block_hash`, `peer`, `kind` —
//! so they can be grepped or shipped to a log aggregator without extra
//! parsing.

use crate::{TelemetryConfig, TelemetryError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Guard returned by [`init_logging`]. Holding it keeps the global
/// subscriber installed; nothing needs to happen on drop, but the type
/// exists so callers have something to hold onto for the process
/// lifetime.
pub struct LoggingGuard {
    _private: (),
}

/// Install the global `tracing` subscriber.
pub fn init_logging(config: &TelemetryConfig) -> Result<LoggingGuard, TelemetryError> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| TelemetryError::Config(e.to_string()))?;

    if config.json_logs {
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(json_layer.with_filter(tracing_subscriber::filter::LevelFilter::TRACE))
            .try_init()
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_ansi(config.console_output);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer.with_filter(tracing_subscriber::filter::LevelFilter::TRACE))
            .try_init()
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
    }

    tracing::info!(service = %config.service_name, network = %config.network, "logging initialized");
    Ok(LoggingGuard { _private: () })
}

/// Log a block-related event with the standard `height`/`block_hash` fields.
#[macro_export]
macro_rules! log_block_event {
    ($level:ident, $msg:expr, $block_height:expr, $block_hash:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            height = $block_height,
            block_hash = %$block_hash,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log a transaction-related event with the standard `tx_hash` field.
#[macro_export]
macro_rules! log_tx_event {
    ($level:ident, $msg:expr, $tx_hash:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            tx_hash = %$tx_hash,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log a peer-related event with the standard `peer` field.
#[macro_export]
macro_rules! log_peer_event {
    ($level:ident, $msg:expr, $peer:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            peer = %$peer,
            $($($field)*,)?
            $msg
        )
    };
}
