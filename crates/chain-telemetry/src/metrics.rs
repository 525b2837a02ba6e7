//! Prometheus metrics for the chain-ingestion engine.
//!
//! The four counters named by the error-handling design are always
//! registered; the rest supplement them with the obvious adjacent
//! gauges/histograms an operator dashboard would want.

use lazy_static::lazy_static;
use prometheus::{exponential_buckets, Counter, Gauge, Histogram, Registry, TextEncoder};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    /// `chain.sync.blocks_downloaded`
    pub static ref SYNC_BLOCKS_DOWNLOADED: Counter = Counter::new(
        "chain_sync_blocks_downloaded_total",
        "Total number of blocks downloaded during sync"
    ).expect("metric creation failed");

    /// `chain.reorgs.count`
    pub static ref REORGS_COUNT: Counter = Counter::new(
        "chain_reorgs_total",
        "Total number of chain reorganizations applied"
    ).expect("metric creation failed");

    /// `chain.orphans.count`
    pub static ref ORPHANS_COUNT: Counter = Counter::new(
        "chain_orphans_total",
        "Total number of blocks held in the orphan buffer"
    ).expect("metric creation failed");

    /// `chain.sync.status` (0 = synced, 1 = syncing)
    pub static ref SYNC_STATUS: Gauge = Gauge::new(
        "chain_sync_status",
        "Sync status: 0 = synced, 1 = syncing"
    ).expect("metric creation failed");

    /// Current chain height, for dashboards.
    pub static ref CHAIN_HEIGHT: Gauge = Gauge::new(
        "chain_height",
        "Current blockchain height"
    ).expect("metric creation failed");

    /// Block validation duration.
    pub static ref BLOCK_VALIDATION_DURATION: Histogram = Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "chain_block_validation_duration_seconds",
            "Time spent validating a block"
        ).buckets(exponential_buckets(0.0001, 2.0, 15).unwrap())
    ).expect("metric creation failed");

    /// Block write-batch commit duration.
    pub static ref BLOCK_WRITE_DURATION: Histogram = Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "chain_block_write_duration_seconds",
            "Time spent committing a block write batch"
        ).buckets(exponential_buckets(0.0001, 2.0, 12).unwrap())
    ).expect("metric creation failed");

    /// Current mempool size (transaction count).
    pub static ref MEMPOOL_SIZE: Gauge = Gauge::new(
        "chain_mempool_transactions_pending",
        "Number of pending transactions in the mempool"
    ).expect("metric creation failed");

    /// Connected peers.
    pub static ref PEERS_CONNECTED: Gauge = Gauge::new(
        "chain_peers_connected",
        "Number of currently connected peers"
    ).expect("metric creation failed");
}

/// Handle for the registered metrics. Holding it keeps the registration
/// alive for the process lifetime.
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register every metric above with the global registry.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(SYNC_BLOCKS_DOWNLOADED.clone()),
        Box::new(REORGS_COUNT.clone()),
        Box::new(ORPHANS_COUNT.clone()),
        Box::new(SYNC_STATUS.clone()),
        Box::new(CHAIN_HEIGHT.clone()),
        Box::new(BLOCK_VALIDATION_DURATION.clone()),
        Box::new(BLOCK_WRITE_DURATION.clone()),
        Box::new(MEMPOOL_SIZE.clone()),
        Box::new(PEERS_CONNECTED.clone()),
    ];

    for metric in metrics {
        REGISTRY
            .register(metric)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics in Prometheus text exposition format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard that observes elapsed seconds into a histogram on drop.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        self.histogram.observe(duration);
    }
}

/// Start timing for a histogram. Observation happens on drop.
#[macro_export]
macro_rules! time_histogram {
    ($histogram:expr) => {
        $crate::metrics::HistogramTimer::new(&$histogram)
    };
}
