//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for structured logging and metrics.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to every log line.
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error).
    pub log_level: String,

    /// Whether to enable console output (for development).
    pub console_output: bool,

    /// Whether to enable JSON formatted logs (for containerized deployments).
    pub json_logs: bool,

    /// Prometheus metrics server port.
    pub metrics_port: u16,

    /// Network identifier (mainnet, testnet).
    pub network: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "chain-node".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
            metrics_port: 9100,
            network: "testnet".to_string(),
        }
    }
}

impl TelemetryConfig {
    /// Build configuration from environment variables.
    ///
    /// - `CHAIN_LOG_LEVEL` or `RUST_LOG`: log level (default: info)
    /// - `CHAIN_CONSOLE_OUTPUT`: enable console output (default: true)
    /// - `CHAIN_JSON_LOGS`: enable JSON logs (default: true inside a container)
    /// - `CHAIN_METRICS_PORT`: Prometheus metrics port (default: 9100)
    /// - `CHAIN_NETWORK`: network name (default: testnet)
    pub fn from_env() -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();

        Self {
            service_name: env::var("CHAIN_SERVICE_NAME")
                .unwrap_or_else(|_| "chain-node".to_string()),

            log_level: env::var("CHAIN_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            console_output: env::var("CHAIN_CONSOLE_OUTPUT")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(true),

            json_logs: env::var("CHAIN_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(is_container),

            metrics_port: env::var("CHAIN_METRICS_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(9100),

            network: env::var("CHAIN_NETWORK").unwrap_or_else(|_| "testnet".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "chain-node");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.metrics_port, 9100);
    }
}
