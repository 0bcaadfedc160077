//! Telemetry module
//!
//! Metrics and structured logging

mod logging;
mod metrics;

pub use logging::{init_logging, LogFormat};
pub use metrics::{increment_counter, set_gauge, CounterMetric, GaugeMetric};

use crate::config::TelemetryConfig;

/// Guard that cleans up telemetry on drop
pub struct TelemetryGuard {
    _priv: (),
}

/// Initialize all telemetry subsystems
pub fn init_telemetry(config: &TelemetryConfig) -> anyhow::Result<TelemetryGuard> {
    init_logging(&config.log_level)?;

    if config.metrics_enabled {
        let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
        builder
            .with_http_listener(([0, 0, 0, 0], config.metrics_port))
            .install()
            .map_err(|e| anyhow::anyhow!("Failed to start metrics exporter: {}", e))?;
        tracing::info!(port = config.metrics_port, "Prometheus metrics exporter started");
    }

    Ok(TelemetryGuard { _priv: () })
}
