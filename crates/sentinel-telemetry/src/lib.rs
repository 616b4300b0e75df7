//! # Sentinel Telemetry
//!
//! Observability plumbing for the resilience engine: structured logging via
//! `tracing` and Prometheus metrics for every subsystem.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sentinel_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     let _guard = init_telemetry(TelemetryConfig::from_env()).expect("telemetry init");
//!     // Logs and metrics are now being collected.
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `GS_LOG_LEVEL` | `info` | Log level filter (tracing env-filter syntax) |
//! | `GS_SERVICE_NAME` | `grid-sentinel` | Service name stamped on startup |

mod config;
mod logging;
mod metrics;

pub use config::TelemetryConfig;
pub use metrics::{
    gather_metrics, register_metrics, MetricsHandle, BUS_EVENTS_PUBLISHED, GRAPH_EDGES,
    GRAPH_MUTATIONS, GRAPH_NODES, INGEST_ACCEPTED, INGEST_REJECTED, JOBS_IN_FLIGHT,
    SIMULATIONS_COMPLETED, SIMULATIONS_FAILED, SIMULATIONS_STARTED, SIMULATION_DURATION,
};

use thiserror::Error;

/// Telemetry initialization errors.
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("failed to register metrics: {0}")]
    MetricsInit(String),
}

/// Initialize logging and metrics.
///
/// Returns a guard to hold for the lifetime of the application. Safe to
/// call more than once (later calls keep the first logger).
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics_handle = register_metrics()?;
    logging::init_logging(&config)?;
    tracing::info!(service = %config.service_name, "Telemetry initialized");
    Ok(TelemetryGuard {
        _metrics: metrics_handle,
    })
}

/// Keeps telemetry alive; drop on shutdown.
pub struct TelemetryGuard {
    _metrics: MetricsHandle,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        let first = init_telemetry(TelemetryConfig::default());
        let second = init_telemetry(TelemetryConfig::default());
        assert!(first.is_ok());
        assert!(second.is_ok());
    }
}
