//! Prometheus metrics for Grid Sentinel subsystems.
//!
//! Naming convention: `gs_<subsystem>_<metric>_<unit>`.
//!
//! ## Metric Types
//!
//! - **Counter**: monotonically increasing (e.g. records_accepted_total)
//! - **Gauge**: goes up and down (e.g. graph node count)
//! - **Histogram**: distribution (e.g. simulation duration)

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Gauge, Histogram, Opts, Registry,
    TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry.
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // INGESTION METRICS
    // =========================================================================

    /// Total telemetry records accepted.
    pub static ref INGEST_ACCEPTED: Counter = Counter::new(
        "gs_ingestion_records_accepted_total",
        "Total telemetry records accepted"
    ).expect("metric creation failed");

    /// Total telemetry records rejected, by reason.
    pub static ref INGEST_REJECTED: CounterVec = CounterVec::new(
        Opts::new("gs_ingestion_records_rejected_total", "Total telemetry records rejected"),
        &["reason"]  // invalid_schema / low_quality / stale / backpressure / closed
    ).expect("metric creation failed");

    // =========================================================================
    // GRAPH STORE METRICS
    // =========================================================================

    /// Total graph mutations applied.
    pub static ref GRAPH_MUTATIONS: Counter = Counter::new(
        "gs_graph_mutations_total",
        "Total mutations applied to the dependency graph"
    ).expect("metric creation failed");

    /// Current node count.
    pub static ref GRAPH_NODES: Gauge = Gauge::new(
        "gs_graph_nodes",
        "Current number of nodes in the dependency graph"
    ).expect("metric creation failed");

    /// Current edge count.
    pub static ref GRAPH_EDGES: Gauge = Gauge::new(
        "gs_graph_edges",
        "Current number of edges in the dependency graph"
    ).expect("metric creation failed");

    // =========================================================================
    // COORDINATOR / CASCADE METRICS
    // =========================================================================

    /// Simulations that started executing.
    pub static ref SIMULATIONS_STARTED: Counter = Counter::new(
        "gs_coordinator_simulations_started_total",
        "Total simulation jobs that started executing"
    ).expect("metric creation failed");

    /// Simulations that produced an aggregate.
    pub static ref SIMULATIONS_COMPLETED: Counter = Counter::new(
        "gs_coordinator_simulations_completed_total",
        "Total simulation jobs completed"
    ).expect("metric creation failed");

    /// Simulations that were cancelled or errored.
    pub static ref SIMULATIONS_FAILED: Counter = Counter::new(
        "gs_coordinator_simulations_failed_total",
        "Total simulation jobs that failed or were cancelled"
    ).expect("metric creation failed");

    /// Wall-clock simulation duration.
    pub static ref SIMULATION_DURATION: Histogram = Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "gs_cascade_simulation_duration_seconds",
            "Wall-clock duration of Monte-Carlo simulations"
        ).buckets(exponential_buckets(0.01, 2.0, 14).expect("bucket creation failed"))
    ).expect("metric creation failed");

    /// Jobs admitted and not yet finished.
    pub static ref JOBS_IN_FLIGHT: Gauge = Gauge::new(
        "gs_coordinator_jobs_in_flight",
        "Simulation jobs admitted and not yet finished"
    ).expect("metric creation failed");

    // =========================================================================
    // BUS METRICS
    // =========================================================================

    /// Events published on the fan-out.
    pub static ref BUS_EVENTS_PUBLISHED: Counter = Counter::new(
        "gs_bus_events_published_total",
        "Total events published on the shared bus"
    ).expect("metric creation failed");
}

/// Handle proving registration happened; held by the telemetry guard.
pub struct MetricsHandle(());

/// Registers every metric with the global registry.
///
/// Re-registration (tests, repeated init) is tolerated.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(INGEST_ACCEPTED.clone()),
        Box::new(INGEST_REJECTED.clone()),
        Box::new(GRAPH_MUTATIONS.clone()),
        Box::new(GRAPH_NODES.clone()),
        Box::new(GRAPH_EDGES.clone()),
        Box::new(SIMULATIONS_STARTED.clone()),
        Box::new(SIMULATIONS_COMPLETED.clone()),
        Box::new(SIMULATIONS_FAILED.clone()),
        Box::new(SIMULATION_DURATION.clone()),
        Box::new(JOBS_IN_FLIGHT.clone()),
        Box::new(BUS_EVENTS_PUBLISHED.clone()),
    ];
    for collector in collectors {
        match REGISTRY.register(collector) {
            Ok(()) => {}
            Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }
    Ok(MetricsHandle(()))
}

/// Renders the registry in Prometheus text exposition format.
#[must_use]
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if encoder.encode(&REGISTRY.gather(), &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
