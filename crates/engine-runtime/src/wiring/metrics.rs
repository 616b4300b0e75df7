//! # Metrics Bridge
//!
//! A background subscriber translating bus traffic into Prometheus series.
//! The subsystems stay metrics-agnostic; observability is wired on at the
//! runtime edge like every other subscriber.

use gs_01_graph_store::GraphStore;
use gs_05_coordinator::JobCoordinator;
use sentinel_telemetry::{
    BUS_EVENTS_PUBLISHED, GRAPH_EDGES, GRAPH_MUTATIONS, GRAPH_NODES, JOBS_IN_FLIGHT,
    SIMULATIONS_COMPLETED, SIMULATIONS_FAILED, SIMULATIONS_STARTED, SIMULATION_DURATION,
};
use shared_bus::{EngineEvent, EventFilter, InMemoryEventBus};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Spawns the bridge task; abort it on shutdown.
pub fn spawn_metrics_bridge(
    bus: Arc<InMemoryEventBus>,
    store: Arc<GraphStore>,
    coordinator: Arc<JobCoordinator>,
) -> JoinHandle<()> {
    let mut subscription = bus.subscribe(EventFilter::all());
    tokio::spawn(async move {
        while let Some(event) = subscription.recv().await {
            BUS_EVENTS_PUBLISHED.inc();
            match event {
                EngineEvent::GraphMutation(_) => {
                    GRAPH_MUTATIONS.inc();
                    GRAPH_NODES.set(store.node_count() as f64);
                    GRAPH_EDGES.set(store.edge_count() as f64);
                }
                EngineEvent::SimulationStarted { .. } => {
                    SIMULATIONS_STARTED.inc();
                    JOBS_IN_FLIGHT.set(coordinator.in_flight() as f64);
                }
                EngineEvent::SimulationCompleted {
                    elapsed_seconds, ..
                } => {
                    SIMULATIONS_COMPLETED.inc();
                    SIMULATION_DURATION.observe(elapsed_seconds);
                    JOBS_IN_FLIGHT.set(coordinator.in_flight() as f64);
                }
                EngineEvent::SimulationFailed { .. } => {
                    SIMULATIONS_FAILED.inc();
                    JOBS_IN_FLIGHT.set(coordinator.in_flight() as f64);
                }
                EngineEvent::IngestPassthrough(_) => {}
            }
        }
    })
}
