//! # Resilience Platform
//!
//! The explicitly constructed root object owning every subsystem. Nothing
//! in the core is a process-wide singleton: construct a platform, use it,
//! shut it down.

use crate::container::config::EngineConfig;
use crate::wiring;
use gs_01_graph_store::adapters::BusMutationSink;
use gs_01_graph_store::GraphStore;
use gs_02_criticality::{CentralityBlendScorer, CriticalityScorer, ScoreCache};
use gs_03_cascade_engine::CascadeEngine;
use gs_04_ingestion::{BatchSummary, IngestError, IngestionPipeline};
use gs_05_coordinator::JobCoordinator;
use parking_lot::Mutex;
use sentinel_telemetry::{INGEST_ACCEPTED, INGEST_REJECTED};
use shared_bus::{EventFilter, InMemoryEventBus, Subscription};
use shared_types::{InfrastructureNode, TelemetryRecord};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

/// The assembled core engine.
///
/// Construction wires every subsystem and spawns the background tasks
/// (ingestion drain, metrics bridge); it must run inside a tokio runtime.
pub struct ResiliencePlatform {
    config: EngineConfig,
    bus: Arc<InMemoryEventBus>,
    store: Arc<GraphStore>,
    score_cache: Arc<ScoreCache>,
    scorer: Arc<dyn CriticalityScorer>,
    pipeline: Arc<IngestionPipeline>,
    coordinator: Arc<JobCoordinator>,
    metrics_task: Mutex<Option<JoinHandle<()>>>,
}

impl ResiliencePlatform {
    /// Builds a platform with the default centrality-blend scorer.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        let scorer = Arc::new(CentralityBlendScorer::with_config(config.scorer.clone()));
        Self::with_scorer(config, scorer)
    }

    /// Builds a platform with a custom scorer (e.g. a learned model).
    #[must_use]
    pub fn with_scorer(config: EngineConfig, scorer: Arc<dyn CriticalityScorer>) -> Self {
        let bus = Arc::new(InMemoryEventBus::with_capacity(config.bus_capacity));
        let store = Arc::new(GraphStore::with_sink(Arc::new(BusMutationSink::new(
            Arc::clone(&bus),
        ))));
        let score_cache = Arc::new(ScoreCache::new(config.criticality_staleness_bound));
        let engine = Arc::new(CascadeEngine::with_config(config.cascade.clone()));
        let pipeline = Arc::new(IngestionPipeline::start(
            config.ingestion.clone(),
            Arc::clone(&store),
            Arc::clone(&bus),
        ));
        let coordinator = Arc::new(JobCoordinator::new(
            config.coordinator.clone(),
            Arc::clone(&store),
            Arc::clone(&scorer),
            Arc::clone(&score_cache),
            engine,
            Arc::clone(&bus),
        ));

        let metrics_task = wiring::metrics::spawn_metrics_bridge(
            Arc::clone(&bus),
            Arc::clone(&store),
            Arc::clone(&coordinator),
        );

        info!("Resilience platform assembled");
        Self {
            config,
            bus,
            store,
            score_cache,
            scorer,
            pipeline,
            coordinator,
            metrics_task: Mutex::new(Some(metrics_task)),
        }
    }

    /// The engine configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The shared event bus.
    #[must_use]
    pub fn bus(&self) -> &Arc<InMemoryEventBus> {
        &self.bus
    }

    /// The graph store.
    #[must_use]
    pub fn store(&self) -> &Arc<GraphStore> {
        &self.store
    }

    /// The ingestion pipeline.
    #[must_use]
    pub fn pipeline(&self) -> &Arc<IngestionPipeline> {
        &self.pipeline
    }

    /// The job coordinator.
    #[must_use]
    pub fn coordinator(&self) -> &Arc<JobCoordinator> {
        &self.coordinator
    }

    /// Subscribes to engine events.
    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        self.bus.subscribe(filter)
    }

    /// Admits one telemetry record, counting the outcome.
    ///
    /// # Errors
    ///
    /// See [`IngestionPipeline::ingest`].
    pub fn ingest(&self, record: TelemetryRecord) -> Result<(), IngestError> {
        match self.pipeline.ingest(record) {
            Ok(()) => {
                INGEST_ACCEPTED.inc();
                Ok(())
            }
            Err(err) => {
                INGEST_REJECTED
                    .with_label_values(&[err.reason().as_str()])
                    .inc();
                Err(err)
            }
        }
    }

    /// Admits a batch of records, counting outcomes.
    #[must_use]
    pub fn ingest_batch(&self, records: Vec<TelemetryRecord>) -> BatchSummary {
        let mut summary = BatchSummary::default();
        for record in records {
            match self.ingest(record) {
                Ok(()) => summary.accepted += 1,
                Err(err) => {
                    *summary
                        .rejected_by_reason
                        .entry(err.reason().as_str())
                        .or_insert(0) += 1;
                }
            }
        }
        summary
    }

    /// Recomputes criticality (through the per-version cache) and writes
    /// the scores back to the stored nodes. Returns how many nodes were
    /// scored.
    #[must_use]
    pub fn refresh_criticality(&self) -> usize {
        let snapshot = self.store.snapshot();
        let scores = self
            .score_cache
            .get_or_compute(&snapshot, self.scorer.as_ref());
        self.store.apply_scores(&scores)
    }

    /// The `top_k` most critical nodes by stored score.
    #[must_use]
    pub fn critical_nodes(&self, top_k: usize) -> Vec<InfrastructureNode> {
        self.store.critical_nodes(top_k)
    }

    /// Stops background tasks. Admissions fail afterwards; in-flight
    /// simulation jobs run to completion on the blocking pool.
    pub fn shutdown(&self) {
        self.pipeline.shutdown();
        if let Some(task) = self.metrics_task.lock().take() {
            task.abort();
        }
        info!("Resilience platform stopped");
    }
}

impl Drop for ResiliencePlatform {
    fn drop(&mut self) {
        self.shutdown();
    }
}
