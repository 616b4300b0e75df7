//! # Ingestion Pipeline
//!
//! Synchronous, non-blocking admission in front of a bounded channel and a
//! single drain task. The drain task applies mutations to the graph store
//! (which emits `graph.mutation` events itself), so per-source order is the
//! channel's FIFO order, which the stale gate has already forced into
//! timestamp order.
//!
//! Memory is bounded by `buffer_capacity · record size`: when the channel is
//! full, admission rejects with back-pressure instead of queueing.

use crate::config::IngestionConfig;
use crate::domain::batch::BatchSummary;
use crate::domain::errors::IngestError;
use crate::domain::record::{derive, DerivedMutation};
use gs_01_graph_store::{GraphStore, NodeUpdate};
use parking_lot::{Mutex, RwLock};
use shared_bus::{EngineEvent, InMemoryEventBus};
use shared_types::TelemetryRecord;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

struct QueuedRecord {
    record: TelemetryRecord,
    mutation: DerivedMutation,
}

/// The streaming telemetry pipeline.
pub struct IngestionPipeline {
    config: IngestionConfig,
    bus: Arc<InMemoryEventBus>,
    tx: mpsc::Sender<QueuedRecord>,
    /// Newest accepted timestamp per source; the stale gate.
    newest: Mutex<HashMap<String, u64>>,
    /// Most recent accepted record per source.
    latest: RwLock<HashMap<String, TelemetryRecord>>,
    /// Admission/application sequence counters; equal when fully drained.
    enqueued: AtomicU64,
    applied: Arc<AtomicU64>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl IngestionPipeline {
    /// Starts the pipeline: spawns the drain task on the current runtime.
    #[must_use]
    pub fn start(
        config: IngestionConfig,
        store: Arc<GraphStore>,
        bus: Arc<InMemoryEventBus>,
    ) -> Self {
        let (tx, rx) = mpsc::channel(config.buffer_capacity.max(1));
        let applied = Arc::new(AtomicU64::new(0));
        let worker = tokio::spawn(drain(rx, store, Arc::clone(&applied)));
        info!(
            buffer_capacity = config.buffer_capacity,
            quality_threshold = config.quality_threshold,
            "Ingestion pipeline started"
        );
        Self {
            config,
            bus,
            tx,
            newest: Mutex::new(HashMap::new()),
            latest: RwLock::new(HashMap::new()),
            enqueued: AtomicU64::new(0),
            applied,
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Admits one record.
    ///
    /// # Errors
    ///
    /// - `LowQuality` below the quality threshold
    /// - `InvalidSchema` on a payload/schema mismatch
    /// - `Stale` when older than the newest accepted record for the source
    /// - `Backpressure` when the buffer is full; retry with delay
    /// - `Closed` after shutdown
    pub fn ingest(&self, record: TelemetryRecord) -> Result<(), IngestError> {
        if record.quality_score < self.config.quality_threshold {
            return Err(IngestError::LowQuality {
                score: record.quality_score,
                threshold: self.config.quality_threshold,
            });
        }

        let mutation = derive(&record)?;

        // Unrecognized types go straight to subscribers; the ordering and
        // buffering rules apply only to records that touch the graph.
        if matches!(mutation, DerivedMutation::Passthrough) {
            self.bus
                .publish_blocking(EngineEvent::IngestPassthrough(record));
            return Ok(());
        }

        let timestamp_ms = record.timestamp_ms();
        // Stale gate and enqueue under one lock so per-source admission
        // order equals timestamp order even under concurrent producers.
        let mut newest = self.newest.lock();
        if let Some(&newest_ms) = newest.get(&record.source_id) {
            if timestamp_ms < newest_ms {
                return Err(IngestError::Stale {
                    source_id: record.source_id.clone(),
                    timestamp_ms,
                    newest_ms,
                });
            }
        }

        let source_id = record.source_id.clone();
        let queued = QueuedRecord {
            record: record.clone(),
            mutation,
        };
        match self.tx.try_send(queued) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => return Err(IngestError::Backpressure),
            Err(mpsc::error::TrySendError::Closed(_)) => return Err(IngestError::Closed),
        }
        newest.insert(source_id.clone(), timestamp_ms);
        drop(newest);

        self.enqueued.fetch_add(1, Ordering::SeqCst);
        self.latest.write().insert(source_id, record);
        Ok(())
    }

    /// Admits a batch, tallying outcomes per reason.
    #[must_use]
    pub fn ingest_batch(&self, records: Vec<TelemetryRecord>) -> BatchSummary {
        let mut summary = BatchSummary::default();
        for record in records {
            match self.ingest(record) {
                Ok(()) => summary.record_accept(),
                Err(err) => {
                    debug!(error = %err, "Record rejected");
                    summary.record_reject(err.reason());
                }
            }
        }
        summary
    }

    /// Most recent accepted record for a source, if any.
    #[must_use]
    pub fn latest(&self, source_id: &str) -> Option<TelemetryRecord> {
        self.latest.read().get(source_id).cloned()
    }

    /// Records admitted since start.
    #[must_use]
    pub fn accepted_count(&self) -> u64 {
        self.enqueued.load(Ordering::SeqCst)
    }

    /// Waits until every admitted record has been applied.
    pub async fn drained(&self) {
        loop {
            let enqueued = self.enqueued.load(Ordering::SeqCst);
            let applied = self.applied.load(Ordering::SeqCst);
            if applied >= enqueued {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
        }
    }

    /// Stops the drain task. Buffered records not yet applied are
    /// discarded; subsequent admissions fail with `Closed`.
    pub fn shutdown(&self) {
        if let Some(worker) = self.worker.lock().take() {
            worker.abort();
            info!("Ingestion pipeline stopped");
        }
    }
}

impl Drop for IngestionPipeline {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Single consumer applying admitted records in FIFO order.
async fn drain(
    mut rx: mpsc::Receiver<QueuedRecord>,
    store: Arc<GraphStore>,
    applied: Arc<AtomicU64>,
) {
    while let Some(queued) = rx.recv().await {
        apply(&store, &queued);
        applied.fetch_add(1, Ordering::SeqCst);
    }
}

fn apply(store: &GraphStore, queued: &QueuedRecord) {
    let timestamp_ms = queued.record.timestamp_ms();
    let outcome = match &queued.mutation {
        DerivedMutation::SensorLoad { node_id, load } => store
            .update_node(
                node_id,
                NodeUpdate {
                    load: Some(*load),
                    timestamp_ms,
                    ..NodeUpdate::default()
                },
            )
            .map(|_| ()),
        DerivedMutation::SensorHealth { node_id, health } => store
            .update_node(
                node_id,
                NodeUpdate {
                    health: Some(*health),
                    timestamp_ms,
                    ..NodeUpdate::default()
                },
            )
            .map(|_| ()),
        DerivedMutation::NodeUpsert(node) => store.upsert_node((**node).clone()).map(|_| ()),
        DerivedMutation::NodeRemove { node_id } => store.remove_node(node_id),
        DerivedMutation::EdgeUpsert(edge) => store.upsert_edge((**edge).clone()).map(|_| ()),
        DerivedMutation::EdgeRemove { source, target } => store.remove_edge(source, target),
        // Passthrough records are published at admission, never queued.
        DerivedMutation::Passthrough => Ok(()),
    };
    if let Err(err) = outcome {
        // The record was valid at admission; the graph moved underneath it
        // (e.g. a sensor update racing a node removal).
        warn!(
            source_id = %queued.record.source_id,
            data_type = %queued.record.data_type,
            error = %err,
            "Admitted record could not be applied"
        );
    }
}
