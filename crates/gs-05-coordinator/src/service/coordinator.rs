//! # Job Coordinator
//!
//! Owns the worker pool. A submission snapshots the graph, fingerprints the
//! work, deduplicates against in-flight jobs, and either attaches to an
//! existing execution or admits a new one (fail-fast once pool + queue are
//! full). Execution acquires a pool permit, runs the engine on the blocking
//! pool, publishes lifecycle events, and broadcasts the shared outcome to
//! every attached handle.

use crate::config::CoordinatorConfig;
use crate::domain::errors::CoordinatorError;
use crate::domain::fingerprint::Fingerprint;
use crate::domain::job::{JobEntry, JobHandle, JobOutcome};
use gs_01_graph_store::GraphStore;
use gs_02_criticality::{CriticalityScorer, ScoreCache};
use gs_03_cascade_engine::{CascadeEngine, CascadeError};
use parking_lot::Mutex;
use shared_bus::{EngineEvent, EventPublisher, InMemoryEventBus};
use shared_types::SimulationRequest;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{watch, Semaphore};
use tracing::{info, warn};
use uuid::Uuid;

/// Simulation admission, dedup and scheduling.
pub struct JobCoordinator {
    config: CoordinatorConfig,
    store: Arc<GraphStore>,
    scorer: Arc<dyn CriticalityScorer>,
    score_cache: Arc<ScoreCache>,
    engine: Arc<CascadeEngine>,
    bus: Arc<InMemoryEventBus>,
    jobs: Arc<Mutex<HashMap<Fingerprint, Arc<JobEntry>>>>,
    in_flight: Arc<AtomicUsize>,
    pool: Arc<Semaphore>,
}

impl JobCoordinator {
    /// Wires a coordinator over its collaborators.
    #[must_use]
    pub fn new(
        config: CoordinatorConfig,
        store: Arc<GraphStore>,
        scorer: Arc<dyn CriticalityScorer>,
        score_cache: Arc<ScoreCache>,
        engine: Arc<CascadeEngine>,
        bus: Arc<InMemoryEventBus>,
    ) -> Self {
        let pool = Arc::new(Semaphore::new(config.worker_pool_size.max(1)));
        info!(
            worker_pool_size = config.worker_pool_size,
            queue_capacity = config.queue_capacity,
            "Job coordinator started"
        );
        Self {
            config,
            store,
            scorer,
            score_cache,
            engine,
            bus,
            jobs: Arc::new(Mutex::new(HashMap::new())),
            in_flight: Arc::new(AtomicUsize::new(0)),
            pool,
        }
    }

    /// Jobs currently admitted (queued or executing).
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Submits a simulation request.
    ///
    /// An identical in-flight request (same fingerprint) is attached to
    /// rather than re-executed.
    ///
    /// # Errors
    ///
    /// - `Overloaded` when pool plus queue are full; retry with delay
    pub fn submit(&self, request: SimulationRequest) -> Result<JobHandle, CoordinatorError> {
        let snapshot = self.store.snapshot();
        let fingerprint = Fingerprint::compute(snapshot.version(), &request);

        let mut jobs = self.jobs.lock();
        if let Some(entry) = jobs.get(&fingerprint) {
            entry.attach();
            info!(job_id = %entry.job_id, %fingerprint, "Attached to in-flight job");
            return Ok(JobHandle::new(Arc::clone(entry)));
        }

        let capacity = self.config.admission_capacity();
        if self.in_flight.load(Ordering::SeqCst) >= capacity {
            warn!(capacity, "Submission rejected: coordinator overloaded");
            return Err(CoordinatorError::Overloaded { capacity });
        }
        self.in_flight.fetch_add(1, Ordering::SeqCst);

        let (outcome_tx, outcome_rx) = watch::channel(None);
        let entry = Arc::new(JobEntry::new(fingerprint, outcome_rx));
        jobs.insert(fingerprint, Arc::clone(&entry));
        drop(jobs);

        info!(job_id = %entry.job_id, %fingerprint, scenario = %request.scenario_name, "Job admitted");

        tokio::spawn(execute_job(ExecuteContext {
            request,
            snapshot_version: snapshot.version(),
            entry: Arc::clone(&entry),
            outcome_tx,
            store: Arc::clone(&self.store),
            scorer: Arc::clone(&self.scorer),
            score_cache: Arc::clone(&self.score_cache),
            engine: Arc::clone(&self.engine),
            bus: Arc::clone(&self.bus),
            jobs: Arc::clone(&self.jobs),
            in_flight: Arc::clone(&self.in_flight),
            pool: Arc::clone(&self.pool),
        }));

        Ok(JobHandle::new(entry))
    }

    /// Waits for a handle's outcome.
    pub async fn await_result(&self, handle: &JobHandle) -> JobOutcome {
        handle.await_result().await
    }

    /// Cancels one handle. The underlying job is cancelled only when its
    /// last attached handle is cancelled. Idempotent per handle.
    pub fn cancel(&self, handle: &JobHandle) {
        if handle.detached.swap(true, Ordering::SeqCst) {
            return;
        }
        if handle.entry.detach() {
            info!(job_id = %handle.entry.job_id, "Last handle detached; cancelling job");
            handle.entry.cancel.cancel();
        }
    }
}

struct ExecuteContext {
    request: SimulationRequest,
    snapshot_version: u64,
    entry: Arc<JobEntry>,
    outcome_tx: watch::Sender<Option<JobOutcome>>,
    store: Arc<GraphStore>,
    scorer: Arc<dyn CriticalityScorer>,
    score_cache: Arc<ScoreCache>,
    engine: Arc<CascadeEngine>,
    bus: Arc<InMemoryEventBus>,
    jobs: Arc<Mutex<HashMap<Fingerprint, Arc<JobEntry>>>>,
    in_flight: Arc<AtomicUsize>,
    pool: Arc<Semaphore>,
}

async fn execute_job(ctx: ExecuteContext) {
    let started = Instant::now();
    let fingerprint = ctx.entry.fingerprint;
    let job_id = ctx.entry.job_id;

    // Queue until a worker frees up. Admission capacity bounds how many
    // tasks can be parked here.
    let _permit = ctx
        .pool
        .clone()
        .acquire_owned()
        .await
        .expect("worker pool semaphore never closes");

    ctx.bus
        .publish(EngineEvent::SimulationStarted {
            job_id,
            scenario_name: ctx.request.scenario_name.clone(),
            fingerprint: fingerprint.to_hex(),
        })
        .await;

    // The exact snapshot the fingerprint was computed against: versions
    // only move forward, and the store returns the same copy while the
    // version is unchanged. A version mismatch means the graph moved after
    // submission; the job still runs against the current snapshot it gets,
    // deduplicated under the fingerprinted version.
    let snapshot = ctx.store.snapshot();
    let scores = ctx.score_cache.get_or_compute(&snapshot, ctx.scorer.as_ref());

    let engine = Arc::clone(&ctx.engine);
    let request = ctx.request.clone();
    let cancel = ctx.entry.cancel.clone();
    let master_seed = fingerprint.master_seed();
    let snapshot_for_run = Arc::clone(&snapshot);
    let scores_for_run = Arc::clone(&scores);

    let simulated = tokio::task::spawn_blocking(move || {
        engine.simulate(
            snapshot_for_run.as_ref(),
            scores_for_run.as_ref(),
            &request,
            master_seed,
            &cancel,
        )
    })
    .await;

    let elapsed = started.elapsed().as_secs_f64();
    let outcome: JobOutcome = match simulated {
        Ok(Ok(result)) => Ok(Arc::new(result)),
        Ok(Err(CascadeError::Cancelled)) => Err(CoordinatorError::Cancelled),
        Ok(Err(err)) => Err(CoordinatorError::Engine(err)),
        Err(join_error) => {
            let trace_id = Uuid::new_v4();
            warn!(%trace_id, error = %join_error, "Simulation task aborted");
            Err(CoordinatorError::Internal { trace_id })
        }
    };

    match &outcome {
        Ok(result) => {
            ctx.bus
                .publish(EngineEvent::SimulationCompleted {
                    job_id,
                    fingerprint: fingerprint.to_hex(),
                    result: Arc::clone(result),
                    elapsed_seconds: elapsed,
                })
                .await;
            info!(%job_id, elapsed_seconds = elapsed, snapshot_version = ctx.snapshot_version, "Job completed");
        }
        Err(err) => {
            ctx.bus
                .publish(EngineEvent::SimulationFailed {
                    job_id,
                    fingerprint: fingerprint.to_hex(),
                    reason: err.to_string(),
                })
                .await;
            info!(%job_id, error = %err, "Job failed");
        }
    }

    // Unregister before broadcasting so a submission racing the broadcast
    // starts a fresh job instead of attaching to a finished one.
    {
        let mut jobs = ctx.jobs.lock();
        if jobs
            .get(&fingerprint)
            .is_some_and(|current| Arc::ptr_eq(current, &ctx.entry))
        {
            jobs.remove(&fingerprint);
        }
    }
    ctx.in_flight.fetch_sub(1, Ordering::SeqCst);

    let _ = ctx.outcome_tx.send(Some(outcome));
}
