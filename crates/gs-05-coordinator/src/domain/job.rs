//! # Job Bookkeeping
//!
//! A submitted request resolves to a [`JobHandle`]; duplicate submissions
//! attach additional handles to the same underlying entry. The outcome is
//! broadcast through a `watch` channel so every attached handle resolves to
//! the same shared result.

use crate::domain::errors::CoordinatorError;
use crate::domain::fingerprint::Fingerprint;
use shared_types::{AggregateResult, CancelFlag};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use uuid::Uuid;

/// Shared outcome of one executed job.
pub type JobOutcome = Result<Arc<AggregateResult>, CoordinatorError>;

/// One underlying execution, shared by every attached handle.
pub(crate) struct JobEntry {
    pub(crate) job_id: Uuid,
    pub(crate) fingerprint: Fingerprint,
    pub(crate) attached: AtomicUsize,
    pub(crate) cancel: CancelFlag,
    pub(crate) outcome_rx: watch::Receiver<Option<JobOutcome>>,
}

impl JobEntry {
    pub(crate) fn new(
        fingerprint: Fingerprint,
        outcome_rx: watch::Receiver<Option<JobOutcome>>,
    ) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            fingerprint,
            attached: AtomicUsize::new(1),
            cancel: CancelFlag::new(),
            outcome_rx,
        }
    }

    /// Registers one more attached handle.
    pub(crate) fn attach(&self) {
        self.attached.fetch_add(1, Ordering::SeqCst);
    }

    /// Detaches one handle; returns true when this was the last one, in
    /// which case the caller cancels the execution.
    pub(crate) fn detach(&self) -> bool {
        self.attached.fetch_sub(1, Ordering::SeqCst) == 1
    }
}

/// Caller-side handle for one submission.
pub struct JobHandle {
    pub(crate) entry: Arc<JobEntry>,
    /// Set once this handle is cancelled; detaching twice is a no-op.
    pub(crate) detached: AtomicBool,
}

impl JobHandle {
    pub(crate) fn new(entry: Arc<JobEntry>) -> Self {
        Self {
            entry,
            detached: AtomicBool::new(false),
        }
    }

    /// The underlying job id (shared by attached duplicates).
    #[must_use]
    pub fn job_id(&self) -> Uuid {
        self.entry.job_id
    }

    /// The fingerprint this submission deduplicated on.
    #[must_use]
    pub fn fingerprint(&self) -> Fingerprint {
        self.entry.fingerprint
    }

    /// Waits for the job outcome.
    ///
    /// A handle that was individually cancelled resolves to `Cancelled`
    /// even if the shared job completed for other attached handles.
    pub async fn await_result(&self) -> JobOutcome {
        if self.detached.load(Ordering::SeqCst) {
            return Err(CoordinatorError::Cancelled);
        }
        let mut rx = self.entry.outcome_rx.clone();
        loop {
            if let Some(outcome) = rx.borrow().as_ref() {
                return outcome.clone();
            }
            if rx.changed().await.is_err() {
                // Sender dropped without publishing an outcome.
                return Err(CoordinatorError::Internal {
                    trace_id: Uuid::new_v4(),
                });
            }
        }
    }
}
