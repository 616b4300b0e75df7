//! # Coordinator Errors

use gs_03_cascade_engine::CascadeError;
use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced through submission and awaited handles.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CoordinatorError {
    /// Pool and queue are full; retry with delay.
    #[error("coordinator at capacity ({capacity} jobs in flight)")]
    Overloaded { capacity: usize },

    /// The awaited handle (or the whole job) was cancelled.
    #[error("job cancelled")]
    Cancelled,

    /// The engine rejected or failed the simulation.
    #[error(transparent)]
    Engine(#[from] CascadeError),

    /// The executing task vanished without reporting an outcome.
    #[error("job terminated without an outcome (trace {trace_id})")]
    Internal { trace_id: Uuid },
}
