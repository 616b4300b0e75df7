//! # Cascade Engine Errors
//!
//! Invalid parameters surface before any run starts and are never retried.
//! `Internal` means every run failed even after its retry; it carries a
//! trace id that is also logged at error level.

use shared_types::NodeId;
use thiserror::Error;
use uuid::Uuid;

/// Errors from simulation validation and execution.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CascadeError {
    /// `monte_carlo_runs` must be at least 1.
    #[error("monte_carlo_runs must be positive")]
    NonPositiveRuns,

    /// `time_step_minutes` must be positive and at least the configured
    /// minimum.
    #[error("time step {step} outside allowed range (min {min})")]
    InvalidTimeStep { step: f64, min: f64 },

    /// `horizon_minutes` must be positive, at least one step, and at most
    /// the configured maximum.
    #[error("horizon {horizon} outside allowed range (step {step}, max {max})")]
    InvalidHorizon { horizon: f64, step: f64, max: f64 },

    /// `confidence_level` must lie strictly inside (0, 1).
    #[error("confidence level {0} outside (0, 1)")]
    InvalidConfidenceLevel(f64),

    /// `event.severity` must lie in [0, 1].
    #[error("event severity {0} outside [0, 1]")]
    InvalidSeverity(f64),

    /// `base_propagation_probability` must lie in [0, 1].
    #[error("base propagation probability {0} outside [0, 1]")]
    InvalidBaseProbability(f64),

    /// `load_threshold_multiplier` must be positive (infinity disables
    /// stress propagation).
    #[error("load threshold multiplier {0} must be positive")]
    InvalidLoadThreshold(f64),

    /// `mean_recovery_time_minutes` must be positive when recovery is on.
    #[error("mean recovery time {0} must be positive")]
    InvalidRecoveryTime(f64),

    /// The event must name at least one initial failure.
    #[error("initial_failures must be non-empty")]
    NoInitialFailures,

    /// An initial failure references a node absent from the snapshot.
    #[error("unknown initial failure node: {0}")]
    UnknownInitialNode(NodeId),

    /// `runs × affected-subgraph × ticks` exceeds the configured budget.
    #[error("work budget exceeded: required {required}, budget {budget}")]
    BudgetExceeded { required: u64, budget: u64 },

    /// Cooperative cancellation observed at a tick boundary.
    #[error("simulation cancelled")]
    Cancelled,

    /// No run succeeded even after retries.
    #[error("internal simulation failure (trace {trace_id})")]
    Internal { trace_id: Uuid },
}
