//! # Simulation Request & Result Types
//!
//! The typed boundary between callers (via the coordinator) and the cascade
//! engine: the initiating event, the Monte-Carlo request parameters, a single
//! run's outcome, and the aggregate over all runs.

use crate::entities::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Kind of initiating event for a simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Hurricane,
    Earthquake,
    Flood,
    Cyberattack,
    PowerOutage,
    Other,
}

/// Environmental conditions that modulate propagation.
///
/// All fields optional; absent fields contribute nothing to the event
/// multiplier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentConditions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_celsius: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_speed_kmh: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precipitation_mm: Option<f64>,
}

/// The trigger for a cascade simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisruptionEvent {
    pub kind: EventKind,
    /// Severity in [0, 1].
    pub severity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<EnvironmentConditions>,
    /// Nodes failed at t = 0. Must be non-empty.
    pub initial_failures: Vec<NodeId>,
}

/// Parameters for a Monte-Carlo cascading-failure simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRequest {
    pub scenario_name: String,
    pub event: DisruptionEvent,
    /// Simulated wall-clock horizon in minutes. Bounded, > 0.
    pub horizon_minutes: f64,
    /// Simulation tick granularity in minutes. > 0 and ≤ horizon.
    pub time_step_minutes: f64,
    /// Number of independent Monte-Carlo runs.
    pub monte_carlo_runs: u32,
    /// Confidence level for the aggregate intervals, in (0, 1).
    #[serde(default = "default_confidence_level")]
    pub confidence_level: f64,
    /// Global propagation multiplier in [0, 1].
    pub base_propagation_probability: f64,
    /// Tolerated effective load factor before stress failure sets in.
    pub load_threshold_multiplier: f64,
    #[serde(default)]
    pub recovery_enabled: bool,
    /// Mean time for a failed node to recover, in minutes. Only read when
    /// `recovery_enabled` is set.
    #[serde(default = "default_mean_recovery")]
    pub mean_recovery_time_minutes: f64,
}

fn default_confidence_level() -> f64 {
    0.95
}

fn default_mean_recovery() -> f64 {
    720.0
}

impl SimulationRequest {
    /// The nodes failed at t = 0 (carried on the event).
    #[must_use]
    pub fn initial_failures(&self) -> &[NodeId] {
        &self.event.initial_failures
    }

    /// Number of simulation ticks implied by horizon and step.
    #[must_use]
    pub fn tick_count(&self) -> u64 {
        if self.time_step_minutes <= 0.0 {
            return 0;
        }
        (self.horizon_minutes / self.time_step_minutes).ceil() as u64
    }
}

/// One entry in a run's failure timeline.
///
/// `cause` is the upstream dependency whose failure propagated here; for the
/// initial failures it is the node itself; for pure stress failures it is
/// absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub t_minutes: f64,
    pub node: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<NodeId>,
}

/// Outcome of a single Monte-Carlo run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// Failure events ordered by time (ties by node id).
    pub timeline: Vec<FailureRecord>,
    /// Every node that failed at any point during the run.
    pub failed: BTreeSet<NodeId>,
    /// Nodes still failed when the run terminated (differs from `failed`
    /// only when recovery is enabled).
    pub still_failed: BTreeSet<NodeId>,
    /// First failure time per node, minutes from t = 0. Nodes that never
    /// failed are absent (time-to-failure ∞).
    pub time_to_failure: BTreeMap<NodeId, f64>,
    /// Criticality-weighted impact with early-failure penalty.
    pub impact: f64,
    /// Longest cause chain observed, counted in hops from an initial failure.
    pub max_chain_depth: u32,
}

/// A cause chain from an initial failure to a terminal failure, with the
/// number of runs in which exactly this chain occurred.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticalPath {
    pub chain: Vec<NodeId>,
    pub occurrences: u32,
}

/// A node ranked by how much hardening it would have reduced aggregate
/// impact, estimated by replaying recorded trajectories without the node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bottleneck {
    pub node: NodeId,
    pub expected_impact_reduction: f64,
}

/// Whether the aggregate covers every requested run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum ResultQuality {
    Complete,
    /// At least one run failed twice (once with a fresh seed); the aggregate
    /// covers only the runs that succeeded.
    Partial { succeeded_runs: u32 },
}

impl ResultQuality {
    /// True unless the aggregate is degraded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(self, ResultQuality::Complete)
    }
}

/// Aggregate over all Monte-Carlo runs of one simulation request.
///
/// Everything except `computation_time_seconds` is a deterministic function
/// of the (snapshot, request) fingerprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    pub scenario_name: String,
    /// Fraction of runs in which each node failed. Only nodes that failed at
    /// least once appear.
    pub failure_probability: BTreeMap<NodeId, f64>,
    /// Mean time to failure in minutes, conditional on failure.
    pub mean_time_to_failure: BTreeMap<NodeId, f64>,
    /// Confidence interval over the per-run count of failed nodes.
    pub affected_nodes_ci: (usize, usize),
    /// Confidence interval over the per-run impact score.
    pub impact_ci: (f64, f64),
    /// Top-K most frequent cause chains, ordered by decreasing frequency.
    pub critical_paths: Vec<CriticalPath>,
    /// Nodes ranked by expected impact reduction if hardened.
    pub bottleneck_nodes: Vec<Bottleneck>,
    /// Fraction of runs in which the cascade extended beyond the initial
    /// failures.
    pub cascade_probability: f64,
    /// Mean over runs of the longest cause-chain length.
    pub cascade_depth: f64,
    /// Mean per-run impact score.
    pub mean_impact: f64,
    /// Failure timeline of the representative run (run index 0).
    pub timeline: Vec<FailureRecord>,
    /// Deterministic advisory strings derived from the aggregate.
    pub recommendations: Vec<String>,
    pub quality: ResultQuality,
    /// Number of runs requested.
    pub monte_carlo_runs: u32,
    /// Wall-clock cost; excluded from the reproducibility contract.
    pub computation_time_seconds: f64,
}
