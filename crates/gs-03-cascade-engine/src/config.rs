//! Configuration for the cascade engine.

use crate::domain::multiplier::MultiplierTable;
use serde::{Deserialize, Serialize};

/// Engine-level knobs; request-level parameters live on the request itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CascadeConfig {
    /// Fraction of a failed node's effective load redistributed equally
    /// across its still-alive dependents; returned on recovery.
    pub recovery_fraction_alpha: f64,
    /// Scales how quickly load excess beyond the request threshold turns
    /// into stress-failure probability.
    pub stress_sensitivity_k: f64,
    /// Event/sector hazard modulation; see `domain/multiplier.rs`.
    #[serde(default)]
    pub event_multiplier_table: MultiplierTable,
    /// How many cause chains the aggregate reports.
    pub top_k_critical_paths: usize,
    /// How many bottleneck nodes the aggregate reports.
    pub bottleneck_limit: usize,
    /// Refuse requests whose `runs × affected-subgraph × ticks` product
    /// exceeds this.
    pub work_budget: u64,
    /// Terminate a run after this many consecutive ticks without a failure
    /// or recovery.
    pub quiet_tick_limit: u32,
    /// Upper bound on the request horizon (minutes).
    pub max_horizon_minutes: f64,
    /// Lower bound on the request tick size (minutes).
    pub min_time_step_minutes: f64,
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            recovery_fraction_alpha: 0.5,
            stress_sensitivity_k: 0.5,
            event_multiplier_table: MultiplierTable::default(),
            top_k_critical_paths: 5,
            bottleneck_limit: 10,
            work_budget: 50_000_000,
            quiet_tick_limit: 3,
            max_horizon_minutes: 7.0 * 24.0 * 60.0,
            min_time_step_minutes: 0.25,
        }
    }
}
