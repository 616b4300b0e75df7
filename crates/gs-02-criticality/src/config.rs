//! Configuration for the default criticality blend.

use serde::{Deserialize, Serialize};

/// Weights and depth for the centrality blend.
///
/// The three weights are applied as given (they are not re-normalized); the
/// defaults sum to 1 so the blend stays inside [0, 1] before the final clamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScorerConfig {
    /// Weight of the reachability-mass signal.
    pub reachability_weight: f64,
    /// Weight of the weighted-degree signal.
    pub degree_weight: f64,
    /// Weight of the capacity-health stress signal.
    pub stress_weight: f64,
    /// How many reverse hops count as "transitively dependent".
    pub reachability_depth: usize,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            reachability_weight: 0.5,
            degree_weight: 0.3,
            stress_weight: 0.2,
            reachability_depth: 4,
        }
    }
}
