//! Inbound port: the scorer seam.

use gs_01_graph_store::GraphSnapshot;
use shared_types::NodeId;
use std::collections::BTreeMap;

/// Computes a criticality score in [0, 1] for every node in a snapshot.
///
/// Implementations must be pure in the snapshot: the same snapshot always
/// yields the same map. A learned replacement (e.g. a graph neural network
/// behind FFI) plugs in here as long as it honors the signature and range.
pub trait CriticalityScorer: Send + Sync {
    /// Score every node in the snapshot.
    fn score(&self, snapshot: &GraphSnapshot) -> BTreeMap<NodeId, f64>;
}
