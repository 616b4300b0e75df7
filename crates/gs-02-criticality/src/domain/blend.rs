//! # Centrality Blend Scorer
//!
//! The default criticality model: a weighted blend of three normalized
//! signals, each monotone in its input while the others are held fixed.
//!
//! 1. **Weighted degree**: sum of incoming-edge `strength` (who depends on
//!    me), normalized by the graph maximum.
//! 2. **Reachability mass**: fraction of other nodes that transitively
//!    depend on this node within a bounded number of reverse hops.
//! 3. **Stress**: `(1 − health) · load_factor` — a stressed, degraded node
//!    scores higher than a healthy idle one.
//!
//! `score = clamp(w_r·reachability + w_d·degree + w_s·stress, 0, 1)`

use crate::config::ScorerConfig;
use crate::ports::CriticalityScorer;
use gs_01_graph_store::GraphSnapshot;
use shared_types::NodeId;
use std::collections::BTreeMap;
use tracing::debug;

/// Default analytic scorer.
#[derive(Debug, Clone, Default)]
pub struct CentralityBlendScorer {
    config: ScorerConfig,
}

impl CentralityBlendScorer {
    /// Creates a scorer with default weights.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a scorer with custom weights and depth.
    #[must_use]
    pub fn with_config(config: ScorerConfig) -> Self {
        Self { config }
    }

    fn stress(snapshot: &GraphSnapshot, id: &NodeId) -> f64 {
        let Some(node) = snapshot.node(id) else {
            return 0.0;
        };
        ((1.0 - node.health) * node.load_factor()).clamp(0.0, 1.0)
    }
}

impl CriticalityScorer for CentralityBlendScorer {
    fn score(&self, snapshot: &GraphSnapshot) -> BTreeMap<NodeId, f64> {
        let node_count = snapshot.node_count();
        if node_count == 0 {
            return BTreeMap::new();
        }

        let degrees: BTreeMap<NodeId, f64> = snapshot
            .node_ids()
            .map(|id| (id.clone(), snapshot.weighted_in_degree(id)))
            .collect();
        let max_degree = degrees.values().cloned().fold(0.0_f64, f64::max);

        let mut scores = BTreeMap::new();
        for id in snapshot.node_ids() {
            let degree = if max_degree > 0.0 {
                degrees[id] / max_degree
            } else {
                0.0
            };

            let reachability = if node_count > 1 {
                let dependents = snapshot
                    .reverse_reachable(std::slice::from_ref(id), self.config.reachability_depth)
                    .len();
                dependents as f64 / (node_count - 1) as f64
            } else {
                0.0
            };

            let stress = Self::stress(snapshot, id);

            let score = (self.config.reachability_weight * reachability
                + self.config.degree_weight * degree
                + self.config.stress_weight * stress)
                .clamp(0.0, 1.0);
            scores.insert(id.clone(), score);
        }

        debug!(
            nodes = node_count,
            version = snapshot.version(),
            "Criticality scores computed"
        );
        scores
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gs_01_graph_store::DependencyGraph;
    use shared_types::{DependencyEdge, InfrastructureNode, NodeKind};

    fn node(id: &str) -> InfrastructureNode {
        InfrastructureNode::new(id, NodeKind::Power, 100.0)
    }

    /// plant supplies substation supplies {hospital, pump}.
    fn supply_chain() -> GraphSnapshot {
        let mut g = DependencyGraph::new();
        for id in ["plant", "substation", "hospital", "pump"] {
            g.add_node(node(id)).unwrap();
        }
        g.add_edge(DependencyEdge::new("substation", "plant", 1.0, 0.5))
            .unwrap();
        g.add_edge(DependencyEdge::new("hospital", "substation", 0.9, 0.5))
            .unwrap();
        g.add_edge(DependencyEdge::new("pump", "substation", 0.7, 0.5))
            .unwrap();
        g.snapshot()
    }

    #[test]
    fn test_scores_in_range_and_total_coverage() {
        let snap = supply_chain();
        let scores = CentralityBlendScorer::new().score(&snap);
        assert_eq!(scores.len(), 4);
        for score in scores.values() {
            assert!((0.0..=1.0).contains(score));
        }
    }

    #[test]
    fn test_supply_root_scores_highest() {
        let snap = supply_chain();
        let scores = CentralityBlendScorer::new().score(&snap);
        // Everything transitively depends on the plant; nothing depends on
        // the hospital or the pump.
        assert!(scores[&NodeId::from("plant")] > scores[&NodeId::from("hospital")]);
        assert!(scores[&NodeId::from("substation")] > scores[&NodeId::from("pump")]);
    }

    #[test]
    fn test_monotone_in_degree() {
        let mut g = DependencyGraph::new();
        for id in ["hub", "x", "y"] {
            g.add_node(node(id)).unwrap();
        }
        g.add_edge(DependencyEdge::new("x", "hub", 0.2, 0.5)).unwrap();
        let weak = CentralityBlendScorer::new().score(&g.snapshot());

        g.remove_edge(&NodeId::from("x"), &NodeId::from("hub")).unwrap();
        g.add_edge(DependencyEdge::new("x", "hub", 0.9, 0.5)).unwrap();
        g.add_edge(DependencyEdge::new("y", "hub", 0.9, 0.5)).unwrap();
        let strong = CentralityBlendScorer::new().score(&g.snapshot());

        assert!(strong[&NodeId::from("hub")] >= weak[&NodeId::from("hub")]);
    }

    #[test]
    fn test_monotone_in_stress() {
        let mut g = DependencyGraph::new();
        g.add_node(node("a")).unwrap();
        g.add_node(node("b")).unwrap();
        let calm = CentralityBlendScorer::new().score(&g.snapshot());

        g.update_node(
            &NodeId::from("a"),
            gs_01_graph_store::NodeUpdate {
                load: Some(95.0),
                health: Some(0.3),
                timestamp_ms: 1,
                ..Default::default()
            },
        )
        .unwrap();
        let stressed = CentralityBlendScorer::new().score(&g.snapshot());

        assert!(stressed[&NodeId::from("a")] > calm[&NodeId::from("a")]);
        assert_eq!(stressed[&NodeId::from("b")], calm[&NodeId::from("b")]);
    }

    #[test]
    fn test_reachability_depth_bounds_signal() {
        // Long chain: tail depends on everything upstream.
        let mut g = DependencyGraph::new();
        let ids: Vec<String> = (0..8).map(|i| format!("n{i}")).collect();
        for id in &ids {
            g.add_node(node(id)).unwrap();
        }
        for pair in ids.windows(2) {
            g.add_edge(DependencyEdge::new(
                pair[1].as_str(),
                pair[0].as_str(),
                1.0,
                0.5,
            ))
            .unwrap();
        }
        let snap = g.snapshot();

        let shallow = CentralityBlendScorer::with_config(ScorerConfig {
            reachability_depth: 1,
            ..ScorerConfig::default()
        })
        .score(&snap);
        let deep = CentralityBlendScorer::with_config(ScorerConfig {
            reachability_depth: 7,
            ..ScorerConfig::default()
        })
        .score(&snap);

        let root = NodeId::from("n0");
        assert!(deep[&root] > shallow[&root]);
    }

    #[test]
    fn test_empty_snapshot() {
        let snap = DependencyGraph::new().snapshot();
        assert!(CentralityBlendScorer::new().score(&snap).is_empty());
    }
}
