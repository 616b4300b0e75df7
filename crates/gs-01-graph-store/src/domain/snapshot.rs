//! # Graph Snapshot
//!
//! A logically immutable view of the graph at one version. Snapshots are
//! structural copies: once issued, later store mutations cannot be observed
//! through them. Both the scorer and the cascade engine operate exclusively
//! on snapshots, so a simulation can never see a torn or shifting graph.
//!
//! All collections are ordered (`BTreeMap`/`BTreeSet`) so iteration is
//! deterministic and simulation output is reproducible.

use shared_types::{DependencyEdge, InfrastructureNode, NodeId};
use std::collections::{BTreeMap, BTreeSet};

/// Immutable view of the graph at a fixed version.
#[derive(Debug, Clone, Default)]
pub struct GraphSnapshot {
    version: u64,
    nodes: BTreeMap<NodeId, InfrastructureNode>,
    /// `out_edges[a][b]` holds the edge `a → b` ("a depends on b").
    out_edges: BTreeMap<NodeId, BTreeMap<NodeId, DependencyEdge>>,
    /// `in_edges[b]` holds every `a` with an edge `a → b`.
    in_edges: BTreeMap<NodeId, BTreeSet<NodeId>>,
    edge_count: usize,
}

impl GraphSnapshot {
    /// Assembles a snapshot from nodes and an edge iterator. Only edges with
    /// both endpoints present are retained.
    pub(crate) fn from_parts(
        version: u64,
        nodes: BTreeMap<NodeId, InfrastructureNode>,
        edges: impl Iterator<Item = DependencyEdge>,
    ) -> Self {
        let mut snapshot = Self {
            version,
            nodes,
            out_edges: BTreeMap::new(),
            in_edges: BTreeMap::new(),
            edge_count: 0,
        };
        for edge in edges {
            if !snapshot.nodes.contains_key(&edge.source)
                || !snapshot.nodes.contains_key(&edge.target)
            {
                continue;
            }
            snapshot
                .in_edges
                .entry(edge.target.clone())
                .or_default()
                .insert(edge.source.clone());
            snapshot
                .out_edges
                .entry(edge.source.clone())
                .or_default()
                .insert(edge.target.clone(), edge);
            snapshot.edge_count += 1;
        }
        snapshot
    }

    /// The graph version this snapshot was taken at.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Number of nodes in the snapshot.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges in the snapshot.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// True when the snapshot holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Looks up a node.
    #[must_use]
    pub fn node(&self, id: &NodeId) -> Option<&InfrastructureNode> {
        self.nodes.get(id)
    }

    /// True when the node is present.
    #[must_use]
    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// All nodes, in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &InfrastructureNode> {
        self.nodes.values()
    }

    /// All node ids, in order.
    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.keys()
    }

    /// All edges, ordered by (source, target).
    pub fn edges(&self) -> impl Iterator<Item = &DependencyEdge> {
        self.out_edges.values().flat_map(|targets| targets.values())
    }

    /// Edges leaving `id`: the dependencies this node requires, in target
    /// id order.
    pub fn dependencies_of(&self, id: &NodeId) -> impl Iterator<Item = &DependencyEdge> {
        self.out_edges
            .get(id)
            .into_iter()
            .flat_map(|targets| targets.values())
    }

    /// Sources of edges arriving at `id`: the nodes that depend on (are
    /// supplied by) this node, in id order.
    pub fn dependents_of(&self, id: &NodeId) -> impl Iterator<Item = &NodeId> {
        self.in_edges.get(id).into_iter().flatten()
    }

    /// Sum of incoming-edge `strength`: how much the rest of the graph
    /// leans on this node.
    #[must_use]
    pub fn weighted_in_degree(&self, id: &NodeId) -> f64 {
        self.dependents_of(id)
            .filter_map(|source| {
                self.out_edges
                    .get(source)
                    .and_then(|targets| targets.get(id))
            })
            .map(|edge| edge.strength)
            .sum()
    }

    /// Every node reachable from `seeds` by repeatedly stepping to
    /// dependents (reverse dependency edges), excluding the seeds, bounded
    /// by `max_depth`. An unbounded walk passes `usize::MAX`.
    #[must_use]
    pub fn reverse_reachable(&self, seeds: &[NodeId], max_depth: usize) -> BTreeSet<NodeId> {
        let mut reached: BTreeSet<NodeId> = BTreeSet::new();
        let mut frontier: BTreeSet<NodeId> = seeds.iter().cloned().collect();
        let mut depth = 0usize;
        while !frontier.is_empty() && depth < max_depth {
            let mut next = BTreeSet::new();
            for id in &frontier {
                for dependent in self.dependents_of(id) {
                    if reached.contains(dependent) || seeds.contains(dependent) {
                        continue;
                    }
                    next.insert(dependent.clone());
                }
            }
            reached.extend(next.iter().cloned());
            frontier = next;
            depth += 1;
        }
        reached
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::graph::DependencyGraph;
    use shared_types::NodeKind;

    fn chain_snapshot() -> GraphSnapshot {
        // c depends on b, b depends on a: failure at a can reach c.
        let mut g = DependencyGraph::new();
        for id in ["a", "b", "c"] {
            g.add_node(InfrastructureNode::new(id, NodeKind::Power, 10.0))
                .unwrap();
        }
        g.add_edge(DependencyEdge::new("b", "a", 0.8, 0.5)).unwrap();
        g.add_edge(DependencyEdge::new("c", "b", 0.6, 0.5)).unwrap();
        g.snapshot()
    }

    #[test]
    fn test_dependencies_and_dependents() {
        let snap = chain_snapshot();
        let deps: Vec<&str> = snap
            .dependencies_of(&NodeId::from("b"))
            .map(|e| e.target.as_str())
            .collect();
        assert_eq!(deps, vec!["a"]);

        let dependents: Vec<&str> = snap
            .dependents_of(&NodeId::from("a"))
            .map(NodeId::as_str)
            .collect();
        assert_eq!(dependents, vec!["b"]);
    }

    #[test]
    fn test_weighted_in_degree() {
        let snap = chain_snapshot();
        assert!((snap.weighted_in_degree(&NodeId::from("a")) - 0.8).abs() < 1e-12);
        assert!((snap.weighted_in_degree(&NodeId::from("b")) - 0.6).abs() < 1e-12);
        assert_eq!(snap.weighted_in_degree(&NodeId::from("c")), 0.0);
    }

    #[test]
    fn test_reverse_reachable_bounded() {
        let snap = chain_snapshot();
        let seeds = [NodeId::from("a")];

        let one_hop = snap.reverse_reachable(&seeds, 1);
        assert_eq!(one_hop.len(), 1);
        assert!(one_hop.contains(&NodeId::from("b")));

        let all = snap.reverse_reachable(&seeds, usize::MAX);
        assert_eq!(all.len(), 2);
        assert!(all.contains(&NodeId::from("c")));
    }

    #[test]
    fn test_from_parts_drops_dangling_edges() {
        let mut nodes = BTreeMap::new();
        let a = InfrastructureNode::new("a", NodeKind::Water, 1.0);
        nodes.insert(a.id.clone(), a);
        let edges = vec![DependencyEdge::new("a", "missing", 1.0, 1.0)];
        let snap = GraphSnapshot::from_parts(3, nodes, edges.into_iter());
        assert_eq!(snap.edge_count(), 0);
        assert_eq!(snap.version(), 3);
    }
}
