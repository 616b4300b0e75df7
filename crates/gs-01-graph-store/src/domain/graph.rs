//! # Dependency Graph
//!
//! The mutable graph structure: nodes, keyed adjacency in both directions,
//! and the mutation/query primitives. Not concurrency-aware; the service
//! layer wraps it in a single write lease.
//!
//! Adjacency is kept in `BTreeMap`/`BTreeSet` keyed by `NodeId` so that every
//! traversal visits neighbors in lexicographic order. BFS results, snapshot
//! iteration and therefore simulation outputs are reproducible; insertion
//! order is never observable.

use super::errors::GraphError;
use super::snapshot::GraphSnapshot;
use serde::{Deserialize, Serialize};
use shared_types::{DependencyEdge, InfrastructureNode, NodeId, PropertyMap};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Traversal direction relative to a node.
///
/// `Out` follows dependency edges away from the node (what it depends on);
/// `In` follows them backwards (what depends on it).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    In,
    Out,
    Both,
}

/// Partial node mutation derived from telemetry or admin calls.
///
/// Absent fields are left untouched. Criticality is derived state and is
/// written back only through score application, never through an update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeUpdate {
    pub load: Option<f64>,
    pub health: Option<f64>,
    /// Merged key-by-key into the existing properties.
    pub properties: Option<PropertyMap>,
    /// Producer timestamp in milliseconds; `updated_at` never regresses.
    pub timestamp_ms: u64,
}

/// Whether an upsert inserted a fresh entity or replaced an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Inserted,
    Replaced,
}

/// The dependency graph: nodes plus directed edges `source → target`
/// ("source depends on target").
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// Bumped on every applied structural or telemetry mutation.
    version: u64,
    nodes: HashMap<NodeId, InfrastructureNode>,
    /// `out_edges[a][b]` holds the edge `a → b`.
    out_edges: HashMap<NodeId, BTreeMap<NodeId, DependencyEdge>>,
    /// `in_edges[b]` holds every `a` with an edge `a → b`.
    in_edges: HashMap<NodeId, BTreeSet<NodeId>>,
    edge_count: usize,
}

impl DependencyGraph {
    /// Creates an empty graph at version 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current graph version.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// True when the graph holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Looks up a node.
    #[must_use]
    pub fn node(&self, id: &NodeId) -> Option<&InfrastructureNode> {
        self.nodes.get(id)
    }

    /// Looks up an edge by ordered pair.
    #[must_use]
    pub fn edge(&self, source: &NodeId, target: &NodeId) -> Option<&DependencyEdge> {
        self.out_edges.get(source).and_then(|m| m.get(target))
    }

    /// Adds a new node.
    ///
    /// # Errors
    ///
    /// - `NodeExists` if the id is already present
    /// - `InvalidAttribute` on a numeric range violation
    pub fn add_node(&mut self, node: InfrastructureNode) -> Result<(), GraphError> {
        node.validate().map_err(GraphError::from_violation)?;
        if self.nodes.contains_key(&node.id) {
            return Err(GraphError::NodeExists(node.id));
        }
        self.nodes.insert(node.id.clone(), node);
        self.version += 1;
        Ok(())
    }

    /// Inserts or fully replaces a node, keeping `updated_at` monotone.
    ///
    /// # Errors
    ///
    /// - `InvalidAttribute` on a numeric range violation
    pub fn upsert_node(&mut self, mut node: InfrastructureNode) -> Result<Applied, GraphError> {
        node.validate().map_err(GraphError::from_violation)?;
        let applied = match self.nodes.get(&node.id) {
            Some(existing) => {
                node.updated_at = node.updated_at.max(existing.updated_at);
                Applied::Replaced
            }
            None => Applied::Inserted,
        };
        self.nodes.insert(node.id.clone(), node);
        self.version += 1;
        Ok(applied)
    }

    /// Applies a partial update to an existing node.
    ///
    /// # Errors
    ///
    /// - `NodeNotFound` if the id is absent
    /// - `InvalidAttribute` on a numeric range violation (the node is left
    ///   untouched)
    pub fn update_node(&mut self, id: &NodeId, update: NodeUpdate) -> Result<(), GraphError> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| GraphError::NodeNotFound(id.clone()))?;

        if let Some(load) = update.load {
            if !load.is_finite() || load < 0.0 {
                return Err(GraphError::InvalidAttribute {
                    field: "load",
                    value: load,
                });
            }
        }
        if let Some(health) = update.health {
            if !health.is_finite() || !(0.0..=1.0).contains(&health) {
                return Err(GraphError::InvalidAttribute {
                    field: "health",
                    value: health,
                });
            }
        }

        if let Some(load) = update.load {
            node.load = load;
        }
        if let Some(health) = update.health {
            node.health = health;
        }
        if let Some(properties) = update.properties {
            node.properties.extend(properties);
        }
        node.updated_at = node.updated_at.max(update.timestamp_ms);
        self.version += 1;
        Ok(())
    }

    /// Removes a node and every incident edge.
    ///
    /// # Errors
    ///
    /// - `NodeNotFound` if the id is absent
    pub fn remove_node(&mut self, id: &NodeId) -> Result<(), GraphError> {
        if self.nodes.remove(id).is_none() {
            return Err(GraphError::NodeNotFound(id.clone()));
        }

        // Outgoing edges: this node depended on the targets.
        if let Some(targets) = self.out_edges.remove(id) {
            self.edge_count -= targets.len();
            for target in targets.keys() {
                if let Some(sources) = self.in_edges.get_mut(target) {
                    sources.remove(id);
                }
            }
        }

        // Incoming edges: the sources depended on this node.
        if let Some(sources) = self.in_edges.remove(id) {
            self.edge_count -= sources.len();
            for source in &sources {
                if let Some(targets) = self.out_edges.get_mut(source) {
                    targets.remove(id);
                }
            }
        }

        self.version += 1;
        Ok(())
    }

    /// Adds a new dependency edge.
    ///
    /// # Errors
    ///
    /// - `SelfLoop` if source equals target
    /// - `NodeNotFound` if either endpoint is absent
    /// - `EdgeExists` if the ordered pair already has an edge
    /// - `InvalidAttribute` on a numeric range violation
    pub fn add_edge(&mut self, edge: DependencyEdge) -> Result<(), GraphError> {
        self.check_edge(&edge)?;
        if self
            .out_edges
            .get(&edge.source)
            .is_some_and(|m| m.contains_key(&edge.target))
        {
            return Err(GraphError::EdgeExists {
                edge_source: edge.source,
                target: edge.target,
            });
        }
        self.insert_edge(edge);
        self.version += 1;
        Ok(())
    }

    /// Inserts or replaces the edge for an ordered pair.
    ///
    /// # Errors
    ///
    /// Same as [`DependencyGraph::add_edge`] minus the conflict case.
    pub fn upsert_edge(&mut self, edge: DependencyEdge) -> Result<Applied, GraphError> {
        self.check_edge(&edge)?;
        let applied = if self
            .out_edges
            .get(&edge.source)
            .is_some_and(|m| m.contains_key(&edge.target))
        {
            Applied::Replaced
        } else {
            Applied::Inserted
        };
        if applied == Applied::Replaced {
            // insert_edge below overwrites; the count must not double.
            self.edge_count -= 1;
        }
        self.insert_edge(edge);
        self.version += 1;
        Ok(applied)
    }

    /// Removes the edge for an ordered pair.
    ///
    /// # Errors
    ///
    /// - `EdgeNotFound` if no such edge exists
    pub fn remove_edge(&mut self, source: &NodeId, target: &NodeId) -> Result<(), GraphError> {
        let removed = self
            .out_edges
            .get_mut(source)
            .and_then(|m| m.remove(target));
        if removed.is_none() {
            return Err(GraphError::EdgeNotFound {
                edge_source: source.clone(),
                target: target.clone(),
            });
        }
        if let Some(sources) = self.in_edges.get_mut(target) {
            sources.remove(source);
        }
        self.edge_count -= 1;
        self.version += 1;
        Ok(())
    }

    fn check_edge(&self, edge: &DependencyEdge) -> Result<(), GraphError> {
        if edge.source == edge.target {
            return Err(GraphError::SelfLoop(edge.source.clone()));
        }
        edge.validate().map_err(GraphError::from_violation)?;
        if !self.nodes.contains_key(&edge.source) {
            return Err(GraphError::NodeNotFound(edge.source.clone()));
        }
        if !self.nodes.contains_key(&edge.target) {
            return Err(GraphError::NodeNotFound(edge.target.clone()));
        }
        Ok(())
    }

    fn insert_edge(&mut self, edge: DependencyEdge) {
        self.in_edges
            .entry(edge.target.clone())
            .or_default()
            .insert(edge.source.clone());
        self.out_edges
            .entry(edge.source.clone())
            .or_default()
            .insert(edge.target.clone(), edge);
        self.edge_count += 1;
    }

    /// Breadth-first neighborhood of a node, up to `max_depth` hops.
    ///
    /// Returns `(node, depth)` pairs ordered by depth, ties within a depth
    /// broken by lexicographic node id. The start node is not included.
    ///
    /// # Errors
    ///
    /// - `NodeNotFound` if the start node is absent
    pub fn neighbors(
        &self,
        id: &NodeId,
        direction: Direction,
        max_depth: usize,
    ) -> Result<Vec<(InfrastructureNode, usize)>, GraphError> {
        if !self.nodes.contains_key(id) {
            return Err(GraphError::NodeNotFound(id.clone()));
        }

        let mut result = Vec::new();
        let mut visited: HashSet<NodeId> = HashSet::new();
        visited.insert(id.clone());
        let mut frontier: BTreeSet<NodeId> = self.adjacent(id, direction);
        let mut depth = 1usize;

        while !frontier.is_empty() && depth <= max_depth {
            let mut next: BTreeSet<NodeId> = BTreeSet::new();
            for nid in &frontier {
                visited.insert(nid.clone());
            }
            for nid in &frontier {
                if let Some(node) = self.nodes.get(nid) {
                    result.push((node.clone(), depth));
                }
                for adjacent in self.adjacent(nid, direction) {
                    if !visited.contains(&adjacent) {
                        next.insert(adjacent);
                    }
                }
            }
            frontier = next;
            depth += 1;
        }

        Ok(result)
    }

    fn adjacent(&self, id: &NodeId, direction: Direction) -> BTreeSet<NodeId> {
        let mut out = BTreeSet::new();
        if matches!(direction, Direction::Out | Direction::Both) {
            if let Some(targets) = self.out_edges.get(id) {
                out.extend(targets.keys().cloned());
            }
        }
        if matches!(direction, Direction::In | Direction::Both) {
            if let Some(sources) = self.in_edges.get(id) {
                out.extend(sources.iter().cloned());
            }
        }
        out
    }

    /// Consistent read-only snapshot of the subgraph reachable from `seeds`
    /// within `max_depth` hops, following edges in either direction. Edges
    /// are included when both endpoints made it in.
    ///
    /// # Errors
    ///
    /// - `NodeNotFound` if any seed is absent
    pub fn collect_subgraph(
        &self,
        seeds: &[NodeId],
        max_depth: usize,
    ) -> Result<GraphSnapshot, GraphError> {
        let mut included: HashSet<NodeId> = HashSet::new();
        for seed in seeds {
            if !self.nodes.contains_key(seed) {
                return Err(GraphError::NodeNotFound(seed.clone()));
            }
            included.insert(seed.clone());
        }

        let mut frontier: BTreeSet<NodeId> = seeds.iter().cloned().collect();
        for _ in 0..max_depth {
            let mut next = BTreeSet::new();
            for nid in &frontier {
                for adjacent in self.adjacent(nid, Direction::Both) {
                    if included.insert(adjacent.clone()) {
                        next.insert(adjacent);
                    }
                }
            }
            if next.is_empty() {
                break;
            }
            frontier = next;
        }

        let nodes: BTreeMap<NodeId, InfrastructureNode> = included
            .iter()
            .filter_map(|id| self.nodes.get(id).map(|n| (id.clone(), n.clone())))
            .collect();
        let edges = self
            .out_edges
            .iter()
            .filter(|(source, _)| included.contains(*source))
            .flat_map(|(_, targets)| targets.values())
            .filter(|edge| included.contains(&edge.target))
            .cloned();

        Ok(GraphSnapshot::from_parts(self.version, nodes, edges))
    }

    /// Consistent read-only snapshot of the entire graph.
    #[must_use]
    pub fn snapshot(&self) -> GraphSnapshot {
        let nodes: BTreeMap<NodeId, InfrastructureNode> = self
            .nodes
            .iter()
            .map(|(id, node)| (id.clone(), node.clone()))
            .collect();
        let edges = self
            .out_edges
            .values()
            .flat_map(|targets| targets.values())
            .cloned();
        GraphSnapshot::from_parts(self.version, nodes, edges)
    }

    /// Nodes ordered by stored criticality descending, ties by node id.
    #[must_use]
    pub fn critical_nodes(&self, top_k: usize) -> Vec<InfrastructureNode> {
        let mut nodes: Vec<&InfrastructureNode> = self.nodes.values().collect();
        nodes.sort_by(|a, b| {
            b.criticality
                .partial_cmp(&a.criticality)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        nodes.into_iter().take(top_k).cloned().collect()
    }

    /// Writes a computed criticality map back onto the stored nodes,
    /// clamping into [0, 1]. Unknown ids are skipped.
    ///
    /// Criticality is derived state: applying scores does not bump the graph
    /// version (a version bump would immediately re-stale the score cache
    /// that produced them).
    pub fn apply_scores(&mut self, scores: &BTreeMap<NodeId, f64>) -> usize {
        let mut applied = 0;
        for (id, score) in scores {
            if let Some(node) = self.nodes.get_mut(id) {
                node.criticality = score.clamp(0.0, 1.0);
                applied += 1;
            }
        }
        applied
    }
}
