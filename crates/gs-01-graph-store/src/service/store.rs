//! # Concurrent Graph Store
//!
//! Wraps [`DependencyGraph`] behind a single write lease
//! (`parking_lot::RwLock`) so every public mutation is atomic with respect
//! to concurrent readers: a reader observes the pre-state or the post-state,
//! never a torn structure.
//!
//! Lock discipline: mutation events are emitted *after* the write lease is
//! released; the lease is never held across a channel send.

use crate::domain::errors::GraphError;
use crate::domain::graph::{Applied, DependencyGraph, Direction, NodeUpdate};
use crate::domain::snapshot::GraphSnapshot;
use crate::ports::outbound::{MutationSink, NoOpSink};
use parking_lot::{Mutex, RwLock};
use shared_types::{DependencyEdge, InfrastructureNode, MutationEvent, NodeId};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Thread-safe graph store. Cheap to clone handles via `Arc` at the caller.
pub struct GraphStore {
    inner: RwLock<DependencyGraph>,
    sink: Arc<dyn MutationSink>,
    /// Snapshot reuse: repeated `snapshot()` calls at an unchanged version
    /// return the same `Arc` instead of re-copying the graph.
    cached_snapshot: Mutex<Option<Arc<GraphSnapshot>>>,
}

impl GraphStore {
    /// Creates an empty store that discards mutation events.
    #[must_use]
    pub fn new() -> Self {
        Self::with_sink(Arc::new(NoOpSink))
    }

    /// Creates an empty store emitting mutations into `sink`.
    #[must_use]
    pub fn with_sink(sink: Arc<dyn MutationSink>) -> Self {
        Self {
            inner: RwLock::new(DependencyGraph::new()),
            sink,
            cached_snapshot: Mutex::new(None),
        }
    }

    /// Current graph version.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.read().version()
    }

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.inner.read().node_count()
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.inner.read().edge_count()
    }

    /// Adds a new node.
    ///
    /// # Errors
    ///
    /// See [`DependencyGraph::add_node`].
    pub fn add_node(&self, node: InfrastructureNode) -> Result<(), GraphError> {
        let id = node.id.clone();
        let version = {
            let mut graph = self.inner.write();
            graph.add_node(node)?;
            graph.version()
        };
        self.emit(MutationEvent::NodeAdded { id, version });
        Ok(())
    }

    /// Inserts or replaces a node.
    ///
    /// # Errors
    ///
    /// See [`DependencyGraph::upsert_node`].
    pub fn upsert_node(&self, node: InfrastructureNode) -> Result<Applied, GraphError> {
        let id = node.id.clone();
        let (applied, version) = {
            let mut graph = self.inner.write();
            let applied = graph.upsert_node(node)?;
            (applied, graph.version())
        };
        self.emit(match applied {
            Applied::Inserted => MutationEvent::NodeAdded { id, version },
            Applied::Replaced => MutationEvent::NodeUpdated { id, version },
        });
        Ok(applied)
    }

    /// Applies a partial node update.
    ///
    /// # Errors
    ///
    /// See [`DependencyGraph::update_node`].
    pub fn update_node(&self, id: &NodeId, update: NodeUpdate) -> Result<(), GraphError> {
        let version = {
            let mut graph = self.inner.write();
            graph.update_node(id, update)?;
            graph.version()
        };
        self.emit(MutationEvent::NodeUpdated {
            id: id.clone(),
            version,
        });
        Ok(())
    }

    /// Removes a node and its incident edges.
    ///
    /// # Errors
    ///
    /// See [`DependencyGraph::remove_node`].
    pub fn remove_node(&self, id: &NodeId) -> Result<(), GraphError> {
        let version = {
            let mut graph = self.inner.write();
            graph.remove_node(id)?;
            graph.version()
        };
        self.emit(MutationEvent::NodeRemoved {
            id: id.clone(),
            version,
        });
        Ok(())
    }

    /// Adds a new dependency edge.
    ///
    /// # Errors
    ///
    /// See [`DependencyGraph::add_edge`].
    pub fn add_edge(&self, edge: DependencyEdge) -> Result<(), GraphError> {
        let (source, target) = (edge.source.clone(), edge.target.clone());
        let version = {
            let mut graph = self.inner.write();
            graph.add_edge(edge)?;
            graph.version()
        };
        self.emit(MutationEvent::EdgeAdded {
            source,
            target,
            version,
        });
        Ok(())
    }

    /// Inserts or replaces the edge for an ordered pair.
    ///
    /// # Errors
    ///
    /// See [`DependencyGraph::upsert_edge`].
    pub fn upsert_edge(&self, edge: DependencyEdge) -> Result<Applied, GraphError> {
        let (source, target) = (edge.source.clone(), edge.target.clone());
        let (applied, version) = {
            let mut graph = self.inner.write();
            let applied = graph.upsert_edge(edge)?;
            (applied, graph.version())
        };
        self.emit(match applied {
            Applied::Inserted => MutationEvent::EdgeAdded {
                source,
                target,
                version,
            },
            Applied::Replaced => MutationEvent::EdgeUpdated {
                source,
                target,
                version,
            },
        });
        Ok(applied)
    }

    /// Removes the edge for an ordered pair.
    ///
    /// # Errors
    ///
    /// See [`DependencyGraph::remove_edge`].
    pub fn remove_edge(&self, source: &NodeId, target: &NodeId) -> Result<(), GraphError> {
        let version = {
            let mut graph = self.inner.write();
            graph.remove_edge(source, target)?;
            graph.version()
        };
        self.emit(MutationEvent::EdgeRemoved {
            source: source.clone(),
            target: target.clone(),
            version,
        });
        Ok(())
    }

    /// Looks up a node by id.
    ///
    /// # Errors
    ///
    /// - `NodeNotFound` if the id is absent
    pub fn get_node(&self, id: &NodeId) -> Result<InfrastructureNode, GraphError> {
        self.inner
            .read()
            .node(id)
            .cloned()
            .ok_or_else(|| GraphError::NodeNotFound(id.clone()))
    }

    /// BFS neighborhood; see [`DependencyGraph::neighbors`].
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
        self.inner.read().neighbors(id, direction, max_depth)
    }

    /// Consistent snapshot of the subgraph reachable from `seeds`.
    ///
    /// # Errors
    ///
    /// - `NodeNotFound` if any seed is absent
    pub fn subgraph(&self, seeds: &[NodeId], max_depth: usize) -> Result<GraphSnapshot, GraphError> {
        self.inner.read().collect_subgraph(seeds, max_depth)
    }

    /// Consistent snapshot of the entire graph.
    ///
    /// Snapshots at an unchanged version share one structural copy.
    #[must_use]
    pub fn snapshot(&self) -> Arc<GraphSnapshot> {
        let graph = self.inner.read();
        let mut cached = self.cached_snapshot.lock();
        if let Some(snapshot) = cached.as_ref() {
            if snapshot.version() == graph.version() {
                return Arc::clone(snapshot);
            }
        }
        let snapshot = Arc::new(graph.snapshot());
        debug!(version = snapshot.version(), nodes = snapshot.node_count(), "Snapshot taken");
        *cached = Some(Arc::clone(&snapshot));
        snapshot
    }

    /// Nodes ordered by stored criticality; see
    /// [`DependencyGraph::critical_nodes`].
    #[must_use]
    pub fn critical_nodes(&self, top_k: usize) -> Vec<InfrastructureNode> {
        self.inner.read().critical_nodes(top_k)
    }

    /// Writes a computed criticality map back; see
    /// [`DependencyGraph::apply_scores`].
    pub fn apply_scores(&self, scores: &BTreeMap<NodeId, f64>) -> usize {
        self.inner.write().apply_scores(scores)
    }

    fn emit(&self, event: MutationEvent) {
        // Write lease already released; see the lock discipline note above.
        self.sink.emit(event);
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::outbound::RecordingSink;
    use shared_types::NodeKind;
    use std::thread;

    fn node(id: &str) -> InfrastructureNode {
        InfrastructureNode::new(id, NodeKind::Telecom, 50.0)
    }

    #[test]
    fn test_mutations_emit_events_in_order() {
        let sink = Arc::new(RecordingSink::new());
        let store = GraphStore::with_sink(sink.clone());

        store.add_node(node("a")).unwrap();
        store.add_node(node("b")).unwrap();
        store
            .add_edge(DependencyEdge::new("a", "b", 1.0, 0.5))
            .unwrap();
        store.remove_edge(&NodeId::from("a"), &NodeId::from("b")).unwrap();

        let events = sink.events();
        assert_eq!(events.len(), 4);
        assert!(matches!(events[0], MutationEvent::NodeAdded { .. }));
        assert!(matches!(events[2], MutationEvent::EdgeAdded { .. }));
        assert!(matches!(events[3], MutationEvent::EdgeRemoved { .. }));
        // Versions strictly increase across the sequence.
        let versions: Vec<u64> = events.iter().map(MutationEvent::version).collect();
        assert!(versions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_failed_mutation_emits_nothing() {
        let sink = Arc::new(RecordingSink::new());
        let store = GraphStore::with_sink(sink.clone());
        store.add_node(node("a")).unwrap();
        assert!(store.add_node(node("a")).is_err());
        assert_eq!(sink.events().len(), 1);
    }

    #[test]
    fn test_snapshot_reuse_at_same_version() {
        let store = GraphStore::new();
        store.add_node(node("a")).unwrap();

        let s1 = store.snapshot();
        let s2 = store.snapshot();
        assert!(Arc::ptr_eq(&s1, &s2));

        store.add_node(node("b")).unwrap();
        let s3 = store.snapshot();
        assert!(!Arc::ptr_eq(&s1, &s3));
        assert_eq!(s3.node_count(), 2);
    }

    #[test]
    fn test_concurrent_readers_and_writers() {
        let store = Arc::new(GraphStore::new());
        for i in 0..50 {
            store.add_node(node(&format!("seed-{i:03}"))).unwrap();
        }

        let writer = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..200 {
                    store.add_node(node(&format!("w-{i:04}"))).unwrap();
                }
            })
        };
        let reader = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for _ in 0..200 {
                    let snap = store.snapshot();
                    // A snapshot is internally consistent: all edges resolve.
                    for edge in snap.edges() {
                        assert!(snap.contains(&edge.source));
                        assert!(snap.contains(&edge.target));
                    }
                }
            })
        };

        writer.join().unwrap();
        reader.join().unwrap();
        assert_eq!(store.node_count(), 250);
    }

    #[test]
    fn test_get_node_not_found() {
        let store = GraphStore::new();
        assert!(matches!(
            store.get_node(&NodeId::from("ghost")),
            Err(GraphError::NodeNotFound(_))
        ));
    }
}
