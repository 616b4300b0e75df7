//! # Graph Mutation Notifications
//!
//! Emitted by the graph store after every applied mutation and fanned out on
//! the `graph.mutation` topic. Carries identifiers only; subscribers that
//! need full entity state read it through a snapshot.

use crate::entities::NodeId;
use serde::{Deserialize, Serialize};

/// One applied graph mutation, tagged with the graph version it produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "op")]
pub enum MutationEvent {
    NodeAdded { id: NodeId, version: u64 },
    NodeUpdated { id: NodeId, version: u64 },
    NodeRemoved { id: NodeId, version: u64 },
    EdgeAdded { source: NodeId, target: NodeId, version: u64 },
    EdgeUpdated { source: NodeId, target: NodeId, version: u64 },
    EdgeRemoved { source: NodeId, target: NodeId, version: u64 },
}

impl MutationEvent {
    /// The graph version produced by this mutation.
    #[must_use]
    pub fn version(&self) -> u64 {
        match self {
            MutationEvent::NodeAdded { version, .. }
            | MutationEvent::NodeUpdated { version, .. }
            | MutationEvent::NodeRemoved { version, .. }
            | MutationEvent::EdgeAdded { version, .. }
            | MutationEvent::EdgeUpdated { version, .. }
            | MutationEvent::EdgeRemoved { version, .. } => *version,
        }
    }
}
