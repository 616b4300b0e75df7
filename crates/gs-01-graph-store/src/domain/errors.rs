//! # Graph Store Errors
//!
//! Typed outcomes for every mutation and query. Invariant violations and
//! not-found conditions are always reported, never silently coerced.

use shared_types::NodeId;
use thiserror::Error;

/// Errors from graph mutations and queries.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GraphError {
    /// Insert conflict: the node id is already present.
    #[error("node already exists: {0}")]
    NodeExists(NodeId),

    /// Referenced node is absent.
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    /// Insert conflict: an edge for this ordered pair is already present.
    #[error("edge already exists: {edge_source} -> {target}")]
    EdgeExists { edge_source: NodeId, target: NodeId },

    /// Referenced edge is absent.
    #[error("edge not found: {edge_source} -> {target}")]
    EdgeNotFound { edge_source: NodeId, target: NodeId },

    /// A node cannot depend on itself.
    #[error("self-loop rejected: {0}")]
    SelfLoop(NodeId),

    /// A numeric attribute is outside its allowed range.
    #[error("invalid {field}: {value}")]
    InvalidAttribute { field: &'static str, value: f64 },
}

impl GraphError {
    pub(crate) fn from_violation((field, value): (&'static str, f64)) -> Self {
        GraphError::InvalidAttribute { field, value }
    }
}
