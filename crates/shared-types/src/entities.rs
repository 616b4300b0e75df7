//! # Graph Entities
//!
//! Nodes and directed dependency edges of the infrastructure graph.
//!
//! An edge `A → B` reads "A depends on B": when B fails, the failure may
//! propagate against the edge direction onto A. The graph store enforces the
//! structural invariants (no self-loops, no dangling endpoints, at most one
//! edge per ordered pair); the numeric range invariants live on the entities
//! themselves via [`InfrastructureNode::validate`] and
//! [`DependencyEdge::validate`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Opaque key→value bag attached to nodes and edges.
///
/// Never interpreted by the core; carried through mutations and snapshots
/// untouched. `BTreeMap` keeps serialized output deterministic.
pub type PropertyMap = BTreeMap<String, serde_json::Value>;

/// Stable, globally unique node identifier.
///
/// Ordering is lexicographic on the underlying string; every deterministic
/// tie-break in the engine (BFS order, cause attribution, path ranking) relies
/// on this `Ord`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Creates a node id from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The underlying identifier string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Infrastructure sector a node belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Power,
    Water,
    Telecom,
    Transport,
    Healthcare,
    Emergency,
    Other,
}

/// Geographic position (latitude, longitude) in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// A node in the dependency graph.
///
/// `capacity` units are opaque but consistent per [`NodeKind`]; the ratio
/// `load / capacity` is the load factor used by the scorer and the cascade
/// engine. `criticality` is derived state written back by the scorer, never
/// authoritative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfrastructureNode {
    pub id: NodeId,
    pub kind: NodeKind,
    /// Non-negative, units opaque per kind.
    pub capacity: f64,
    /// Non-negative current load.
    #[serde(default)]
    pub load: f64,
    /// Health in [0, 1]; 1 = fully healthy, 0 = failed.
    #[serde(default = "default_health")]
    pub health: f64,
    /// Derived criticality in [0, 1].
    #[serde(default = "default_criticality")]
    pub criticality: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
    #[serde(default, skip_serializing_if = "PropertyMap::is_empty")]
    pub properties: PropertyMap,
    /// Milliseconds since epoch of the last applied mutation.
    /// Monotonically non-decreasing per node.
    #[serde(default)]
    pub updated_at: u64,
}

fn default_health() -> f64 {
    1.0
}

fn default_criticality() -> f64 {
    0.5
}

impl InfrastructureNode {
    /// Creates a node with default health, criticality and empty properties.
    pub fn new(id: impl Into<NodeId>, kind: NodeKind, capacity: f64) -> Self {
        Self {
            id: id.into(),
            kind,
            capacity,
            load: 0.0,
            health: default_health(),
            criticality: default_criticality(),
            location: None,
            properties: PropertyMap::new(),
            updated_at: 0,
        }
    }

    /// Builder-style load setter, used heavily in tests and fixtures.
    #[must_use]
    pub fn with_load(mut self, load: f64) -> Self {
        self.load = load;
        self
    }

    /// Builder-style health setter.
    #[must_use]
    pub fn with_health(mut self, health: f64) -> Self {
        self.health = health;
        self
    }

    /// `load / capacity`, or 0 for zero-capacity nodes.
    #[must_use]
    pub fn load_factor(&self) -> f64 {
        if self.capacity > 0.0 {
            self.load / self.capacity
        } else {
            0.0
        }
    }

    /// Checks the numeric range invariants.
    ///
    /// # Errors
    ///
    /// Returns the first violated field as `(field, value)`.
    pub fn validate(&self) -> Result<(), (&'static str, f64)> {
        if !self.capacity.is_finite() || self.capacity < 0.0 {
            return Err(("capacity", self.capacity));
        }
        if !self.load.is_finite() || self.load < 0.0 {
            return Err(("load", self.load));
        }
        if !self.health.is_finite() || !(0.0..=1.0).contains(&self.health) {
            return Err(("health", self.health));
        }
        if !self.criticality.is_finite() || !(0.0..=1.0).contains(&self.criticality) {
            return Err(("criticality", self.criticality));
        }
        Ok(())
    }
}

/// A directed dependency edge: `source` depends on `target`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub source: NodeId,
    pub target: NodeId,
    /// How strongly the source's function requires the target, in [0, 1].
    pub strength: f64,
    /// Base probability that the target's failure cascades to the source,
    /// in [0, 1]. Modulated per event by the multiplier table.
    pub propagation_probability: f64,
    /// Propagation delay in milliseconds; converted to simulation minutes
    /// when a failure time is recorded.
    #[serde(default)]
    pub latency_ms: f64,
    #[serde(default, skip_serializing_if = "PropertyMap::is_empty")]
    pub properties: PropertyMap,
}

impl DependencyEdge {
    /// Creates an edge with empty properties.
    pub fn new(
        source: impl Into<NodeId>,
        target: impl Into<NodeId>,
        strength: f64,
        propagation_probability: f64,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            strength,
            propagation_probability,
            latency_ms: 0.0,
            properties: PropertyMap::new(),
        }
    }

    /// Builder-style latency setter.
    #[must_use]
    pub fn with_latency_ms(mut self, latency_ms: f64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    /// Checks the numeric range invariants (self-loop and endpoint existence
    /// are structural and checked by the graph store).
    ///
    /// # Errors
    ///
    /// Returns the first violated field as `(field, value)`.
    pub fn validate(&self) -> Result<(), (&'static str, f64)> {
        if !self.strength.is_finite() || !(0.0..=1.0).contains(&self.strength) {
            return Err(("strength", self.strength));
        }
        if !self.propagation_probability.is_finite()
            || !(0.0..=1.0).contains(&self.propagation_probability)
        {
            return Err(("propagation_probability", self.propagation_probability));
        }
        if !self.latency_ms.is_finite() || self.latency_ms < 0.0 {
            return Err(("latency_ms", self.latency_ms));
        }
        Ok(())
    }
}
