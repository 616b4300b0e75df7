//! # Telemetry Wire Record
//!
//! The accepted ingestion wire format. Records arrive from external
//! collaborators (gateway adapters, replayed feeds) and are validated and
//! applied by the ingestion pipeline; records with an unrecognized
//! `data_type` pass through the fan-out untouched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `data_type` values the core recognizes and applies to the graph.
///
/// Any other value is forwarded to subscribers but never applied.
pub mod data_types {
    /// Partial node update: `{ "node_id": ..., "load": ... }`.
    pub const SENSOR_LOAD: &str = "sensor.load";
    /// Partial node update: `{ "node_id": ..., "health": ... }`.
    pub const SENSOR_HEALTH: &str = "sensor.health";
    /// Full node insert-or-update; payload is an `InfrastructureNode`.
    pub const NODE_UPSERT: &str = "topology.node.upsert";
    /// Node removal: `{ "node_id": ... }`.
    pub const NODE_REMOVE: &str = "topology.node.remove";
    /// Full edge insert-or-update; payload is a `DependencyEdge`.
    pub const EDGE_UPSERT: &str = "topology.edge.upsert";
    /// Edge removal: `{ "source": ..., "target": ... }`.
    pub const EDGE_REMOVE: &str = "topology.edge.remove";
}

/// A single ingested telemetry record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    /// Identifies the producing feed; ordering is enforced per source.
    pub source_id: String,
    /// Producer timestamp (ISO-8601 on the wire).
    pub timestamp: DateTime<Utc>,
    /// Discriminator; see [`data_types`].
    pub data_type: String,
    /// Schema depends on `data_type`.
    pub payload: serde_json::Value,
    /// Producer-asserted quality in [0, 1]; records below the configured
    /// threshold are rejected.
    #[serde(default = "default_quality")]
    pub quality_score: f64,
}

fn default_quality() -> f64 {
    1.0
}

impl TelemetryRecord {
    /// Producer timestamp as milliseconds since the epoch.
    #[must_use]
    pub fn timestamp_ms(&self) -> u64 {
        self.timestamp.timestamp_millis().max(0) as u64
    }
}
