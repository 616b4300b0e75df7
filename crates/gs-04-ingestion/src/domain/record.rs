//! # Record Schemas
//!
//! The loose wire payload is re-expressed as a closed set of tagged
//! mutations, one per recognized `data_type`. Schema *and* numeric range
//! violations are caught here at admission time, so an accepted record can
//! only fail later for a reason the producer could not have known
//! (a sensor update racing a node removal).

use super::errors::IngestError;
use serde::Deserialize;
use shared_types::{data_types, DependencyEdge, InfrastructureNode, NodeId, TelemetryRecord};

/// Graph mutation derived from a recognized record, or `Passthrough` for
/// everything else.
#[derive(Debug, Clone, PartialEq)]
pub enum DerivedMutation {
    SensorLoad { node_id: NodeId, load: f64 },
    SensorHealth { node_id: NodeId, health: f64 },
    NodeUpsert(Box<InfrastructureNode>),
    NodeRemove { node_id: NodeId },
    EdgeUpsert(Box<DependencyEdge>),
    EdgeRemove { source: NodeId, target: NodeId },
    /// Unrecognized `data_type`: forwarded to subscribers, never applied.
    Passthrough,
}

#[derive(Deserialize)]
struct SensorLoadPayload {
    node_id: NodeId,
    load: f64,
}

#[derive(Deserialize)]
struct SensorHealthPayload {
    node_id: NodeId,
    health: f64,
}

#[derive(Deserialize)]
struct NodeRef {
    node_id: NodeId,
}

#[derive(Deserialize)]
struct EdgeRef {
    source: NodeId,
    target: NodeId,
}

/// Derives the mutation for a record.
///
/// # Errors
///
/// `InvalidSchema` when the payload does not deserialize for its
/// `data_type`, or a numeric field is out of range.
pub fn derive(record: &TelemetryRecord) -> Result<DerivedMutation, IngestError> {
    let invalid = |detail: String| IngestError::InvalidSchema {
        data_type: record.data_type.clone(),
        detail,
    };

    match record.data_type.as_str() {
        data_types::SENSOR_LOAD => {
            let payload: SensorLoadPayload = parse(record)?;
            if !payload.load.is_finite() || payload.load < 0.0 {
                return Err(invalid(format!("load {} out of range", payload.load)));
            }
            Ok(DerivedMutation::SensorLoad {
                node_id: payload.node_id,
                load: payload.load,
            })
        }
        data_types::SENSOR_HEALTH => {
            let payload: SensorHealthPayload = parse(record)?;
            if !payload.health.is_finite() || !(0.0..=1.0).contains(&payload.health) {
                return Err(invalid(format!("health {} out of range", payload.health)));
            }
            Ok(DerivedMutation::SensorHealth {
                node_id: payload.node_id,
                health: payload.health,
            })
        }
        data_types::NODE_UPSERT => {
            let mut node: InfrastructureNode = parse(record)?;
            node.validate()
                .map_err(|(field, value)| invalid(format!("{field} {value} out of range")))?;
            node.updated_at = node.updated_at.max(record.timestamp_ms());
            Ok(DerivedMutation::NodeUpsert(Box::new(node)))
        }
        data_types::NODE_REMOVE => {
            let payload: NodeRef = parse(record)?;
            Ok(DerivedMutation::NodeRemove {
                node_id: payload.node_id,
            })
        }
        data_types::EDGE_UPSERT => {
            let edge: DependencyEdge = parse(record)?;
            edge.validate()
                .map_err(|(field, value)| invalid(format!("{field} {value} out of range")))?;
            if edge.source == edge.target {
                return Err(invalid(format!("self-loop on {}", edge.source)));
            }
            Ok(DerivedMutation::EdgeUpsert(Box::new(edge)))
        }
        data_types::EDGE_REMOVE => {
            let payload: EdgeRef = parse(record)?;
            Ok(DerivedMutation::EdgeRemove {
                source: payload.source,
                target: payload.target,
            })
        }
        _ => Ok(DerivedMutation::Passthrough),
    }
}

fn parse<T: serde::de::DeserializeOwned>(record: &TelemetryRecord) -> Result<T, IngestError> {
    serde_json::from_value(record.payload.clone()).map_err(|e| IngestError::InvalidSchema {
        data_type: record.data_type.clone(),
        detail: e.to_string(),
    })
}
