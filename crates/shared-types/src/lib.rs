//! # Shared Types Crate
//!
//! Cross-subsystem domain entities for the Grid Sentinel resilience engine.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: every type that crosses a subsystem boundary
//!   (graph entities, simulation requests/results, wire records, mutation
//!   notifications) is defined here, never duplicated per crate.
//! - **Typed Boundaries**: external collaborators (REST surface, viewers)
//!   consume these types through the runtime; the core never exposes loose
//!   key-value payloads except the explicitly opaque `properties` maps.
//! - **Deterministic Collections**: result maps are `BTreeMap` keyed by
//!   `NodeId` so that serialized output is byte-stable for identical inputs.

pub mod cancel;
pub mod entities;
pub mod mutation;
pub mod simulation;
pub mod telemetry;

pub use cancel::CancelFlag;
pub use entities::{DependencyEdge, GeoPoint, InfrastructureNode, NodeId, NodeKind, PropertyMap};
pub use mutation::MutationEvent;
pub use simulation::{
    AggregateResult, Bottleneck, CriticalPath, DisruptionEvent, EnvironmentConditions, EventKind,
    FailureRecord, ResultQuality, RunResult, SimulationRequest,
};
pub use telemetry::{data_types, TelemetryRecord};
