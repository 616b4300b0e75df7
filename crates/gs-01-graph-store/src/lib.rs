//! # Dependency Graph Store Subsystem
//!
//! ## Purpose
//!
//! Owns the live infrastructure dependency graph: typed nodes and directed
//! dependency edges, mutated concurrently by the ingestion pipeline and admin
//! calls, read through logically immutable snapshots by the criticality
//! scorer and the cascade engine.
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement Location |
//! |-----------|---------------------|
//! | No self-loop edges | `domain/graph.rs` - `add_edge()` |
//! | At most one edge per ordered pair | `domain/graph.rs` - keyed adjacency map |
//! | Edge endpoints always exist | `domain/graph.rs` - `add_edge()` / `remove_node()` cascade |
//! | Numeric ranges (capacity, load, health, criticality) | entity `validate()` at every mutation |
//! | `updated_at` monotonically non-decreasing per node | `domain/graph.rs` - `update_node()` |
//! | Readers never see a torn structure | `service/store.rs` - single write lease |
//! | Snapshots unaffected by later mutations | `domain/snapshot.rs` - structural copy |
//!
//! ## Module Structure
//!
//! ```text
//! domain/graph.rs    - DependencyGraph: adjacency maps, mutation primitives, BFS
//! domain/snapshot.rs - GraphSnapshot: immutable, deterministically ordered view
//! domain/errors.rs   - GraphError enum
//! ports/outbound.rs  - MutationSink trait (fan-out decoupling)
//! adapters/          - MutationSink implementation over the shared bus
//! service/store.rs   - GraphStore: lock discipline, versioning, publication
//! ```

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use domain::errors::GraphError;
pub use domain::graph::{Applied, DependencyGraph, Direction, NodeUpdate};
pub use domain::snapshot::GraphSnapshot;
pub use ports::outbound::MutationSink;
pub use service::store::GraphStore;
