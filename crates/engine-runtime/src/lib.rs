//! # Grid Sentinel Engine Runtime
//!
//! Builds and owns the core: one explicitly constructed
//! [`ResiliencePlatform`] wires the graph store, scorer, cascade engine,
//! ingestion pipeline, coordinator and bus together, with a bounded
//! lifetime (`new` … `shutdown`) and no process-wide globals.
//!
//! ```text
//!      telemetry records            simulation requests
//!             │                             │
//!             ▼                             ▼
//!    ┌─────────────────┐          ┌──────────────────┐
//!    │ Ingestion (04)  │          │ Coordinator (05) │
//!    └────────┬────────┘          └───────┬──────────┘
//!             │ mutations                 │ snapshot + scores
//!             ▼                           ▼
//!    ┌─────────────────┐  snapshot ┌──────────────────┐
//!    │ Graph Store (01)│──────────▶│ Cascade Eng. (03)│
//!    └────────┬────────┘           └───────┬──────────┘
//!             │ graph.mutation             │ simulation.*
//!             └──────────┬────────────────┘
//!                        ▼
//!                 ┌─────────────┐
//!                 │ Shared Bus  │──▶ subscribers
//!                 └─────────────┘
//! ```
//!
//! The criticality scorer (02) is consulted through a per-version cache
//! wherever a snapshot needs scores.

pub mod container;
pub mod persistence;
pub mod wiring;

pub use container::config::EngineConfig;
pub use container::platform::ResiliencePlatform;
pub use persistence::PersistenceError;
