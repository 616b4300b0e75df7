//! # Ingestion Pipeline Subsystem
//!
//! ## Purpose
//!
//! Accepts streaming telemetry records at high rate, validates them against
//! the closed set of recognized schemas, enforces per-source timestamp
//! ordering, and applies the derived mutations to the graph store through a
//! bounded buffer with explicit back-pressure. Applied mutations reach
//! subscribers via the store's `graph.mutation` events; unrecognized record
//! types pass through on `ingest.passthrough` untouched.
//!
//! ## Admission Rules (in order)
//!
//! | Check | Rejection |
//! |-------|-----------|
//! | `quality_score` ≥ configured threshold | `low_quality` |
//! | payload matches the `data_type` schema | `invalid_schema` |
//! | timestamp not older than the newest accepted for the source | `stale` |
//! | bounded buffer has room | `backpressure` |
//!
//! Admission is synchronous and non-blocking; the caller always learns the
//! outcome immediately. Application happens on a single drain task, which
//! preserves the admitted per-source timestamp order end to end.

pub mod config;
pub mod domain;
pub mod service;

pub use config::IngestionConfig;
pub use domain::batch::BatchSummary;
pub use domain::errors::{IngestError, RejectReason};
pub use domain::record::DerivedMutation;
pub use service::pipeline::IngestionPipeline;
