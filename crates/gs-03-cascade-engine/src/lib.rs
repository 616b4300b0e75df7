//! # Cascade Simulation Engine Subsystem
//!
//! ## Purpose
//!
//! Given an immutable graph snapshot, a criticality score map and a
//! simulation request, predicts which additional nodes fail, with what
//! probability, in what order and with what aggregate impact, by running
//! many independent stochastic propagation trials and aggregating them.
//!
//! ## Propagation Model
//!
//! Failures travel *against* dependency edges: when `B` fails, every node
//! with an edge `→ B` is hazarded each tick with
//! `base · edge.propagation_probability · edge.strength · event_multiplier`,
//! hazards combined across failed dependencies by noisy-OR, plus a stress
//! term once redistributed load pushes the effective load factor past the
//! request threshold. Recovery, when enabled, is a per-tick Bernoulli once a
//! node's failed dependencies have all recovered.
//!
//! ## Reproducibility
//!
//! Runs are embarrassingly parallel and draw from per-run RNGs seeded as
//! `hash(master_seed, run_index)`. Identical (snapshot, request) inputs
//! produce bit-identical aggregates; see `domain/seeds.rs`.
//!
//! ## Module Structure
//!
//! ```text
//! config.rs            - CascadeConfig: knobs, work budget, multiplier table
//! domain/multiplier.rs - event/environment modulation of edge hazards
//! domain/seeds.rs      - deterministic per-run seed derivation
//! domain/run.rs        - single-run tick loop
//! domain/stats.rs      - percentile confidence intervals, impact penalty
//! domain/paths.rs      - critical-path extraction over cause forests
//! domain/bottleneck.rs - trajectory-replay bottleneck ranking
//! domain/aggregate.rs  - Monte-Carlo aggregation and recommendations
//! service/engine.rs    - validation, budgeting, parallel execution, retry
//! ```

pub mod config;
pub mod domain;
pub mod service;

pub use config::CascadeConfig;
pub use domain::errors::CascadeError;
pub use domain::multiplier::MultiplierTable;
pub use service::engine::CascadeEngine;
