//! # Criticality Scorer Subsystem
//!
//! ## Purpose
//!
//! Turns a graph snapshot into a `{node → score in [0, 1]}` map summarizing
//! how much the surrounding graph leans on each node. The cascade engine
//! weighs impact by these scores; operators read them back through the graph
//! store's critical-nodes query.
//!
//! ## Pluggability
//!
//! [`CriticalityScorer`] is the seam: the default
//! [`CentralityBlendScorer`] is an analytic blend, and a learned model can
//! replace it by implementing the same trait with the same numeric range.
//!
//! ## Caching
//!
//! Scores are pure in the snapshot, so [`ScoreCache`] memoizes one result
//! per graph version with a wall-clock staleness bound; a cached map is
//! never served past that bound even if the version has not moved.

pub mod config;
pub mod domain;
pub mod ports;

pub use config::ScorerConfig;
pub use domain::blend::CentralityBlendScorer;
pub use domain::cache::ScoreCache;
pub use ports::CriticalityScorer;
