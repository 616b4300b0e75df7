//! # Job Coordinator Subsystem
//!
//! ## Purpose
//!
//! The admission and scheduling fabric in front of the cascade engine:
//! fingerprints each submission against the current graph version, attaches
//! duplicate in-flight requests to one execution, bounds concurrency with a
//! worker pool plus a fixed admission queue (fail-fast beyond that), threads
//! a cancellation flag into every run, and publishes job lifecycle events on
//! the bus.
//!
//! ## Dedup Contract
//!
//! Two submissions with the same fingerprint (identical request against an
//! identical snapshot version) share a single execution; every attached
//! handle resolves to the same shared aggregate. Cancelling a handle only
//! detaches it; the underlying job is cancelled when the last handle
//! detaches.

pub mod config;
pub mod domain;
pub mod service;

pub use config::CoordinatorConfig;
pub use domain::errors::CoordinatorError;
pub use domain::fingerprint::Fingerprint;
pub use domain::job::{JobHandle, JobOutcome};
pub use service::coordinator::JobCoordinator;
