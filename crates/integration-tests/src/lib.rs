//! # Integration Tests Crate
//!
//! End-to-end scenarios exercising the assembled platform: telemetry in
//! through the ingestion pipeline, graph state through the store,
//! simulations through the coordinator and cascade engine, events out
//! through the bus.
//!
//! ## Scenario Coverage
//!
//! 1. **Two-node deterministic cascade** - power plant failure reaches the
//!    hospital with probability 1 after one latency hop
//! 2. **Isolated node** - no dependency path, no failure
//! 3. **Branching determinism** - identical requests reproduce identical
//!    aggregates; symmetric branches fail symmetrically
//! 4. **Dedup** - concurrent identical submissions share one execution
//! 5. **Back-pressure** - sustained overload rejects without losing
//!    accepted records or growing memory
//! 6. **Stale drop** - out-of-order telemetry per source is rejected

pub mod scenarios;
