//! Adapters connecting the graph store's ports to the shared bus.

pub mod publisher;

pub use publisher::BusMutationSink;
