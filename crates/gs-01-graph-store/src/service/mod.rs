//! Service layer: the concurrent store wrapping the domain graph.

pub mod store;
