//! Outbound ports: dependencies the graph store needs from the outside.

pub mod outbound;
