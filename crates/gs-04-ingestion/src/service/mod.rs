//! Service layer: the admission gate and drain task.

pub mod pipeline;
