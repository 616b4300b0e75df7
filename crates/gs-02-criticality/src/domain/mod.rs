//! Domain layer: the default blend and the per-version score cache.

pub mod blend;
pub mod cache;
