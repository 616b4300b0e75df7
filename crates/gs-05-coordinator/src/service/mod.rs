//! Service layer: admission, scheduling and publication.

pub mod coordinator;
