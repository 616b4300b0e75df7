//! Configuration for the ingestion pipeline.

use serde::{Deserialize, Serialize};

/// Pipeline admission and buffering knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionConfig {
    /// Bounded buffer between admission and graph application. When full,
    /// further records are rejected with back-pressure instead of growing
    /// memory.
    pub buffer_capacity: usize,
    /// Records with `quality_score` below this are rejected.
    pub quality_threshold: f64,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: 1000,
            quality_threshold: 0.5,
        }
    }
}
