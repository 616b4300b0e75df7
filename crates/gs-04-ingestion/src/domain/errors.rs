//! # Ingestion Errors
//!
//! Rejections are part of normal operation: the pipeline recovers locally
//! from stale, low-quality and back-pressure rejections, and the caller
//! decides whether to retry (back-pressure) or drop (the rest).

use thiserror::Error;

/// Why a record was rejected at admission.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum IngestError {
    /// The payload does not match the schema for its `data_type`.
    #[error("invalid schema for {data_type}: {detail}")]
    InvalidSchema { data_type: String, detail: String },

    /// `quality_score` below the configured threshold.
    #[error("quality {score} below threshold {threshold}")]
    LowQuality { score: f64, threshold: f64 },

    /// Older than the newest accepted record for the same source.
    #[error("stale record for {source_id}: {timestamp_ms} < {newest_ms}")]
    Stale {
        source_id: String,
        timestamp_ms: u64,
        newest_ms: u64,
    },

    /// The bounded buffer is full; retry with delay.
    #[error("ingestion buffer full")]
    Backpressure,

    /// The pipeline has shut down.
    #[error("ingestion pipeline closed")]
    Closed,
}

/// Coarse rejection class, used as the key in batch summaries and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RejectReason {
    InvalidSchema,
    LowQuality,
    Stale,
    Backpressure,
    Closed,
}

impl RejectReason {
    /// Stable label for summaries and metric dimensions.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::InvalidSchema => "invalid_schema",
            RejectReason::LowQuality => "low_quality",
            RejectReason::Stale => "stale",
            RejectReason::Backpressure => "backpressure",
            RejectReason::Closed => "closed",
        }
    }
}

impl IngestError {
    /// The coarse class of this rejection.
    #[must_use]
    pub fn reason(&self) -> RejectReason {
        match self {
            IngestError::InvalidSchema { .. } => RejectReason::InvalidSchema,
            IngestError::LowQuality { .. } => RejectReason::LowQuality,
            IngestError::Stale { .. } => RejectReason::Stale,
            IngestError::Backpressure => RejectReason::Backpressure,
            IngestError::Closed => RejectReason::Closed,
        }
    }
}
