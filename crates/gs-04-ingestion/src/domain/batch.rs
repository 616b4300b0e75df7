//! Batch ingestion summary.

use super::errors::RejectReason;
use serde::Serialize;
use std::collections::BTreeMap;

/// Outcome tally for one batch of records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub accepted: usize,
    /// Rejection counts keyed by the stable reason label.
    pub rejected_by_reason: BTreeMap<&'static str, usize>,
}

impl BatchSummary {
    /// Total records rejected across all reasons.
    #[must_use]
    pub fn rejected(&self) -> usize {
        self.rejected_by_reason.values().sum()
    }

    pub(crate) fn record_accept(&mut self) {
        self.accepted += 1;
    }

    pub(crate) fn record_reject(&mut self, reason: RejectReason) {
        *self.rejected_by_reason.entry(reason.as_str()).or_insert(0) += 1;
    }
}
