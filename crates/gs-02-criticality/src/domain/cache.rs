//! # Score Cache
//!
//! One memoized score map per graph version, bounded by wall-clock
//! staleness. A cached map is recomputed when the snapshot version moves
//! *or* the map outlives the staleness bound — scores are never silently
//! stale beyond that bound.

use crate::ports::CriticalityScorer;
use gs_01_graph_store::GraphSnapshot;
use parking_lot::RwLock;
use shared_types::NodeId;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

struct CachedScores {
    version: u64,
    computed_at: Instant,
    scores: Arc<BTreeMap<NodeId, f64>>,
}

/// Memoizes scorer output per graph version.
pub struct ScoreCache {
    staleness_bound: Duration,
    entry: RwLock<Option<CachedScores>>,
}

impl ScoreCache {
    /// Creates a cache with the given wall-clock staleness bound.
    #[must_use]
    pub fn new(staleness_bound: Duration) -> Self {
        Self {
            staleness_bound,
            entry: RwLock::new(None),
        }
    }

    /// Returns cached scores for the snapshot's version, computing them via
    /// `scorer` when missing, version-mismatched, or older than the
    /// staleness bound.
    pub fn get_or_compute(
        &self,
        snapshot: &GraphSnapshot,
        scorer: &dyn CriticalityScorer,
    ) -> Arc<BTreeMap<NodeId, f64>> {
        {
            let entry = self.entry.read();
            if let Some(cached) = entry.as_ref() {
                if cached.version == snapshot.version()
                    && cached.computed_at.elapsed() < self.staleness_bound
                {
                    return Arc::clone(&cached.scores);
                }
            }
        }

        let scores = Arc::new(scorer.score(snapshot));
        debug!(
            version = snapshot.version(),
            nodes = scores.len(),
            "Score cache refreshed"
        );
        *self.entry.write() = Some(CachedScores {
            version: snapshot.version(),
            computed_at: Instant::now(),
            scores: Arc::clone(&scores),
        });
        scores
    }

    /// Drops any cached entry; the next lookup recomputes.
    pub fn invalidate(&self) {
        *self.entry.write() = None;
    }
}
