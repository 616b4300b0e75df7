//! # Bottleneck Ranking
//!
//! Ranks nodes by marginal contribution: the expected reduction in per-run
//! impact had the node been hardened (never failed). Rather than re-running
//! the Monte Carlo without each candidate, the recorded trajectories are
//! replayed: removing a node removes every failure whose cause chain passes
//! through it, and the impact delta is summed over runs. Cost stays linear
//! in the recorded failures.

use shared_types::{Bottleneck, NodeId, RunResult, SimulationRequest};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Ranks the top `limit` bottleneck candidates over the recorded runs.
///
/// Initial failures are excluded: they are the scenario, not a hardening
/// opportunity.
#[must_use]
pub fn rank_bottlenecks(
    runs: &[RunResult],
    request: &SimulationRequest,
    criticality: &dyn Fn(&NodeId) -> f64,
    limit: usize,
) -> Vec<Bottleneck> {
    if runs.is_empty() || limit == 0 {
        return Vec::new();
    }

    let initial: BTreeSet<&NodeId> = request.initial_failures().iter().collect();
    let tau = request.horizon_minutes / 4.0;

    let mut candidates: BTreeSet<&NodeId> = BTreeSet::new();
    for run in runs {
        candidates.extend(run.failed.iter().filter(|id| !initial.contains(id)));
    }
    if candidates.is_empty() {
        return Vec::new();
    }

    let mut reduction: BTreeMap<&NodeId, f64> = BTreeMap::new();
    for run in runs {
        // First-failure cause forest, children keyed by parent.
        let mut children: HashMap<&NodeId, Vec<&NodeId>> = HashMap::new();
        let mut seen: BTreeSet<&NodeId> = BTreeSet::new();
        for record in &run.timeline {
            if !seen.insert(&record.node) {
                continue;
            }
            if let Some(cause) = record.cause.as_ref().filter(|c| **c != record.node) {
                children.entry(cause).or_default().push(&record.node);
            }
        }

        let contribution = |id: &NodeId| -> f64 {
            run.time_to_failure
                .get(id)
                .map_or(0.0, |t| criticality(id) * (1.0 + (-t / tau).exp()))
        };

        for candidate in candidates.iter().copied() {
            if !run.failed.contains(candidate) {
                continue;
            }
            // Replay: the candidate and every transitive consequence of it
            // drop out of the trajectory.
            let mut removed = 0.0;
            let mut stack: Vec<&NodeId> = vec![candidate];
            let mut visited: BTreeSet<&NodeId> = BTreeSet::new();
            while let Some(id) = stack.pop() {
                if !visited.insert(id) {
                    continue;
                }
                removed += contribution(id);
                if let Some(kids) = children.get(id) {
                    stack.extend(kids.iter().copied());
                }
            }
            *reduction.entry(candidate).or_insert(0.0) += removed;
        }
    }

    let total_runs = runs.len() as f64;
    let mut ranked: Vec<Bottleneck> = reduction
        .into_iter()
        .map(|(node, total)| Bottleneck {
            node: node.clone(),
            expected_impact_reduction: total / total_runs,
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.expected_impact_reduction
            .partial_cmp(&a.expected_impact_reduction)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.node.cmp(&b.node))
    });
    ranked.truncate(limit);
    ranked
}
