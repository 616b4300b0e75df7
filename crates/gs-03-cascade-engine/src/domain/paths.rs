//! # Critical Path Extraction
//!
//! Each run's `cause` pointers form a failure forest rooted at the initial
//! failures (and at spontaneous stress failures). A chain walks from a root
//! down to a terminal failure. Chains are tallied across runs; the top-K by
//! frequency are reported, ties broken by the total criticality along the
//! chain and then lexicographically.
//!
//! Cause pointers can form cycles on pathological inputs (a node that
//! recovers and later re-fails via its own downstream); the upward trace
//! carries a visited set and stops deterministically on the first repeat.

use shared_types::{CriticalPath, NodeId, RunResult};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Chains from roots to terminal failures for one run, based on each node's
/// first failure.
#[must_use]
pub fn extract_chains(run: &RunResult) -> Vec<Vec<NodeId>> {
    // First-failure cause per node.
    let mut cause: BTreeMap<&NodeId, Option<&NodeId>> = BTreeMap::new();
    for record in &run.timeline {
        cause
            .entry(&record.node)
            .or_insert(record.cause.as_ref().filter(|c| **c != record.node));
    }

    // A node is terminal when no other failure names it as cause.
    let parents: BTreeSet<&NodeId> = cause.values().flatten().copied().collect();
    let leaves: Vec<&NodeId> = cause
        .keys()
        .copied()
        .filter(|node| !parents.contains(node))
        .collect();

    let mut chains = Vec::new();
    for leaf in leaves {
        let mut chain: Vec<NodeId> = vec![leaf.clone()];
        let mut visited: BTreeSet<&NodeId> = BTreeSet::new();
        visited.insert(leaf);
        let mut current = leaf;
        while let Some(&Some(parent)) = cause.get(current) {
            if !visited.insert(parent) {
                break;
            }
            chain.push(parent.clone());
            current = parent;
        }
        chain.reverse();
        chains.push(chain);
    }
    chains
}

/// Tallies chains across runs and returns the top `k`.
///
/// Ordered by decreasing frequency; equal frequencies rank the chain with
/// the higher total criticality first, then the lexicographically smaller
/// chain.
#[must_use]
pub fn top_critical_paths(
    runs: &[RunResult],
    scores: &BTreeMap<NodeId, f64>,
    k: usize,
) -> Vec<CriticalPath> {
    let mut tally: HashMap<Vec<NodeId>, u32> = HashMap::new();
    for run in runs {
        for chain in extract_chains(run) {
            *tally.entry(chain).or_insert(0) += 1;
        }
    }

    let chain_weight = |chain: &[NodeId]| -> f64 {
        chain
            .iter()
            .map(|id| scores.get(id).copied().unwrap_or(0.0))
            .sum()
    };

    let mut ranked: Vec<(Vec<NodeId>, u32)> = tally.into_iter().collect();
    ranked.sort_by(|(chain_a, count_a), (chain_b, count_b)| {
        count_b
            .cmp(count_a)
            .then_with(|| {
                chain_weight(chain_b)
                    .partial_cmp(&chain_weight(chain_a))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .then_with(|| chain_a.cmp(chain_b))
    });

    ranked
        .into_iter()
        .take(k)
        .map(|(chain, occurrences)| CriticalPath { chain, occurrences })
        .collect()
}
