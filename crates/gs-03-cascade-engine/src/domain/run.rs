//! # Single-Run Propagation
//!
//! One stochastic trial of the cascade. The simulation clock advances in
//! fixed ticks; each tick:
//!
//! 1. Every alive node combines the hazards of its currently-failed
//!    dependencies by noisy-OR, plus a stress term once redistributed load
//!    pushes its effective load factor past the request threshold.
//! 2. A Bernoulli sample per node decides this tick's failures,
//!    independently within the tick against tick-start state.
//! 3. A new failure is stamped at the tick-interval start plus the latency
//!    of the strongest contributing edge (that edge's upstream becomes the
//!    cause; ties resolve to the lexicographically smallest upstream). Pure
//!    stress failures are stamped at the tick time with no cause.
//! 4. A failed node sheds `α` of its effective load equally onto its
//!    still-alive dependents until it recovers.
//! 5. With recovery enabled, a failed node whose failed dependencies have
//!    all recovered flips back with per-tick probability
//!    `step / mean_recovery_time`, returning the load it shed.
//!
//! A run terminates at the horizon, when the failure frontier is closed and
//! recovery is off, or after a configured number of quiet ticks.

use crate::config::CascadeConfig;
use gs_01_graph_store::GraphSnapshot;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared_types::{CancelFlag, FailureRecord, NodeId, RunResult, SimulationRequest};
use std::collections::{BTreeMap, BTreeSet};

const MS_PER_MINUTE: f64 = 60_000.0;

/// The run observed a cancellation request at a tick boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interrupted;

/// Bookkeeping for a currently-failed node.
struct ActiveFailure {
    /// Load handed out to dependents, returned on recovery.
    grants: Vec<(NodeId, f64)>,
}

/// First-failure record; re-failures after recovery keep the original.
struct FirstFailure {
    t_minutes: f64,
    depth: u32,
}

/// Executes one Monte-Carlo trial.
///
/// Inputs must be pre-validated by the engine; `scores` supplies the
/// criticality used for impact weighting.
///
/// # Errors
///
/// Returns [`Interrupted`] when the cancel flag is observed.
pub fn single_run(
    snapshot: &GraphSnapshot,
    scores: &BTreeMap<NodeId, f64>,
    request: &SimulationRequest,
    config: &CascadeConfig,
    seed: u64,
    cancel: &CancelFlag,
) -> Result<RunResult, Interrupted> {
    let mut rng = StdRng::seed_from_u64(seed);
    let step = request.time_step_minutes;
    let horizon = request.horizon_minutes;
    let threshold = request.load_threshold_multiplier;

    let mut failed_now: BTreeMap<NodeId, ActiveFailure> = BTreeMap::new();
    let mut first_failure: BTreeMap<NodeId, FirstFailure> = BTreeMap::new();
    let mut extra_load: BTreeMap<NodeId, f64> = BTreeMap::new();
    let mut timeline: Vec<FailureRecord> = Vec::new();

    // t = 0: seed the initial failures, cause = self.
    let initial: BTreeSet<NodeId> = request.initial_failures().iter().cloned().collect();
    for id in &initial {
        failed_now.insert(id.clone(), ActiveFailure { grants: Vec::new() });
        first_failure.insert(
            id.clone(),
            FirstFailure {
                t_minutes: 0.0,
                depth: 0,
            },
        );
        timeline.push(FailureRecord {
            t_minutes: 0.0,
            node: id.clone(),
            cause: Some(id.clone()),
        });
    }
    for id in &initial {
        redistribute(id, snapshot, config, &mut failed_now, &mut extra_load);
    }

    let mut quiet_ticks: u32 = 0;

    for tick in 1..=request.tick_count() {
        if cancel.is_cancelled() {
            return Err(Interrupted);
        }

        let t = (tick as f64 * step).min(horizon);
        let interval_start = (tick - 1) as f64 * step;

        // Phase 1: hazards and sampling against tick-start state.
        let mut sampled: Vec<(NodeId, f64, Option<NodeId>)> = Vec::new();
        for node in snapshot.nodes() {
            if failed_now.contains_key(&node.id) {
                continue;
            }

            let mut survive = 1.0_f64;
            // Strongest contributing edge: (hazard, latency, upstream).
            let mut strongest: Option<(f64, f64, NodeId)> = None;
            for edge in snapshot.dependencies_of(&node.id) {
                if !failed_now.contains_key(&edge.target) {
                    continue;
                }
                let upstream_kind = match snapshot.node(&edge.target) {
                    Some(upstream) => upstream.kind,
                    None => continue,
                };
                let multiplier = config.event_multiplier_table.multiplier(
                    request.event.kind,
                    request.event.severity,
                    request.event.environment.as_ref(),
                    upstream_kind,
                );
                let hazard = (request.base_propagation_probability
                    * edge.propagation_probability
                    * edge.strength
                    * multiplier)
                    .clamp(0.0, 1.0);
                if hazard <= 0.0 {
                    continue;
                }
                survive *= 1.0 - hazard;
                // Strictly-greater keeps the first (smallest upstream id)
                // on ties; dependencies iterate in target-id order.
                if strongest.as_ref().map_or(true, |(best, _, _)| hazard > *best) {
                    strongest = Some((hazard, edge.latency_ms, edge.target.clone()));
                }
            }

            let effective = effective_load_factor(node, &extra_load);
            if threshold.is_finite() && effective > threshold {
                let stress_p = ((effective - threshold) * config.stress_sensitivity_k).min(1.0);
                survive *= 1.0 - stress_p;
            }

            let p = 1.0 - survive;
            if p <= 0.0 {
                continue;
            }
            if rng.gen::<f64>() < p {
                let (t_fail, cause) = match &strongest {
                    Some((_, latency_ms, upstream)) => (
                        interval_start + latency_ms / MS_PER_MINUTE,
                        Some(upstream.clone()),
                    ),
                    None => (t, None),
                };
                sampled.push((node.id.clone(), t_fail, cause));
            }
        }

        let mut changed = !sampled.is_empty();

        // Phase 2: apply failures in id order, shedding load as we go.
        for (id, t_fail, cause) in sampled {
            let depth = cause
                .as_ref()
                .and_then(|c| first_failure.get(c))
                .map_or(0, |f| f.depth + 1);
            failed_now.insert(id.clone(), ActiveFailure { grants: Vec::new() });
            first_failure.entry(id.clone()).or_insert(FirstFailure {
                t_minutes: t_fail,
                depth,
            });
            timeline.push(FailureRecord {
                t_minutes: t_fail,
                node: id.clone(),
                cause,
            });
            redistribute(&id, snapshot, config, &mut failed_now, &mut extra_load);
        }

        // Phase 3: recovery.
        if request.recovery_enabled {
            let p_recover = (step / request.mean_recovery_time_minutes).min(1.0);
            let candidates: Vec<NodeId> = failed_now.keys().cloned().collect();
            for id in candidates {
                let upstream_still_failed = snapshot
                    .dependencies_of(&id)
                    .any(|edge| failed_now.contains_key(&edge.target));
                if upstream_still_failed {
                    continue;
                }
                if rng.gen::<f64>() < p_recover {
                    recover(&id, &mut failed_now, &mut extra_load);
                    changed = true;
                }
            }
        }

        // Phase 4: termination.
        if changed {
            quiet_ticks = 0;
        } else {
            quiet_ticks += 1;
            if quiet_ticks >= config.quiet_tick_limit {
                break;
            }
        }
        if !request.recovery_enabled
            && frontier_closed(snapshot, &failed_now, &extra_load, threshold)
        {
            break;
        }
    }

    finalize(snapshot, scores, request, timeline, failed_now, first_failure)
}

fn effective_load_factor(
    node: &shared_types::InfrastructureNode,
    extra_load: &BTreeMap<NodeId, f64>,
) -> f64 {
    if node.capacity <= 0.0 {
        return 0.0;
    }
    (node.load + extra_load.get(&node.id).copied().unwrap_or(0.0)) / node.capacity
}

/// Sheds `α` of a freshly-failed node's effective load onto its still-alive
/// dependents, equally, and records the grants for return on recovery.
fn redistribute(
    id: &NodeId,
    snapshot: &GraphSnapshot,
    config: &CascadeConfig,
    failed_now: &mut BTreeMap<NodeId, ActiveFailure>,
    extra_load: &mut BTreeMap<NodeId, f64>,
) {
    let Some(node) = snapshot.node(id) else {
        return;
    };
    let total = config.recovery_fraction_alpha
        * (node.load + extra_load.get(id).copied().unwrap_or(0.0));
    if total <= 0.0 {
        return;
    }
    let recipients: Vec<NodeId> = snapshot
        .dependents_of(id)
        .filter(|dependent| !failed_now.contains_key(*dependent))
        .cloned()
        .collect();
    if recipients.is_empty() {
        return;
    }
    let share = total / recipients.len() as f64;
    let mut grants = Vec::with_capacity(recipients.len());
    for recipient in recipients {
        *extra_load.entry(recipient.clone()).or_insert(0.0) += share;
        grants.push((recipient, share));
    }
    if let Some(active) = failed_now.get_mut(id) {
        active.grants = grants;
    }
}

/// Clears a failure and returns the load it shed.
fn recover(
    id: &NodeId,
    failed_now: &mut BTreeMap<NodeId, ActiveFailure>,
    extra_load: &mut BTreeMap<NodeId, f64>,
) {
    let Some(active) = failed_now.remove(id) else {
        return;
    };
    for (recipient, amount) in active.grants {
        if let Some(current) = extra_load.get_mut(&recipient) {
            *current -= amount;
            if *current <= 1e-12 {
                extra_load.remove(&recipient);
            }
        }
    }
}

/// True when no further failure is possible: every failed node's dependents
/// have already failed and no alive node sits past the stress threshold.
fn frontier_closed(
    snapshot: &GraphSnapshot,
    failed_now: &BTreeMap<NodeId, ActiveFailure>,
    extra_load: &BTreeMap<NodeId, f64>,
    threshold: f64,
) -> bool {
    let propagation_possible = failed_now.keys().any(|id| {
        snapshot
            .dependents_of(id)
            .any(|dependent| !failed_now.contains_key(dependent))
    });
    if propagation_possible {
        return false;
    }
    if threshold.is_finite() {
        let stress_pending = snapshot
            .nodes()
            .filter(|node| !failed_now.contains_key(&node.id))
            .any(|node| effective_load_factor(node, extra_load) > threshold);
        if stress_pending {
            return false;
        }
    }
    true
}

fn finalize(
    snapshot: &GraphSnapshot,
    scores: &BTreeMap<NodeId, f64>,
    request: &SimulationRequest,
    mut timeline: Vec<FailureRecord>,
    failed_now: BTreeMap<NodeId, ActiveFailure>,
    first_failure: BTreeMap<NodeId, FirstFailure>,
) -> Result<RunResult, Interrupted> {
    timeline.sort_by(|a, b| {
        a.t_minutes
            .partial_cmp(&b.t_minutes)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.node.cmp(&b.node))
    });

    let tau = request.horizon_minutes / 4.0;
    let mut impact = 0.0;
    let mut max_chain_depth = 0;
    let mut time_to_failure = BTreeMap::new();
    for (id, record) in &first_failure {
        let criticality = scores.get(id).copied().unwrap_or_else(|| {
            snapshot.node(id).map_or(0.5, |node| node.criticality)
        });
        impact += criticality * (1.0 + (-record.t_minutes / tau).exp());
        max_chain_depth = max_chain_depth.max(record.depth);
        time_to_failure.insert(id.clone(), record.t_minutes);
    }

    Ok(RunResult {
        timeline,
        failed: first_failure.keys().cloned().collect(),
        still_failed: failed_now.keys().cloned().collect(),
        time_to_failure,
        impact,
        max_chain_depth,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use gs_01_graph_store::DependencyGraph;
    use shared_types::{
        DependencyEdge, DisruptionEvent, EventKind, InfrastructureNode, NodeKind,
    };

    fn request(initial: &[&str]) -> SimulationRequest {
        SimulationRequest {
            scenario_name: "test".into(),
            event: DisruptionEvent {
                kind: EventKind::Other,
                severity: 0.0,
                environment: None,
                initial_failures: initial.iter().map(|s| NodeId::from(*s)).collect(),
            },
            horizon_minutes: 10.0,
            time_step_minutes: 1.0,
            monte_carlo_runs: 1,
            confidence_level: 0.95,
            base_propagation_probability: 1.0,
            load_threshold_multiplier: f64::INFINITY,
            recovery_enabled: false,
            mean_recovery_time_minutes: 720.0,
        }
    }

    fn scores_for(snapshot: &GraphSnapshot) -> BTreeMap<NodeId, f64> {
        snapshot.node_ids().map(|id| (id.clone(), 0.5)).collect()
    }

    /// Power plant P supplies hospital H over a 60 s edge.
    fn two_node_snapshot() -> GraphSnapshot {
        let mut g = DependencyGraph::new();
        g.add_node(InfrastructureNode::new("P", NodeKind::Power, 100.0))
            .unwrap();
        g.add_node(InfrastructureNode::new("H", NodeKind::Healthcare, 100.0))
            .unwrap();
        g.add_edge(DependencyEdge::new("H", "P", 1.0, 1.0).with_latency_ms(60_000.0))
            .unwrap();
        g.snapshot()
    }

    #[test]
    fn test_deterministic_cascade_timing() {
        let snap = two_node_snapshot();
        let req = request(&["P"]);
        let result =
            single_run(&snap, &scores_for(&snap), &req, &CascadeConfig::default(), 7, &CancelFlag::new())
                .unwrap();

        assert!(result.failed.contains(&NodeId::from("P")));
        assert!(result.failed.contains(&NodeId::from("H")));
        assert_eq!(result.time_to_failure[&NodeId::from("P")], 0.0);
        // One 60 s hop after the initial failure.
        assert!((result.time_to_failure[&NodeId::from("H")] - 1.0).abs() < 1e-9);
        assert_eq!(result.max_chain_depth, 1);

        let causes: BTreeMap<&NodeId, &Option<NodeId>> = result
            .timeline
            .iter()
            .map(|r| (&r.node, &r.cause))
            .collect();
        assert_eq!(causes[&NodeId::from("H")], &Some(NodeId::from("P")));
    }

    #[test]
    fn test_isolated_node_never_fails() {
        let mut g = DependencyGraph::new();
        g.add_node(InfrastructureNode::new("P", NodeKind::Power, 100.0))
            .unwrap();
        g.add_node(InfrastructureNode::new("I", NodeKind::Water, 100.0))
            .unwrap();
        let snap = g.snapshot();
        let req = request(&["P"]);

        for seed in 0..20 {
            let result = single_run(
                &snap,
                &scores_for(&snap),
                &req,
                &CascadeConfig::default(),
                seed,
                &CancelFlag::new(),
            )
            .unwrap();
            assert!(!result.failed.contains(&NodeId::from("I")));
        }
    }

    #[test]
    fn test_same_seed_same_outcome() {
        let mut g = DependencyGraph::new();
        for id in ["P", "H1", "H2"] {
            g.add_node(InfrastructureNode::new(id, NodeKind::Power, 100.0))
                .unwrap();
        }
        g.add_edge(DependencyEdge::new("H1", "P", 1.0, 0.5)).unwrap();
        g.add_edge(DependencyEdge::new("H2", "P", 1.0, 0.5)).unwrap();
        let snap = g.snapshot();
        let req = request(&["P"]);
        let scores = scores_for(&snap);
        let config = CascadeConfig::default();

        let a = single_run(&snap, &scores, &req, &config, 99, &CancelFlag::new()).unwrap();
        let b = single_run(&snap, &scores, &req, &config, 99, &CancelFlag::new()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_stress_failure_via_redistribution() {
        // Failed pump sheds load onto its dependent, pushing it past the
        // threshold with no propagating edge probability at all.
        let mut g = DependencyGraph::new();
        g.add_node(
            InfrastructureNode::new("pump", NodeKind::Water, 100.0).with_load(100.0),
        )
        .unwrap();
        g.add_node(
            InfrastructureNode::new("plant", NodeKind::Water, 100.0).with_load(100.0),
        )
        .unwrap();
        g.add_edge(DependencyEdge::new("plant", "pump", 1.0, 0.0))
            .unwrap();
        let snap = g.snapshot();

        let mut req = request(&["pump"]);
        req.load_threshold_multiplier = 1.2;
        let config = CascadeConfig {
            stress_sensitivity_k: 10.0,
            ..CascadeConfig::default()
        };

        let result =
            single_run(&snap, &scores_for(&snap), &req, &config, 3, &CancelFlag::new()).unwrap();
        assert!(result.failed.contains(&NodeId::from("plant")));
        // Pure stress failure carries no cause.
        let plant_record = result
            .timeline
            .iter()
            .find(|r| r.node == NodeId::from("plant"))
            .unwrap();
        assert!(plant_record.cause.is_none());
    }

    #[test]
    fn test_recovery_clears_failure() {
        let mut g = DependencyGraph::new();
        g.add_node(InfrastructureNode::new("P", NodeKind::Power, 100.0).with_load(50.0))
            .unwrap();
        let snap = g.snapshot();

        let mut req = request(&["P"]);
        req.recovery_enabled = true;
        req.mean_recovery_time_minutes = 1.0; // recovers on the first tick
        req.horizon_minutes = 5.0;

        let result = single_run(
            &snap,
            &scores_for(&snap),
            &req,
            &CascadeConfig::default(),
            1,
            &CancelFlag::new(),
        )
        .unwrap();
        // It failed (and counts as failed) but is no longer failed at the end.
        assert!(result.failed.contains(&NodeId::from("P")));
        assert!(result.still_failed.is_empty());
    }

    #[test]
    fn test_frontier_closure_terminates_early() {
        let snap = two_node_snapshot();
        let mut req = request(&["P"]);
        req.horizon_minutes = 1e6;
        req.time_step_minutes = 1.0;

        // Must return promptly despite the enormous horizon.
        let result = single_run(
            &snap,
            &scores_for(&snap),
            &req,
            &CascadeConfig::default(),
            5,
            &CancelFlag::new(),
        )
        .unwrap();
        assert_eq!(result.failed.len(), 2);
    }

    #[test]
    fn test_cancellation_observed_at_tick_boundary() {
        let snap = two_node_snapshot();
        let req = request(&["P"]);
        let cancel = CancelFlag::new();
        cancel.cancel();

        let result = single_run(
            &snap,
            &scores_for(&snap),
            &req,
            &CascadeConfig::default(),
            5,
            &cancel,
        );
        assert_eq!(result, Err(Interrupted));
    }

    #[test]
    fn test_impact_prefers_early_failures() {
        let snap = two_node_snapshot();
        let req = request(&["P"]);
        let scores = scores_for(&snap);
        let result =
            single_run(&snap, &scores, &req, &CascadeConfig::default(), 7, &CancelFlag::new())
                .unwrap();

        // P fails at t=0 (full penalty), H at t=1; both criticality 0.5.
        let tau = req.horizon_minutes / 4.0;
        let expected = 0.5 * (1.0 + 1.0) + 0.5 * (1.0 + (-1.0_f64 / tau).exp());
        assert!((result.impact - expected).abs() < 1e-9);
    }
}
