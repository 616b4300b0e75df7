//! # Monte-Carlo Aggregation
//!
//! Folds the independent run results into the aggregate the caller sees:
//! per-node failure probabilities, conditional mean times to failure,
//! percentile confidence intervals, critical paths, bottleneck ranking, and
//! deterministic advisory strings.
//!
//! The aggregator never assumes any ordering among the runs except that run
//! index 0 supplies the representative timeline.

use crate::config::CascadeConfig;
use crate::domain::{bottleneck, paths, stats};
use gs_01_graph_store::GraphSnapshot;
use shared_types::{AggregateResult, NodeId, ResultQuality, RunResult, SimulationRequest};
use std::collections::{BTreeMap, BTreeSet};

/// Builds the aggregate over `runs` (the runs that succeeded).
///
/// `runs` must be non-empty and ordered by run index.
#[must_use]
pub fn aggregate(
    runs: &[RunResult],
    snapshot: &GraphSnapshot,
    scores: &BTreeMap<NodeId, f64>,
    request: &SimulationRequest,
    config: &CascadeConfig,
    quality: ResultQuality,
    computation_time_seconds: f64,
) -> AggregateResult {
    let total_runs = runs.len() as f64;

    let mut failure_counts: BTreeMap<NodeId, u32> = BTreeMap::new();
    let mut failure_times: BTreeMap<NodeId, Vec<f64>> = BTreeMap::new();
    for run in runs {
        for id in &run.failed {
            *failure_counts.entry(id.clone()).or_insert(0) += 1;
        }
        for (id, t) in &run.time_to_failure {
            failure_times.entry(id.clone()).or_default().push(*t);
        }
    }

    let failure_probability: BTreeMap<NodeId, f64> = failure_counts
        .iter()
        .map(|(id, count)| (id.clone(), f64::from(*count) / total_runs))
        .collect();
    let mean_time_to_failure: BTreeMap<NodeId, f64> = failure_times
        .iter()
        .map(|(id, times)| (id.clone(), stats::mean(times)))
        .collect();

    let mut affected_counts: Vec<f64> = runs.iter().map(|run| run.failed.len() as f64).collect();
    let mut impacts: Vec<f64> = runs.iter().map(|run| run.impact).collect();
    let (affected_lo, affected_hi) =
        stats::percentile_ci(&mut affected_counts, request.confidence_level);
    let impact_ci = stats::percentile_ci(&mut impacts, request.confidence_level);

    let initial: BTreeSet<&NodeId> = request.initial_failures().iter().collect();
    let cascaded = runs
        .iter()
        .filter(|run| run.failed.len() > initial.len())
        .count();

    let criticality = |id: &NodeId| -> f64 {
        scores
            .get(id)
            .copied()
            .unwrap_or_else(|| snapshot.node(id).map_or(0.5, |node| node.criticality))
    };

    let critical_paths = paths::top_critical_paths(runs, scores, config.top_k_critical_paths);
    let bottleneck_nodes =
        bottleneck::rank_bottlenecks(runs, request, &criticality, config.bottleneck_limit);

    let mean_impact = stats::mean(runs.iter().map(|r| r.impact).collect::<Vec<_>>().as_slice());
    let cascade_probability = cascaded as f64 / total_runs;
    let cascade_depth = stats::mean(
        runs.iter()
            .map(|r| f64::from(r.max_chain_depth))
            .collect::<Vec<_>>()
            .as_slice(),
    );

    let all_times: Vec<f64> = failure_times.values().flatten().copied().collect();
    let mean_failure_time = stats::mean(&all_times);

    let recommendations = recommendations(
        &bottleneck_nodes,
        cascade_probability,
        mean_impact,
        mean_failure_time,
        snapshot.node_count(),
        request.recovery_enabled,
    );

    AggregateResult {
        scenario_name: request.scenario_name.clone(),
        failure_probability,
        mean_time_to_failure,
        affected_nodes_ci: (affected_lo as usize, affected_hi as usize),
        impact_ci,
        critical_paths,
        bottleneck_nodes,
        cascade_probability,
        cascade_depth,
        mean_impact,
        timeline: runs[0].timeline.clone(),
        recommendations,
        quality,
        monte_carlo_runs: request.monte_carlo_runs,
        computation_time_seconds,
    }
}

/// Deterministic advisory strings derived from aggregate thresholds.
fn recommendations(
    bottlenecks: &[shared_types::Bottleneck],
    cascade_probability: f64,
    mean_impact: f64,
    mean_failure_time: f64,
    node_count: usize,
    recovery_enabled: bool,
) -> Vec<String> {
    let mut out = Vec::new();
    if let Some(top) = bottlenecks.first() {
        out.push(format!(
            "Reinforce node '{}': highest expected impact reduction ({:.2}) if hardened",
            top.node, top.expected_impact_reduction
        ));
    }
    if cascade_probability > 0.7 {
        out.push(format!(
            "High cascade risk ({:.0}%): add redundant supply paths and rebalance load",
            cascade_probability * 100.0
        ));
    }
    if mean_impact > 0.5 * node_count as f64 {
        out.push(
            "Severe aggregate impact: stage emergency response along the reported critical paths"
                .to_string(),
        );
    }
    if mean_failure_time > 0.0 && mean_failure_time < 30.0 {
        out.push(format!(
            "Rapid cascade onset (mean {mean_failure_time:.1} min to failure): automate failover on the initial dependencies"
        ));
    }
    if recovery_enabled {
        out.push(
            "Prioritize proactive maintenance for the nodes with the highest failure probability"
                .to_string(),
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use gs_01_graph_store::DependencyGraph;
    use shared_types::{
        DisruptionEvent, EventKind, FailureRecord, InfrastructureNode, NodeKind,
    };

    fn snapshot() -> GraphSnapshot {
        let mut g = DependencyGraph::new();
        for id in ["P", "H"] {
            g.add_node(InfrastructureNode::new(id, NodeKind::Power, 10.0))
                .unwrap();
        }
        g.snapshot()
    }

    fn request(runs: u32) -> SimulationRequest {
        SimulationRequest {
            scenario_name: "agg-test".into(),
            event: DisruptionEvent {
                kind: EventKind::Other,
                severity: 0.5,
                environment: None,
                initial_failures: vec![NodeId::from("P")],
            },
            horizon_minutes: 60.0,
            time_step_minutes: 1.0,
            monte_carlo_runs: runs,
            confidence_level: 0.95,
            base_propagation_probability: 0.5,
            load_threshold_multiplier: f64::INFINITY,
            recovery_enabled: false,
            mean_recovery_time_minutes: 720.0,
        }
    }

    fn run_with(failed: &[(&str, f64, Option<&str>)]) -> RunResult {
        let timeline: Vec<FailureRecord> = failed
            .iter()
            .map(|(node, t, cause)| FailureRecord {
                t_minutes: *t,
                node: NodeId::from(*node),
                cause: cause.map(NodeId::from),
            })
            .collect();
        let failed_set: BTreeSet<NodeId> = timeline.iter().map(|r| r.node.clone()).collect();
        let time_to_failure: BTreeMap<NodeId, f64> = timeline
            .iter()
            .map(|r| (r.node.clone(), r.t_minutes))
            .collect();
        RunResult {
            timeline,
            failed: failed_set.clone(),
            still_failed: failed_set,
            time_to_failure,
            impact: 1.0,
            max_chain_depth: 1,
        }
    }

    #[test]
    fn test_failure_probability_and_ttf() {
        let runs = vec![
            run_with(&[("P", 0.0, Some("P")), ("H", 2.0, Some("P"))]),
            run_with(&[("P", 0.0, Some("P"))]),
        ];
        let snap = snapshot();
        let scores = BTreeMap::new();
        let result = aggregate(
            &runs,
            &snap,
            &scores,
            &request(2),
            &CascadeConfig::default(),
            ResultQuality::Complete,
            0.1,
        );

        assert_eq!(result.failure_probability[&NodeId::from("P")], 1.0);
        assert_eq!(result.failure_probability[&NodeId::from("H")], 0.5);
        // Conditional on failure: only the run where H failed counts.
        assert_eq!(result.mean_time_to_failure[&NodeId::from("H")], 2.0);
        assert_eq!(result.cascade_probability, 0.5);
    }

    #[test]
    fn test_ci_degenerate_when_runs_identical() {
        let runs = vec![
            run_with(&[("P", 0.0, Some("P")), ("H", 1.0, Some("P"))]),
            run_with(&[("P", 0.0, Some("P")), ("H", 1.0, Some("P"))]),
        ];
        let snap = snapshot();
        let result = aggregate(
            &runs,
            &snap,
            &BTreeMap::new(),
            &request(2),
            &CascadeConfig::default(),
            ResultQuality::Complete,
            0.0,
        );
        assert_eq!(result.affected_nodes_ci, (2, 2));
        assert_eq!(result.impact_ci.0, result.impact_ci.1);
    }

    #[test]
    fn test_representative_timeline_is_run_zero() {
        let runs = vec![
            run_with(&[("P", 0.0, Some("P"))]),
            run_with(&[("P", 0.0, Some("P")), ("H", 3.0, Some("P"))]),
        ];
        let snap = snapshot();
        let result = aggregate(
            &runs,
            &snap,
            &BTreeMap::new(),
            &request(2),
            &CascadeConfig::default(),
            ResultQuality::Complete,
            0.0,
        );
        assert_eq!(result.timeline.len(), 1);
    }

    #[test]
    fn test_recommendations_fire_on_thresholds() {
        // Every run cascades and fails fast: both advisories fire.
        let runs: Vec<RunResult> = (0..4)
            .map(|_| run_with(&[("P", 0.0, Some("P")), ("H", 1.0, Some("P"))]))
            .collect();
        let snap = snapshot();
        let result = aggregate(
            &runs,
            &snap,
            &BTreeMap::new(),
            &request(4),
            &CascadeConfig::default(),
            ResultQuality::Complete,
            0.0,
        );
        assert!(result
            .recommendations
            .iter()
            .any(|r| r.contains("High cascade risk")));
        assert!(result
            .recommendations
            .iter()
            .any(|r| r.contains("Rapid cascade onset")));
        assert!(result
            .recommendations
            .iter()
            .any(|r| r.starts_with("Reinforce node 'H'")));
    }

    #[test]
    fn test_quality_passthrough() {
        let runs = vec![run_with(&[("P", 0.0, Some("P"))])];
        let snap = snapshot();
        let result = aggregate(
            &runs,
            &snap,
            &BTreeMap::new(),
            &request(8),
            &CascadeConfig::default(),
            ResultQuality::Partial { succeeded_runs: 1 },
            0.0,
        );
        assert_eq!(result.quality, ResultQuality::Partial { succeeded_runs: 1 });
        assert_eq!(result.monte_carlo_runs, 8);
    }
}
