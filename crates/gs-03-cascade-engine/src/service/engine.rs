//! # Monte-Carlo Cascade Engine
//!
//! Validates a request, enforces the work budget, fans the runs out across
//! the rayon pool, and folds the results into the aggregate.
//!
//! ## Failure semantics
//!
//! - Parameter violations surface as typed errors before any run starts.
//! - Cancellation is cooperative: every worker observes the shared flag at
//!   tick boundaries, and the whole simulation reports `Cancelled`.
//! - A panicked run is retried once with a fresh derived seed; if it panics
//!   again the aggregate is degraded to `Partial` with the surviving run
//!   count rather than returned silently incomplete. If nothing survives,
//!   the engine reports `Internal` with a logged trace id.

use crate::config::CascadeConfig;
use crate::domain::errors::CascadeError;
use crate::domain::run::{single_run, Interrupted};
use crate::domain::{aggregate, seeds};
use gs_01_graph_store::GraphSnapshot;
use rayon::prelude::*;
use shared_types::{
    AggregateResult, CancelFlag, NodeId, ResultQuality, RunResult, SimulationRequest,
};
use std::collections::{BTreeMap, BTreeSet};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;

enum RunFailure {
    Cancelled,
    Panicked,
}

/// The Monte-Carlo simulation engine.
pub struct CascadeEngine {
    config: CascadeConfig,
}

impl CascadeEngine {
    /// Creates an engine with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: CascadeConfig::default(),
        }
    }

    /// Creates an engine with custom configuration.
    #[must_use]
    pub fn with_config(config: CascadeConfig) -> Self {
        Self { config }
    }

    /// The engine configuration.
    #[must_use]
    pub fn config(&self) -> &CascadeConfig {
        &self.config
    }

    /// Runs the full Monte-Carlo simulation.
    ///
    /// `master_seed` pins the RNG lineage: identical (snapshot, request,
    /// master_seed) inputs produce identical aggregates apart from
    /// `computation_time_seconds`.
    ///
    /// # Errors
    ///
    /// See [`CascadeError`]; validation errors are never retried.
    pub fn simulate(
        &self,
        snapshot: &GraphSnapshot,
        scores: &BTreeMap<NodeId, f64>,
        request: &SimulationRequest,
        master_seed: u64,
        cancel: &CancelFlag,
    ) -> Result<AggregateResult, CascadeError> {
        self.validate(snapshot, request)?;
        self.check_budget(snapshot, request)?;

        let started = Instant::now();
        info!(
            scenario = %request.scenario_name,
            runs = request.monte_carlo_runs,
            nodes = snapshot.node_count(),
            "Starting cascade simulation"
        );

        let outcomes: Vec<Result<RunResult, RunFailure>> = (0..request.monte_carlo_runs)
            .into_par_iter()
            .map(|run_index| {
                self.execute_run(snapshot, scores, request, master_seed, run_index, cancel)
            })
            .collect();

        if cancel.is_cancelled()
            || outcomes
                .iter()
                .any(|outcome| matches!(outcome, Err(RunFailure::Cancelled)))
        {
            info!(scenario = %request.scenario_name, "Simulation cancelled");
            return Err(CascadeError::Cancelled);
        }

        let succeeded: Vec<RunResult> = outcomes.into_iter().filter_map(Result::ok).collect();
        if succeeded.is_empty() {
            let trace_id = Uuid::new_v4();
            error!(%trace_id, scenario = %request.scenario_name, "Every simulation run failed");
            return Err(CascadeError::Internal { trace_id });
        }

        let quality = if succeeded.len() as u32 == request.monte_carlo_runs {
            ResultQuality::Complete
        } else {
            warn!(
                succeeded = succeeded.len(),
                requested = request.monte_carlo_runs,
                "Aggregate degraded to partial"
            );
            ResultQuality::Partial {
                succeeded_runs: succeeded.len() as u32,
            }
        };

        let elapsed = started.elapsed().as_secs_f64();
        info!(
            scenario = %request.scenario_name,
            elapsed_seconds = elapsed,
            "Cascade simulation complete"
        );

        Ok(aggregate::aggregate(
            &succeeded,
            snapshot,
            scores,
            request,
            &self.config,
            quality,
            elapsed,
        ))
    }

    fn execute_run(
        &self,
        snapshot: &GraphSnapshot,
        scores: &BTreeMap<NodeId, f64>,
        request: &SimulationRequest,
        master_seed: u64,
        run_index: u32,
        cancel: &CancelFlag,
    ) -> Result<RunResult, RunFailure> {
        for attempt in 0..2u32 {
            let seed = seeds::run_seed(master_seed, run_index, attempt);
            let outcome = catch_unwind(AssertUnwindSafe(|| {
                single_run(snapshot, scores, request, &self.config, seed, cancel)
            }));
            match outcome {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(Interrupted)) => return Err(RunFailure::Cancelled),
                Err(_) => {
                    warn!(run_index, attempt, "Simulation run panicked");
                }
            }
        }
        Err(RunFailure::Panicked)
    }

    fn validate(
        &self,
        snapshot: &GraphSnapshot,
        request: &SimulationRequest,
    ) -> Result<(), CascadeError> {
        if request.monte_carlo_runs == 0 {
            return Err(CascadeError::NonPositiveRuns);
        }
        let step = request.time_step_minutes;
        if !step.is_finite() || step <= 0.0 || step < self.config.min_time_step_minutes {
            return Err(CascadeError::InvalidTimeStep {
                step,
                min: self.config.min_time_step_minutes,
            });
        }
        let horizon = request.horizon_minutes;
        if !horizon.is_finite()
            || horizon <= 0.0
            || horizon < step
            || horizon > self.config.max_horizon_minutes
        {
            return Err(CascadeError::InvalidHorizon {
                horizon,
                step,
                max: self.config.max_horizon_minutes,
            });
        }
        if !(request.confidence_level > 0.0 && request.confidence_level < 1.0) {
            return Err(CascadeError::InvalidConfidenceLevel(request.confidence_level));
        }
        if !(0.0..=1.0).contains(&request.event.severity) {
            return Err(CascadeError::InvalidSeverity(request.event.severity));
        }
        if !(0.0..=1.0).contains(&request.base_propagation_probability) {
            return Err(CascadeError::InvalidBaseProbability(
                request.base_propagation_probability,
            ));
        }
        if request.load_threshold_multiplier.is_nan() || request.load_threshold_multiplier <= 0.0 {
            return Err(CascadeError::InvalidLoadThreshold(
                request.load_threshold_multiplier,
            ));
        }
        if request.recovery_enabled
            && (!request.mean_recovery_time_minutes.is_finite()
                || request.mean_recovery_time_minutes <= 0.0)
        {
            return Err(CascadeError::InvalidRecoveryTime(
                request.mean_recovery_time_minutes,
            ));
        }
        if request.initial_failures().is_empty() {
            return Err(CascadeError::NoInitialFailures);
        }
        for id in request.initial_failures() {
            if !snapshot.contains(id) {
                return Err(CascadeError::UnknownInitialNode(id.clone()));
            }
        }
        Ok(())
    }

    fn check_budget(
        &self,
        snapshot: &GraphSnapshot,
        request: &SimulationRequest,
    ) -> Result<(), CascadeError> {
        let initial: BTreeSet<NodeId> = request.initial_failures().iter().cloned().collect();
        let seeds: Vec<NodeId> = initial.iter().cloned().collect();
        let affected =
            initial.len() + snapshot.reverse_reachable(&seeds, usize::MAX).len();
        let required = u64::from(request.monte_carlo_runs)
            .saturating_mul(affected as u64)
            .saturating_mul(request.tick_count());
        if required > self.config.work_budget {
            return Err(CascadeError::BudgetExceeded {
                required,
                budget: self.config.work_budget,
            });
        }
        Ok(())
    }
}

impl Default for CascadeEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gs_01_graph_store::DependencyGraph;
    use shared_types::{
        DependencyEdge, DisruptionEvent, EventKind, InfrastructureNode, NodeKind,
    };

    fn scores_for(snapshot: &GraphSnapshot) -> BTreeMap<NodeId, f64> {
        snapshot.node_ids().map(|id| (id.clone(), 0.5)).collect()
    }

    fn base_request(initial: &[&str], runs: u32) -> SimulationRequest {
        SimulationRequest {
            scenario_name: "engine-test".into(),
            event: DisruptionEvent {
                kind: EventKind::Other,
                severity: 0.0,
                environment: None,
                initial_failures: initial.iter().map(|s| NodeId::from(*s)).collect(),
            },
            horizon_minutes: 10.0,
            time_step_minutes: 1.0,
            monte_carlo_runs: runs,
            confidence_level: 0.95,
            base_propagation_probability: 1.0,
            load_threshold_multiplier: f64::INFINITY,
            recovery_enabled: false,
            mean_recovery_time_minutes: 720.0,
        }
    }

    /// Power plant P supplying hospital H over a 60 s edge, plus an
    /// isolated node I.
    fn scenario_snapshot() -> GraphSnapshot {
        let mut g = DependencyGraph::new();
        g.add_node(InfrastructureNode::new("P", NodeKind::Power, 100.0))
            .unwrap();
        g.add_node(InfrastructureNode::new("H", NodeKind::Healthcare, 100.0))
            .unwrap();
        g.add_node(InfrastructureNode::new("I", NodeKind::Water, 100.0))
            .unwrap();
        g.add_edge(DependencyEdge::new("H", "P", 1.0, 1.0).with_latency_ms(60_000.0))
            .unwrap();
        g.snapshot()
    }

    #[test]
    fn test_two_node_deterministic_cascade() {
        let snap = scenario_snapshot();
        let scores = scores_for(&snap);
        let engine = CascadeEngine::new();
        let request = base_request(&["P"], 100);

        let result = engine
            .simulate(&snap, &scores, &request, 1234, &CancelFlag::new())
            .unwrap();

        assert_eq!(result.failure_probability[&NodeId::from("P")], 1.0);
        assert_eq!(result.failure_probability[&NodeId::from("H")], 1.0);
        assert_eq!(result.mean_time_to_failure[&NodeId::from("P")], 0.0);
        assert!((result.mean_time_to_failure[&NodeId::from("H")] - 1.0).abs() < 1e-9);
        assert!(result.quality.is_complete());
    }

    #[test]
    fn test_isolated_node_untouched() {
        let snap = scenario_snapshot();
        let engine = CascadeEngine::new();
        let result = engine
            .simulate(
                &snap,
                &scores_for(&snap),
                &base_request(&["P"], 50),
                7,
                &CancelFlag::new(),
            )
            .unwrap();
        assert!(!result.failure_probability.contains_key(&NodeId::from("I")));
    }

    #[test]
    fn test_reproducibility_bit_exact() {
        let mut g = DependencyGraph::new();
        for id in ["P", "H1", "H2"] {
            g.add_node(InfrastructureNode::new(id, NodeKind::Power, 100.0))
                .unwrap();
        }
        g.add_edge(DependencyEdge::new("H1", "P", 1.0, 0.5)).unwrap();
        g.add_edge(DependencyEdge::new("H2", "P", 1.0, 0.5)).unwrap();
        let snap = g.snapshot();
        let scores = scores_for(&snap);
        let engine = CascadeEngine::new();
        let request = base_request(&["P"], 200);

        let mut a = engine
            .simulate(&snap, &scores, &request, 99, &CancelFlag::new())
            .unwrap();
        let mut b = engine
            .simulate(&snap, &scores, &request, 99, &CancelFlag::new())
            .unwrap();
        // Wall-clock cost is the only field outside the contract.
        a.computation_time_seconds = 0.0;
        b.computation_time_seconds = 0.0;
        assert_eq!(a, b);
    }

    #[test]
    fn test_branching_probabilities_symmetric() {
        let mut g = DependencyGraph::new();
        for id in ["P", "H1", "H2"] {
            g.add_node(InfrastructureNode::new(id, NodeKind::Power, 100.0))
                .unwrap();
        }
        g.add_edge(DependencyEdge::new("H1", "P", 1.0, 0.5)).unwrap();
        g.add_edge(DependencyEdge::new("H2", "P", 1.0, 0.5)).unwrap();
        let snap = g.snapshot();
        let engine = CascadeEngine::new();
        let request = base_request(&["P"], 1000);

        let result = engine
            .simulate(&snap, &scores_for(&snap), &request, 5, &CancelFlag::new())
            .unwrap();
        let p1 = result.failure_probability[&NodeId::from("H1")];
        let p2 = result.failure_probability[&NodeId::from("H2")];
        assert!((p1 - p2).abs() < 0.1, "p1={p1} p2={p2}");
    }

    #[test]
    fn test_noisy_or_combination() {
        // C depends on two failed suppliers with hazards 0.3 and 0.5;
        // the one-tick failure probability must approach 1-(0.7·0.5)=0.65.
        let mut g = DependencyGraph::new();
        for id in ["A", "B", "C"] {
            g.add_node(InfrastructureNode::new(id, NodeKind::Power, 100.0))
                .unwrap();
        }
        g.add_edge(DependencyEdge::new("C", "A", 1.0, 0.3)).unwrap();
        g.add_edge(DependencyEdge::new("C", "B", 1.0, 0.5)).unwrap();
        let snap = g.snapshot();

        let mut request = base_request(&["A", "B"], 2000);
        request.horizon_minutes = 1.0;
        request.time_step_minutes = 1.0;
        let engine = CascadeEngine::new();
        let result = engine
            .simulate(&snap, &scores_for(&snap), &request, 17, &CancelFlag::new())
            .unwrap();

        let p = result.failure_probability[&NodeId::from("C")];
        assert!((p - 0.65).abs() < 0.05, "p={p}");
    }

    #[test]
    fn test_severity_monotonicity() {
        let mut g = DependencyGraph::new();
        for id in ["P", "S", "H"] {
            g.add_node(InfrastructureNode::new(id, NodeKind::Power, 100.0))
                .unwrap();
        }
        g.add_edge(DependencyEdge::new("S", "P", 1.0, 0.4)).unwrap();
        g.add_edge(DependencyEdge::new("H", "S", 1.0, 0.4)).unwrap();
        let snap = g.snapshot();
        let scores = scores_for(&snap);
        let engine = CascadeEngine::new();

        let mut mild = base_request(&["P"], 400);
        mild.event.kind = EventKind::Hurricane;
        mild.event.severity = 0.1;
        mild.base_propagation_probability = 0.5;
        let mut severe = mild.clone();
        severe.event.severity = 0.9;

        let mild_result = engine
            .simulate(&snap, &scores, &mild, 42, &CancelFlag::new())
            .unwrap();
        let severe_result = engine
            .simulate(&snap, &scores, &severe, 42, &CancelFlag::new())
            .unwrap();

        for (node, &p_mild) in &mild_result.failure_probability {
            let p_severe = severe_result
                .failure_probability
                .get(node)
                .copied()
                .unwrap_or(0.0);
            assert!(
                p_severe + 0.15 >= p_mild,
                "severity decreased failure probability for {node}: {p_mild} -> {p_severe}"
            );
        }
        assert!(severe_result.mean_impact + 0.1 >= mild_result.mean_impact);
    }

    #[test]
    fn test_budget_exceeded() {
        let snap = scenario_snapshot();
        let engine = CascadeEngine::with_config(CascadeConfig {
            work_budget: 10,
            ..CascadeConfig::default()
        });
        let result = engine.simulate(
            &snap,
            &scores_for(&snap),
            &base_request(&["P"], 100),
            1,
            &CancelFlag::new(),
        );
        assert!(matches!(result, Err(CascadeError::BudgetExceeded { .. })));
    }

    #[test]
    fn test_cancellation_reported() {
        let snap = scenario_snapshot();
        let cancel = CancelFlag::new();
        cancel.cancel();
        let result = CascadeEngine::new().simulate(
            &snap,
            &scores_for(&snap),
            &base_request(&["P"], 100),
            1,
            &cancel,
        );
        assert_eq!(result, Err(CascadeError::Cancelled));
    }

    #[test]
    fn test_invalid_requests_rejected() {
        let snap = scenario_snapshot();
        let scores = scores_for(&snap);
        let engine = CascadeEngine::new();
        let cancel = CancelFlag::new();

        let mut request = base_request(&["P"], 0);
        assert_eq!(
            engine.simulate(&snap, &scores, &request, 1, &cancel),
            Err(CascadeError::NonPositiveRuns)
        );

        request = base_request(&["P"], 10);
        request.time_step_minutes = 0.0;
        assert!(matches!(
            engine.simulate(&snap, &scores, &request, 1, &cancel),
            Err(CascadeError::InvalidTimeStep { .. })
        ));

        request = base_request(&["P"], 10);
        request.time_step_minutes = 20.0; // exceeds the 10-minute horizon
        assert!(matches!(
            engine.simulate(&snap, &scores, &request, 1, &cancel),
            Err(CascadeError::InvalidHorizon { .. })
        ));

        request = base_request(&["P"], 10);
        request.confidence_level = 1.0;
        assert!(matches!(
            engine.simulate(&snap, &scores, &request, 1, &cancel),
            Err(CascadeError::InvalidConfidenceLevel(_))
        ));

        request = base_request(&["P"], 10);
        request.event.severity = 1.5;
        assert!(matches!(
            engine.simulate(&snap, &scores, &request, 1, &cancel),
            Err(CascadeError::InvalidSeverity(_))
        ));

        request = base_request(&["P"], 10);
        request.base_propagation_probability = -0.1;
        assert!(matches!(
            engine.simulate(&snap, &scores, &request, 1, &cancel),
            Err(CascadeError::InvalidBaseProbability(_))
        ));

        request = base_request(&["P"], 10);
        request.load_threshold_multiplier = 0.0;
        assert!(matches!(
            engine.simulate(&snap, &scores, &request, 1, &cancel),
            Err(CascadeError::InvalidLoadThreshold(_))
        ));

        request = base_request(&["P"], 10);
        request.recovery_enabled = true;
        request.mean_recovery_time_minutes = 0.0;
        assert!(matches!(
            engine.simulate(&snap, &scores, &request, 1, &cancel),
            Err(CascadeError::InvalidRecoveryTime(_))
        ));

        request = base_request(&[], 10);
        assert_eq!(
            engine.simulate(&snap, &scores, &request, 1, &cancel),
            Err(CascadeError::NoInitialFailures)
        );

        request = base_request(&["ghost"], 10);
        assert_eq!(
            engine.simulate(&snap, &scores, &request, 1, &cancel),
            Err(CascadeError::UnknownInitialNode(NodeId::from("ghost")))
        );
    }

    #[test]
    fn test_critical_path_reported_and_ordered() {
        let snap = scenario_snapshot();
        let engine = CascadeEngine::new();
        let result = engine
            .simulate(
                &snap,
                &scores_for(&snap),
                &base_request(&["P"], 50),
                3,
                &CancelFlag::new(),
            )
            .unwrap();

        assert!(!result.critical_paths.is_empty());
        assert_eq!(
            result.critical_paths[0].chain,
            vec![NodeId::from("P"), NodeId::from("H")]
        );
        // Strictly non-increasing occurrence counts.
        let counts: Vec<u32> = result.critical_paths.iter().map(|p| p.occurrences).collect();
        assert!(counts.windows(2).all(|w| w[0] >= w[1]));
    }
}
