//! End-to-end scenario fixtures and tests over the assembled platform.

use chrono::{TimeZone, Utc};
use engine_runtime::{EngineConfig, ResiliencePlatform};
use serde_json::json;
use shared_types::{
    DisruptionEvent, EventKind, NodeId, SimulationRequest, TelemetryRecord,
};

/// Telemetry record at second offset `secs` from a fixed base time.
#[must_use]
pub fn record_at(
    source: &str,
    secs: u32,
    data_type: &str,
    payload: serde_json::Value,
) -> TelemetryRecord {
    TelemetryRecord {
        source_id: source.into(),
        timestamp: Utc
            .with_ymd_and_hms(2026, 3, 1, 6, 0, 0)
            .unwrap()
            .checked_add_signed(chrono::Duration::seconds(i64::from(secs)))
            .unwrap(),
        data_type: data_type.into(),
        payload,
        quality_score: 1.0,
    }
}

/// A platform pre-loaded (through real ingestion) with the two-node
/// scenario graph: hospital `H` depends on power plant `P` over a 60 s
/// edge, plus an isolated node `I`.
pub async fn two_node_platform() -> ResiliencePlatform {
    let platform = ResiliencePlatform::new(EngineConfig::default());
    let summary = platform.ingest_batch(vec![
        record_at(
            "admin",
            1,
            "topology.node.upsert",
            json!({"id": "P", "kind": "power", "capacity": 100.0}),
        ),
        record_at(
            "admin",
            2,
            "topology.node.upsert",
            json!({"id": "H", "kind": "healthcare", "capacity": 100.0}),
        ),
        record_at(
            "admin",
            3,
            "topology.node.upsert",
            json!({"id": "I", "kind": "water", "capacity": 100.0}),
        ),
        record_at(
            "admin",
            4,
            "topology.edge.upsert",
            json!({"source": "H", "target": "P", "strength": 1.0,
                   "propagation_probability": 1.0, "latency_ms": 60000.0}),
        ),
    ]);
    assert_eq!(summary.accepted, 4);
    platform.pipeline().drained().await;
    platform
}

/// The deterministic two-node request: fail `P`, watch `H`.
#[must_use]
pub fn two_node_request(runs: u32) -> SimulationRequest {
    SimulationRequest {
        scenario_name: "plant-outage".into(),
        event: DisruptionEvent {
            kind: EventKind::PowerOutage,
            severity: 0.0,
            environment: None,
            initial_failures: vec![NodeId::from("P")],
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

#[cfg(test)]
mod tests {
    use super::*;
    use gs_04_ingestion::IngestError;
    use shared_bus::{EngineEvent, EventFilter, EventTopic};
    use std::sync::Arc;

    // =========================================================================
    // SCENARIO 1 + 2: deterministic cascade and isolation
    // =========================================================================

    #[tokio::test]
    async fn test_two_node_cascade_end_to_end() {
        let platform = two_node_platform().await;
        let handle = platform.coordinator().submit(two_node_request(100)).unwrap();
        let result = platform.coordinator().await_result(&handle).await.unwrap();

        assert_eq!(result.failure_probability[&NodeId::from("P")], 1.0);
        assert_eq!(result.failure_probability[&NodeId::from("H")], 1.0);
        assert_eq!(result.mean_time_to_failure[&NodeId::from("P")], 0.0);
        assert!((result.mean_time_to_failure[&NodeId::from("H")] - 1.0).abs() < 1e-9);

        // Isolated node untouched (failure probability zero by absence).
        assert!(!result.failure_probability.contains_key(&NodeId::from("I")));
        assert_eq!(result.affected_nodes_ci, (2, 2));
    }

    #[tokio::test]
    async fn test_simulation_lifecycle_events_on_bus() {
        let platform = two_node_platform().await;
        let mut started = platform.subscribe(EventFilter::topic(EventTopic::SimulationStarted));
        let mut completed =
            platform.subscribe(EventFilter::topic(EventTopic::SimulationCompleted));

        let handle = platform.coordinator().submit(two_node_request(20)).unwrap();
        let _ = platform.coordinator().await_result(&handle).await.unwrap();

        assert!(matches!(
            started.recv().await,
            Some(EngineEvent::SimulationStarted { .. })
        ));
        let Some(EngineEvent::SimulationCompleted { result, .. }) = completed.recv().await else {
            panic!("missing completion event");
        };
        assert_eq!(result.failure_probability[&NodeId::from("H")], 1.0);
    }

    // =========================================================================
    // SCENARIO 3: branching determinism
    // =========================================================================

    #[tokio::test]
    async fn test_branching_reproducible_and_symmetric() {
        let platform = ResiliencePlatform::new(EngineConfig::default());
        let summary = platform.ingest_batch(vec![
            record_at(
                "admin",
                1,
                "topology.node.upsert",
                json!({"id": "P", "kind": "power", "capacity": 100.0}),
            ),
            record_at(
                "admin",
                2,
                "topology.node.upsert",
                json!({"id": "H1", "kind": "healthcare", "capacity": 100.0}),
            ),
            record_at(
                "admin",
                3,
                "topology.node.upsert",
                json!({"id": "H2", "kind": "healthcare", "capacity": 100.0}),
            ),
            record_at(
                "admin",
                4,
                "topology.edge.upsert",
                json!({"source": "H1", "target": "P", "strength": 1.0,
                       "propagation_probability": 0.5}),
            ),
            record_at(
                "admin",
                5,
                "topology.edge.upsert",
                json!({"source": "H2", "target": "P", "strength": 1.0,
                       "propagation_probability": 0.5}),
            ),
        ]);
        assert_eq!(summary.accepted, 5);
        platform.pipeline().drained().await;

        let mut request = two_node_request(1000);
        request.scenario_name = "branching".into();
        request.base_propagation_probability = 0.5;

        let first = platform.coordinator().submit(request.clone()).unwrap();
        let a = platform.coordinator().await_result(&first).await.unwrap();

        let second = platform.coordinator().submit(request).unwrap();
        let b = platform.coordinator().await_result(&second).await.unwrap();

        // Same fingerprint on an unchanged graph: identical aggregates even
        // across separate executions.
        let mut a_cmp = (*a).clone();
        let mut b_cmp = (*b).clone();
        a_cmp.computation_time_seconds = 0.0;
        b_cmp.computation_time_seconds = 0.0;
        assert_eq!(a_cmp, b_cmp);

        let p1 = a.failure_probability[&NodeId::from("H1")];
        let p2 = a.failure_probability[&NodeId::from("H2")];
        assert!((p1 - p2).abs() < 0.1, "H1={p1} H2={p2}");
    }

    // =========================================================================
    // SCENARIO 4: dedup of concurrent identical submissions
    // =========================================================================

    #[tokio::test]
    async fn test_concurrent_identical_requests_share_one_execution() {
        let platform = two_node_platform().await;
        let mut started = platform.subscribe(EventFilter::topic(EventTopic::SimulationStarted));

        let first = platform.coordinator().submit(two_node_request(200)).unwrap();
        let second = platform.coordinator().submit(two_node_request(200)).unwrap();
        assert_eq!(first.job_id(), second.job_id());

        let a = platform.coordinator().await_result(&first).await.unwrap();
        let b = platform.coordinator().await_result(&second).await.unwrap();

        // One execution: both handles resolve to the same shared aggregate,
        // including its wall-clock timing.
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.computation_time_seconds, b.computation_time_seconds);

        assert!(started.recv().await.is_some());
        assert!(matches!(started.try_recv(), Ok(None)));
    }

    // =========================================================================
    // SCENARIO 5: back-pressure under sustained overload
    // =========================================================================

    #[tokio::test]
    async fn test_backpressure_bounds_and_loses_nothing_accepted() {
        let mut config = EngineConfig::default();
        config.ingestion.buffer_capacity = 100;
        let platform = ResiliencePlatform::new(config);
        platform
            .ingest(record_at(
                "admin",
                0,
                "topology.node.upsert",
                json!({"id": "sub", "kind": "power", "capacity": 1e6}),
            ))
            .unwrap();
        platform.pipeline().drained().await;

        // Flood at well beyond capacity on a single-threaded runtime: the
        // drain task cannot interleave, so the buffer genuinely fills.
        let mut accepted = 0u32;
        let mut backpressured = 0u32;
        for i in 1..=1000u32 {
            let record = record_at(
                "flood",
                i,
                "sensor.load",
                json!({"node_id": "sub", "load": f64::from(i)}),
            );
            match platform.ingest(record) {
                Ok(()) => accepted += 1,
                Err(IngestError::Backpressure) => backpressured += 1,
                Err(other) => panic!("unexpected rejection: {other}"),
            }
        }

        assert_eq!(accepted, 100, "buffer bounds admissions");
        assert_eq!(backpressured, 900);

        // Every accepted record is applied; the newest accepted one wins.
        platform.pipeline().drained().await;
        let node = platform.store().get_node(&NodeId::from("sub")).unwrap();
        assert_eq!(node.load, 100.0);
    }

    // =========================================================================
    // SCENARIO 6: stale drop
    // =========================================================================

    #[tokio::test]
    async fn test_out_of_order_record_dropped_as_stale() {
        let platform = ResiliencePlatform::new(EngineConfig::default());
        platform
            .ingest(record_at(
                "admin",
                0,
                "topology.node.upsert",
                json!({"id": "sub", "kind": "power", "capacity": 1000.0}),
            ))
            .unwrap();
        platform.pipeline().drained().await;

        let sensor = |secs: u32, load: f64| {
            record_at("scada", secs, "sensor.load", json!({"node_id": "sub", "load": load}))
        };

        platform.ingest(sensor(10, 10.0)).unwrap();
        let stale = platform.ingest(sensor(5, 5.0));
        assert!(matches!(stale, Err(IngestError::Stale { .. })));
        platform.ingest(sensor(11, 11.0)).unwrap();

        platform.pipeline().drained().await;
        let node = platform.store().get_node(&NodeId::from("sub")).unwrap();
        assert_eq!(node.load, 11.0);
    }

    // =========================================================================
    // CROSS-CUTTING: mutation events, cancellation, criticality
    // =========================================================================

    #[tokio::test]
    async fn test_ingestion_emits_graph_mutations_in_order() {
        let platform = ResiliencePlatform::new(EngineConfig::default());
        let mut mutations = platform.subscribe(EventFilter::topic(EventTopic::GraphMutation));

        platform
            .ingest(record_at(
                "admin",
                1,
                "topology.node.upsert",
                json!({"id": "a", "kind": "telecom", "capacity": 10.0}),
            ))
            .unwrap();
        platform
            .ingest(record_at(
                "admin",
                2,
                "topology.node.remove",
                json!({"node_id": "a"}),
            ))
            .unwrap();
        platform.pipeline().drained().await;

        let first = mutations.recv().await.expect("first mutation");
        let second = mutations.recv().await.expect("second mutation");
        let (EngineEvent::GraphMutation(m1), EngineEvent::GraphMutation(m2)) = (first, second)
        else {
            panic!("wrong topic");
        };
        assert!(m1.version() < m2.version());
    }

    #[tokio::test]
    async fn test_cancellation_through_the_platform() {
        let platform = two_node_platform().await;
        let mut failed = platform.subscribe(EventFilter::topic(EventTopic::SimulationFailed));

        let handle = platform.coordinator().submit(two_node_request(5000)).unwrap();
        platform.coordinator().cancel(&handle);

        let outcome = platform.coordinator().await_result(&handle).await;
        assert!(outcome.is_err());

        let Some(EngineEvent::SimulationFailed { reason, .. }) = failed.recv().await else {
            panic!("missing failure event");
        };
        assert!(reason.contains("cancelled"));
    }

    #[tokio::test]
    async fn test_criticality_refresh_ranks_supply_root() {
        let platform = ResiliencePlatform::new(EngineConfig::default());
        let summary = platform.ingest_batch(vec![
            record_at(
                "admin",
                1,
                "topology.node.upsert",
                json!({"id": "plant", "kind": "power", "capacity": 100.0}),
            ),
            record_at(
                "admin",
                2,
                "topology.node.upsert",
                json!({"id": "sub", "kind": "power", "capacity": 100.0}),
            ),
            record_at(
                "admin",
                3,
                "topology.node.upsert",
                json!({"id": "leaf", "kind": "healthcare", "capacity": 100.0}),
            ),
            record_at(
                "admin",
                4,
                "topology.edge.upsert",
                json!({"source": "sub", "target": "plant", "strength": 1.0,
                       "propagation_probability": 0.5}),
            ),
            record_at(
                "admin",
                5,
                "topology.edge.upsert",
                json!({"source": "leaf", "target": "sub", "strength": 1.0,
                       "propagation_probability": 0.5}),
            ),
        ]);
        assert_eq!(summary.accepted, 5);
        platform.pipeline().drained().await;

        assert_eq!(platform.refresh_criticality(), 3);
        let top = platform.critical_nodes(1);
        assert_eq!(top[0].id, NodeId::from("plant"));
    }
}
