//! # Engine Events
//!
//! Everything that can flow through the fan-out, and the topic/filter types
//! subscribers use to select what they receive.
//!
//! Events are in-process values; heavyweight payloads (aggregate results)
//! are shared behind `Arc` so fan-out to many subscribers stays cheap. Wire
//! adapters that forward events outward serialize the payloads they extract.

use shared_types::{AggregateResult, MutationEvent, TelemetryRecord};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Topics carried by the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTopic {
    /// An applied graph mutation.
    GraphMutation,
    /// A simulation job started executing.
    SimulationStarted,
    /// A simulation job produced an aggregate result.
    SimulationCompleted,
    /// A simulation job terminated without a result.
    SimulationFailed,
    /// A telemetry record with an unrecognized `data_type`, forwarded
    /// without graph application.
    IngestPassthrough,
}

impl EventTopic {
    /// Dotted topic name as exposed to external collaborators.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            EventTopic::GraphMutation => "graph.mutation",
            EventTopic::SimulationStarted => "simulation.started",
            EventTopic::SimulationCompleted => "simulation.completed",
            EventTopic::SimulationFailed => "simulation.failed",
            EventTopic::IngestPassthrough => "ingest.passthrough",
        }
    }
}

impl fmt::Display for EventTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// All events that can be published to the bus.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// Source: graph store, after every applied mutation.
    GraphMutation(MutationEvent),

    /// Source: coordinator, when a job leaves the queue and begins running.
    SimulationStarted {
        job_id: Uuid,
        scenario_name: String,
        /// Hex-encoded request fingerprint.
        fingerprint: String,
    },

    /// Source: coordinator, with the aggregate for every attached handle.
    SimulationCompleted {
        job_id: Uuid,
        fingerprint: String,
        result: Arc<AggregateResult>,
        elapsed_seconds: f64,
    },

    /// Source: coordinator, when a job is cancelled or errors out.
    SimulationFailed {
        job_id: Uuid,
        fingerprint: String,
        reason: String,
    },

    /// Source: ingestion pipeline, for unrecognized `data_type` values.
    IngestPassthrough(TelemetryRecord),
}

impl EngineEvent {
    /// The topic this event is published under.
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            EngineEvent::GraphMutation(_) => EventTopic::GraphMutation,
            EngineEvent::SimulationStarted { .. } => EventTopic::SimulationStarted,
            EngineEvent::SimulationCompleted { .. } => EventTopic::SimulationCompleted,
            EngineEvent::SimulationFailed { .. } => EventTopic::SimulationFailed,
            EngineEvent::IngestPassthrough(_) => EventTopic::IngestPassthrough,
        }
    }
}

/// Selects which topics a subscription receives.
#[derive(Debug, Clone)]
pub struct EventFilter {
    pub topics: Vec<EventTopic>,
}

impl EventFilter {
    /// Matches every topic.
    #[must_use]
    pub fn all() -> Self {
        Self { topics: Vec::new() }
    }

    /// Matches exactly the given topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self { topics }
    }

    /// Matches a single topic.
    #[must_use]
    pub fn topic(topic: EventTopic) -> Self {
        Self {
            topics: vec![topic],
        }
    }

    /// Whether an event passes this filter.
    #[must_use]
    pub fn matches(&self, event: &EngineEvent) -> bool {
        self.topics.is_empty() || self.topics.contains(&event.topic())
    }
}
