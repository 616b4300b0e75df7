//! # Shared Bus - Event Fan-out for Inter-Subsystem Communication
//!
//! All inter-subsystem notification traffic rides this bus: the graph store
//! announces applied mutations, the coordinator announces simulation
//! lifecycle transitions, and the ingestion pipeline forwards unrecognized
//! records untouched.
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────┐
//! │ Graph Store  │                    │ External     │
//! │ Coordinator  │    publish()       │ Collaborator │
//! │ Ingestion    │ ──────┐            │ (viewer, …)  │
//! └──────────────┘       │            └──────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐          │
//!                  │  Event Bus   │          │
//!                  │              │ ─────────┘
//!                  └──────────────┘  subscribe(topic)
//! ```
//!
//! ## Delivery Semantics
//!
//! - Publication order is preserved per topic (a single ordered channel
//!   carries every topic, which is strictly stronger).
//! - Publishers never block on slow subscribers. Each subscription holds a
//!   bounded queue; on overflow the oldest events are dropped and the
//!   subscription's `dropped()` counter advances by the number lost.
//! - Unsubscribing is idempotent; dropping a subscription unsubscribes.

pub mod events;
pub mod publisher;
pub mod subscriber;

pub use events::{EngineEvent, EventFilter, EventTopic};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{EventStream, Subscription, SubscriptionError};

/// Maximum events buffered per subscriber before the oldest are dropped.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;
