//! # Event Publisher
//!
//! The publishing side of the fan-out. Publishing never blocks: slow
//! subscribers lose their oldest buffered events rather than slowing the
//! producer down.

use crate::events::{EngineEvent, EventFilter};
use crate::subscriber::{EventStream, Subscription};
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Trait for publishing events to the bus.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish an event.
    ///
    /// # Returns
    ///
    /// The number of active subscribers the event was delivered to. An event
    /// with no subscribers is dropped silently; that is not an error.
    async fn publish(&self, event: EngineEvent) -> usize;

    /// Total events published since construction.
    fn events_published(&self) -> u64;
}

/// In-memory fan-out over `tokio::sync::broadcast`.
///
/// The broadcast ring buffer gives each subscriber an independent cursor over
/// one ordered stream, which yields exactly the contract the subsystems need:
/// per-topic order preserved, bounded buffering per subscriber, oldest events
/// dropped on overflow with the loss count surfaced to the lagging subscriber.
pub struct InMemoryEventBus {
    sender: broadcast::Sender<EngineEvent>,

    /// Active subscription count per topic-set key.
    subscriptions: Arc<RwLock<HashMap<String, usize>>>,

    events_published: AtomicU64,

    capacity: usize,
}

impl InMemoryEventBus {
    /// Creates a bus with the default per-subscriber capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Creates a bus with the given per-subscriber capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            subscriptions: Arc::new(RwLock::new(HashMap::new())),
            events_published: AtomicU64::new(0),
            capacity,
        }
    }

    /// Subscribe to events matching a filter.
    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        let receiver = self.sender.subscribe();
        let topic_key = format!("{:?}", filter.topics);

        {
            if let Ok(mut subs) = self.subscriptions.write() {
                *subs.entry(topic_key.clone()).or_insert(0) += 1;
            }
        }

        debug!(topics = ?filter.topics, "New subscription created");

        Subscription::new(receiver, filter, self.subscriptions.clone(), topic_key)
    }

    /// Subscribe and wrap the subscription in a `Stream`.
    #[must_use]
    pub fn event_stream(&self, filter: EventFilter) -> EventStream {
        EventStream::new(self.subscribe(filter))
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Per-subscriber buffer capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Publish from synchronous code (the graph store's mutation path).
    ///
    /// Identical semantics to [`EventPublisher::publish`]; the broadcast
    /// send itself never blocks or yields.
    pub fn publish_blocking(&self, event: EngineEvent) -> usize {
        let topic = event.topic();
        self.events_published.fetch_add(1, Ordering::Relaxed);
        match self.sender.send(event) {
            Ok(receiver_count) => {
                trace!(topic = %topic, receivers = receiver_count, "Event published");
                receiver_count
            }
            Err(_) => {
                trace!(topic = %topic, "Event dropped (no receivers)");
                0
            }
        }
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, event: EngineEvent) -> usize {
        self.publish_blocking(event)
    }

    fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }
}
