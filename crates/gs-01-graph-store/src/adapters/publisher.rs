//! Mutation publisher adapter: forwards applied mutations onto the
//! `graph.mutation` topic of the shared bus.

use crate::ports::outbound::MutationSink;
use shared_bus::{EngineEvent, InMemoryEventBus};
use shared_types::MutationEvent;
use std::sync::Arc;

/// [`MutationSink`] implementation over the in-memory event bus.
pub struct BusMutationSink {
    bus: Arc<InMemoryEventBus>,
}

impl BusMutationSink {
    /// Wraps a bus handle.
    #[must_use]
    pub fn new(bus: Arc<InMemoryEventBus>) -> Self {
        Self { bus }
    }
}

impl MutationSink for BusMutationSink {
    fn emit(&self, event: MutationEvent) {
        self.bus.publish_blocking(EngineEvent::GraphMutation(event));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_bus::{EventFilter, EventTopic};
    use shared_types::NodeId;

    #[tokio::test]
    async fn test_mutations_reach_the_bus() {
        let bus = Arc::new(InMemoryEventBus::new());
        let mut sub = bus.subscribe(EventFilter::topic(EventTopic::GraphMutation));
        let sink = BusMutationSink::new(bus);

        sink.emit(MutationEvent::NodeAdded {
            id: NodeId::from("n1"),
            version: 1,
        });

        let event = sub.recv().await.expect("event");
        assert!(matches!(event, EngineEvent::GraphMutation(_)));
    }
}
