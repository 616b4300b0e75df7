//! Outbound (driven) ports for the graph store.
//!
//! The store announces applied mutations through a [`MutationSink`] rather
//! than talking to the fan-out directly, so the domain stays testable
//! without a bus.

use shared_types::MutationEvent;

/// Receives every applied graph mutation, in application order.
///
/// Called after the write lease is released; implementations must not
/// re-enter the store synchronously.
pub trait MutationSink: Send + Sync {
    /// Deliver one applied mutation.
    fn emit(&self, event: MutationEvent);
}

/// Sink that discards everything; for standalone and test use.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpSink;

impl MutationSink for NoOpSink {
    fn emit(&self, _event: MutationEvent) {}
}

/// Recording sink for testing.
#[cfg(test)]
pub struct RecordingSink {
    pub events: std::sync::Mutex<Vec<MutationEvent>>,
}

#[cfg(test)]
impl RecordingSink {
    pub fn new() -> Self {
        Self {
            events: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<MutationEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl MutationSink for RecordingSink {
    fn emit(&self, event: MutationEvent) {
        self.events.lock().unwrap().push(event);
    }
}
