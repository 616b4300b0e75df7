//! # Cooperative Cancellation Flag
//!
//! Threads through every simulation run; workers check it at tick boundaries
//! and before any blocking step. Cloning shares the flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared one-way cancellation signal.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    inner: Arc<AtomicBool>,
}

impl CancelFlag {
    /// Creates a flag in the not-cancelled state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.inner.store(true, Ordering::SeqCst);
    }

    /// True once any clone has requested cancellation.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.load(Ordering::SeqCst)
    }
}
