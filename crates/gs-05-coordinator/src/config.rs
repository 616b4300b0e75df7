//! Configuration for the job coordinator.

use serde::{Deserialize, Serialize};

/// Worker pool and admission sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Simulations executing concurrently. Defaults to the logical core
    /// count.
    pub worker_pool_size: usize,
    /// Jobs admitted beyond the pool, waiting for a worker. Submissions
    /// past `worker_pool_size + queue_capacity` are rejected as overloaded.
    pub queue_capacity: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            worker_pool_size: num_cpus::get(),
            queue_capacity: 64,
        }
    }
}

impl CoordinatorConfig {
    /// Maximum jobs in flight (executing plus queued).
    #[must_use]
    pub fn admission_capacity(&self) -> usize {
        self.worker_pool_size + self.queue_capacity
    }
}
