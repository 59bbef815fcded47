//! Orchestration driver parameters.

use std::time::Duration;

/// Worker pool and retry settings for the
/// [`OrchestrationDriver`](crate::use_cases::driver::OrchestrationDriver).
///
/// Retries apply only to transient store failures. A step that failed
/// against an external dependency is recorded as `FAILED` and is never
/// retried automatically.
#[derive(Debug, Clone, PartialEq)]
pub struct DriverParams {
    /// Number of concurrent workers pulling from the queue.
    pub workers: usize,
    /// Bound of the in-process work queue.
    pub queue_capacity: usize,
    /// Delay before the first retry; doubles on each further attempt.
    pub retry_delay: Duration,
    /// Retries of a transient store failure before giving up on the job.
    pub max_store_retries: u32,
}

impl Default for DriverParams {
    fn default() -> Self {
        Self {
            workers: 4,
            queue_capacity: 256,
            retry_delay: Duration::from_millis(500),
            max_store_retries: 3,
        }
    }
}

impl DriverParams {
    /// Backoff before retry number `attempt` (1-indexed).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.saturating_sub(1).min(16);
        self.retry_delay.saturating_mul(factor)
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn with_max_store_retries(mut self, retries: u32) -> Self {
        self.max_store_retries = retries;
        self
    }
}
