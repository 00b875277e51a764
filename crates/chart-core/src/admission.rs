//! Concurrency ceiling for in-flight requests.

use std::sync::Arc;

use chart_model::{ErrorCategory, Phase, PipelineError};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Admits up to `max_in_flight` requests and rejects the rest immediately.
#[derive(Debug, Clone)]
pub struct Admission {
    permits: Arc<Semaphore>,
    max_in_flight: usize,
}

impl Admission {
    pub fn new(max_in_flight: usize) -> Self {
        let max_in_flight = max_in_flight.max(1);
        Self {
            permits: Arc::new(Semaphore::new(max_in_flight)),
            max_in_flight,
        }
    }

    /// The permit is held for the lifetime of the request.
    pub fn try_admit(&self) -> Result<OwnedSemaphorePermit, PipelineError> {
        Arc::clone(&self.permits).try_acquire_owned().map_err(|_| {
            tracing::warn!(max_in_flight = self.max_in_flight, "request rejected at capacity");
            PipelineError::new(
                ErrorCategory::RateLimited,
                Phase::Validation,
                format!("{} requests are already in flight", self.max_in_flight),
            )
            .with_hint("Retry after in-flight requests complete")
        })
    }

    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}
