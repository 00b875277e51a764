//! Global time budget, re-checked at every phase boundary.

use std::time::Duration;

use tokio::time::Instant;

use crate::phase::PhaseDescriptor;

/// Result of checking the budget before a phase starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetCheck {
    Proceed,
    /// Nothing is left.
    Exhausted,
    /// Some time is left, but less than the phase's own timeout.
    Insufficient { remaining: Duration },
}

/// Wall-clock budget for one request, measured on the Tokio clock.
#[derive(Debug, Clone, Copy)]
pub struct TimeBudget {
    started: Instant,
    total: Duration,
}

impl TimeBudget {
    pub fn start(total: Duration) -> Self {
        Self {
            started: Instant::now(),
            total,
        }
    }

    pub fn total(&self) -> Duration {
        self.total
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn remaining(&self) -> Duration {
        self.total.saturating_sub(self.elapsed())
    }

    pub fn check(&self, descriptor: &PhaseDescriptor) -> BudgetCheck {
        let remaining = self.remaining();
        if remaining.is_zero() {
            BudgetCheck::Exhausted
        } else if remaining < descriptor.timeout {
            BudgetCheck::Insufficient { remaining }
        } else {
            BudgetCheck::Proceed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::FailurePolicy;
    use chart_model::Phase;

    fn descriptor(timeout_ms: u64) -> PhaseDescriptor {
        PhaseDescriptor {
            phase: Phase::DataProcessing,
            timeout: Duration::from_millis(timeout_ms),
            required: false,
            on_failure: FailurePolicy::Fallback,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn check_tracks_elapsed_time() {
        let budget = TimeBudget::start(Duration::from_secs(20));
        assert_eq!(budget.check(&descriptor(10_000)), BudgetCheck::Proceed);

        tokio::time::advance(Duration::from_secs(12)).await;
        assert_eq!(
            budget.check(&descriptor(10_000)),
            BudgetCheck::Insufficient {
                remaining: Duration::from_secs(8)
            }
        );
        assert_eq!(budget.check(&descriptor(5_000)), BudgetCheck::Proceed);

        tokio::time::advance(Duration::from_secs(9)).await;
        assert_eq!(budget.remaining(), Duration::ZERO);
        assert_eq!(budget.check(&descriptor(1)), BudgetCheck::Exhausted);
    }
}
