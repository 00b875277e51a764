//! Phase descriptors and the generic phase runner.
//!
//! The failure matrix lives in [`phase_table`]; [`run_phase`] applies it the
//! same way to every phase, so no phase decides on its own whether to abort
//! or fall back.
//!
//! | phase             | required | on failure |
//! |-------------------|----------|------------|
//! | validation        | yes      | abort      |
//! | pattern_selection | yes      | abort      |
//! | chart_selection   | no       | fallback   |
//! | data_processing   | no       | fallback   |
//! | data_mapping      | yes      | abort      |
//! | build             | yes      | abort      |

use std::future::Future;
use std::time::Duration;

use chart_model::{Phase, PipelineError};
use chart_select::PatternSelectionError;
use tokio::time::Instant;
use tracing::Instrument;

use crate::budget::{BudgetCheck, TimeBudget};
use crate::config::PhaseTimeouts;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop the pipeline and report the error.
    Abort,
    /// Substitute a deterministic value and continue.
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseDescriptor {
    pub phase: Phase,
    pub timeout: Duration,
    pub required: bool,
    pub on_failure: FailurePolicy,
}

impl PhaseDescriptor {
    fn new(phase: Phase, timeouts: &PhaseTimeouts, required: bool) -> Self {
        Self {
            phase,
            timeout: timeouts.for_phase(phase),
            required,
            on_failure: if required {
                FailurePolicy::Abort
            } else {
                FailurePolicy::Fallback
            },
        }
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout.as_millis() as u64
    }
}

/// Descriptors for every phase, in execution order.
pub fn phase_table(timeouts: &PhaseTimeouts) -> [PhaseDescriptor; 6] {
    [
        PhaseDescriptor::new(Phase::Validation, timeouts, true),
        PhaseDescriptor::new(Phase::PatternSelection, timeouts, true),
        PhaseDescriptor::new(Phase::ChartSelection, timeouts, false),
        PhaseDescriptor::new(Phase::DataProcessing, timeouts, false),
        PhaseDescriptor::new(Phase::DataMapping, timeouts, true),
        PhaseDescriptor::new(Phase::Build, timeouts, true),
    ]
}

/// What a phase handed back to the coordinator.
#[derive(Debug)]
pub enum PhaseOutcome<T> {
    Success(T),
    Fallback { value: T, reason: String },
    Error(PipelineError),
}

/// Runs one phase under its timeout and the global budget.
///
/// The budget is checked before `work` is polled. A phase that cannot finish
/// inside the remaining budget is never started: required phases fail with a
/// timeout, optional phases go straight to `fallback`. `fallback` receives the
/// failure and is only called for phases with [`FailurePolicy::Fallback`];
/// abort phases pass `Err`.
pub async fn run_phase<T, W, F>(
    descriptor: &PhaseDescriptor,
    budget: &TimeBudget,
    work: W,
    fallback: F,
) -> PhaseOutcome<T>
where
    W: Future<Output = Result<T, PipelineError>>,
    F: FnOnce(PipelineError) -> Result<T, PipelineError>,
{
    let phase = descriptor.phase;
    let span = tracing::info_span!("phase", phase = %phase, timeout_ms = descriptor.timeout_ms());

    let failure = match budget.check(descriptor) {
        BudgetCheck::Exhausted => return PhaseOutcome::Error(budget_exhausted(phase, budget)),
        BudgetCheck::Insufficient { remaining } => {
            let error = budget_insufficient(descriptor, remaining, budget);
            span.in_scope(|| {
                tracing::warn!(
                    remaining_ms = remaining.as_millis() as u64,
                    "not enough time budget left to start phase"
                );
            });
            error
        }
        BudgetCheck::Proceed => {
            let start = Instant::now();
            let outcome = tokio::time::timeout(descriptor.timeout, work)
                .instrument(span.clone())
                .await;
            let duration_ms = start.elapsed().as_millis() as u64;
            match outcome {
                Ok(Ok(value)) => {
                    span.in_scope(|| tracing::debug!(duration_ms, "phase completed"));
                    return PhaseOutcome::Success(value);
                }
                Ok(Err(error)) => {
                    span.in_scope(|| {
                        tracing::warn!(duration_ms, code = error.code.as_str(), "phase failed");
                    });
                    error
                }
                Err(_) => {
                    span.in_scope(|| tracing::warn!(duration_ms, "phase timed out"));
                    timeout_error(descriptor)
                }
            }
        }
    };

    match descriptor.on_failure {
        FailurePolicy::Abort => PhaseOutcome::Error(failure),
        FailurePolicy::Fallback => {
            let reason = failure.message.clone();
            match fallback(failure) {
                Ok(value) => {
                    span.in_scope(|| tracing::info!(reason = %reason, "phase fell back"));
                    PhaseOutcome::Fallback { value, reason }
                }
                Err(error) => PhaseOutcome::Error(error.with_fallback_attempted(true)),
            }
        }
    }
}

/// Timeout inside a running phase. Pattern selection reports it as a
/// classification failure.
pub fn timeout_error(descriptor: &PhaseDescriptor) -> PipelineError {
    match descriptor.phase {
        Phase::PatternSelection => PatternSelectionError::Timeout.into(),
        phase => PipelineError::timeout(
            phase,
            format!("{phase} exceeded its {} ms timeout", descriptor.timeout_ms()),
        )
        .with_hint("Reduce the data size or simplify the request, then retry"),
    }
}

fn budget_exhausted(phase: Phase, budget: &TimeBudget) -> PipelineError {
    PipelineError::timeout(
        phase,
        format!(
            "time budget of {} ms was used up before {phase}",
            budget.total().as_millis()
        ),
    )
    .with_hint("Reduce the data size or retry when the classifier responds faster")
}

fn budget_insufficient(
    descriptor: &PhaseDescriptor,
    remaining: Duration,
    budget: &TimeBudget,
) -> PipelineError {
    PipelineError::timeout(
        descriptor.phase,
        format!(
            "only {} ms of the {} ms time budget left, {} needs {} ms",
            remaining.as_millis(),
            budget.total().as_millis(),
            descriptor.phase,
            descriptor.timeout_ms()
        ),
    )
    .with_hint("Reduce the data size or retry when the classifier responds faster")
}
