//! Plan execution.

use std::sync::Arc;
use std::time::Instant;

use polars::prelude::DataFrame;

use chart_model::OperationPlan;

use crate::registry::OperationRegistry;

/// Default cap on plan length.
pub const DEFAULT_MAX_STEPS: usize = 10;

/// Table after a plan ran, with what happened along the way.
#[derive(Debug, Clone)]
pub struct ProcessedTable {
    pub df: DataFrame,
    /// Names of the steps that succeeded, in order.
    pub applied: Vec<String>,
    pub warnings: Vec<String>,
}

/// Runs operation plans against the registry.
///
/// Never fails: unknown operations are skipped, failing steps are reverted,
/// and both leave a warning behind.
#[derive(Debug, Clone)]
pub struct DataProcessor {
    registry: Arc<OperationRegistry>,
    max_steps: usize,
}

impl DataProcessor {
    pub fn new(registry: Arc<OperationRegistry>) -> Self {
        Self {
            registry,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    #[must_use]
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn registry(&self) -> &OperationRegistry {
        &self.registry
    }

    pub fn process(&self, df: DataFrame, plan: &OperationPlan) -> ProcessedTable {
        let start = Instant::now();
        let mut current = df;
        let mut applied = Vec::new();
        let mut warnings = Vec::new();

        let steps = if plan.len() > self.max_steps {
            warnings.push(format!(
                "Operation plan has {} steps, only the first {} were run",
                plan.len(),
                self.max_steps
            ));
            &plan.steps[..self.max_steps]
        } else {
            &plan.steps[..]
        };

        for step in steps {
            let Some(operation) = self.registry.get(&step.operation) else {
                tracing::warn!(operation = %step.operation, "skipping unregistered operation");
                warnings.push(format!(
                    "Operation '{}' is not registered, skipping for safety",
                    step.operation
                ));
                continue;
            };
            match operation.apply(&current, &step.params) {
                Ok(next) => {
                    tracing::debug!(
                        operation = operation.name(),
                        rows_before = current.height(),
                        rows_after = next.height(),
                        "applied operation"
                    );
                    current = next;
                    applied.push(operation.name().to_string());
                }
                Err(error) => {
                    tracing::warn!(operation = operation.name(), %error, "operation reverted");
                    warnings.push(format!("Operation '{}' failed: {error}", step.operation));
                }
            }
        }

        tracing::debug!(
            steps = steps.len(),
            applied = applied.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "processed table"
        );

        ProcessedTable {
            df: current,
            applied,
            warnings,
        }
    }
}
