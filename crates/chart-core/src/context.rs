//! Per-request state.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use chart_model::{
    AuxiliaryElement, Decisions, MappingConfig, Pattern, Phase, PhaseTimings, RenderedImage,
    ResultStats, Versions, VisualizationResult,
};

/// Shared marker of the phase a request is in, readable after the pipeline
/// future has been dropped.
#[derive(Debug, Clone, Default)]
pub struct PhaseTracker(Arc<AtomicU8>);

impl PhaseTracker {
    pub fn enter(&self, phase: Phase) {
        let index = Phase::ALL.iter().position(|p| *p == phase).unwrap_or(0);
        self.0.store(index as u8, Ordering::Relaxed);
    }

    pub fn current(&self) -> Phase {
        Phase::ALL
            .get(usize::from(self.0.load(Ordering::Relaxed)))
            .copied()
            .unwrap_or(Phase::Validation)
    }
}

/// Additive record of one request, owned by a single pipeline run.
#[derive(Debug)]
pub struct ProcessingContext {
    pub correlation_id: String,
    pub warnings: Vec<String>,
    pub timings: PhaseTimings,
    pub stats: ResultStats,
    pub decisions: Decisions,
    pub operations_applied: Vec<String>,
    pub fallback_applied: bool,
    tracker: PhaseTracker,
}

impl ProcessingContext {
    pub fn new(correlation_id: impl Into<String>, tracker: PhaseTracker) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            warnings: Vec::new(),
            timings: PhaseTimings::default(),
            stats: ResultStats::default(),
            decisions: Decisions::default(),
            operations_applied: Vec::new(),
            fallback_applied: false,
            tracker,
        }
    }

    pub fn enter(&self, phase: Phase) {
        self.tracker.enter(phase);
    }

    pub fn current_phase(&self) -> Phase {
        self.tracker.current()
    }

    pub fn warn(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub fn extend_warnings(&mut self, warnings: impl IntoIterator<Item = String>) {
        self.warnings.extend(warnings);
    }

    /// Records a substituted value and why it was needed.
    pub fn record_fallback(&mut self, phase: Phase, reason: &str) {
        self.fallback_applied = true;
        let warning = match phase {
            Phase::ChartSelection => {
                format!("Chart selection fell back to the pattern's default template: {reason}")
            }
            Phase::DataProcessing => {
                format!("Data processing fell back to the unmodified table: {reason}")
            }
            other => format!("{other} fell back: {reason}"),
        };
        self.warnings.push(warning);
    }

    pub fn record_timing(&mut self, phase: Phase, elapsed_ms: u64) {
        self.timings.record(phase, elapsed_ms);
    }

    /// Final assembly; consumes the context.
    pub fn into_result(self, outcome: PipelineOutcome) -> VisualizationResult {
        VisualizationResult {
            correlation_id: self.correlation_id,
            pattern: outcome.pattern,
            template_id: outcome.template_id,
            mapping: outcome.mapping,
            auxiliary: outcome.auxiliary,
            operations_applied: self.operations_applied,
            warnings: self.warnings,
            timings: self.timings,
            stats: self.stats,
            decisions: self.decisions,
            fallback_applied: self.fallback_applied,
            versions: outcome.versions,
            image: outcome.image,
        }
    }
}

/// Decisions the pipeline produced, joined with the context at the end.
#[derive(Debug)]
pub struct PipelineOutcome {
    pub pattern: Pattern,
    pub template_id: String,
    pub mapping: MappingConfig,
    pub auxiliary: Vec<AuxiliaryElement>,
    pub versions: Versions,
    pub image: Option<RenderedImage>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracker_is_shared_between_clones() {
        let tracker = PhaseTracker::default();
        let context = ProcessingContext::new("id", tracker.clone());
        assert_eq!(tracker.current(), Phase::Validation);
        context.enter(Phase::DataMapping);
        assert_eq!(tracker.current(), Phase::DataMapping);
    }

    #[test]
    fn fallback_sets_flag_and_warns() {
        let mut context = ProcessingContext::new("id", PhaseTracker::default());
        context.record_fallback(Phase::DataProcessing, "data_processing exceeded its 10000 ms timeout");
        assert!(context.fallback_applied);
        assert_eq!(
            context.warnings,
            vec![
                "Data processing fell back to the unmodified table: data_processing exceeded its 10000 ms timeout"
                    .to_string()
            ]
        );
    }
}
