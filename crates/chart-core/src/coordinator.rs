//! Request orchestration.
//!
//! [`Coordinator::visualize`] runs the phases of [`phase_table`] in order.
//! Each phase's work is handed to [`run_phase`], which owns the timeout,
//! budget and fallback decisions; this module only wires values between
//! phases and records what happened in the [`ProcessingContext`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chart_common::intent_terms;
use chart_ingest::{DataLimits, load_table, profile_table};
use chart_map::{DataMapper, MappedTable};
use chart_model::{
    DataProfile, ErrorCategory, MappingConfig, Phase, PipelineError, RenderOptions, TemplateSpec,
    Versions, VisualizationResult, VisualizeRequest,
};
use chart_select::{
    ChartSelector, Classifier, ClassifierError, ConstrainedClassifier, MappingProposer,
    PatternSelector,
};
use chart_standards::TemplateRegistry;
use chart_transform::{DataProcessor, OperationRegistry, ProcessedTable, Sampler, resolve_plan};
use polars::prelude::DataFrame;
use tokio::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use crate::admission::Admission;
use crate::budget::TimeBudget;
use crate::config::PipelineConfig;
use crate::context::{PhaseTracker, PipelineOutcome, ProcessingContext};
use crate::phase::{PhaseDescriptor, PhaseOutcome, phase_table, run_phase};
use crate::render::{RenderInstruction, Renderer, render_with_fallback};

/// Runs visualization requests against shared, read-only collaborators.
///
/// One coordinator serves many concurrent requests; each request gets its
/// own [`ProcessingContext`] and nothing else is mutated.
pub struct Coordinator {
    config: PipelineConfig,
    classifier: ConstrainedClassifier,
    registry: Arc<dyn TemplateRegistry>,
    operations: Arc<OperationRegistry>,
    renderer: Option<Arc<dyn Renderer>>,
    admission: Admission,
}

impl Coordinator {
    pub fn new(
        config: PipelineConfig,
        classifier: Arc<dyn Classifier>,
        registry: Arc<dyn TemplateRegistry>,
    ) -> Self {
        let classifier =
            ConstrainedClassifier::new(classifier).with_settings(config.classifier.clone());
        let admission = Admission::new(config.concurrency.max_in_flight);
        Self {
            config,
            classifier,
            registry,
            operations: Arc::new(OperationRegistry::builtin()),
            renderer: None,
            admission,
        }
    }

    /// Enables the build phase.
    #[must_use]
    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    #[must_use]
    pub fn with_operations(mut self, operations: Arc<OperationRegistry>) -> Self {
        self.operations = operations;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn registry(&self) -> &dyn TemplateRegistry {
        self.registry.as_ref()
    }

    /// Requests that could be admitted right now.
    pub fn available_slots(&self) -> usize {
        self.admission.available()
    }

    /// Runs one request to completion. Dropping the returned future abandons
    /// the request at its current await point.
    pub async fn visualize(
        &self,
        request: VisualizeRequest,
    ) -> Result<VisualizationResult, PipelineError> {
        self.visualize_until(request, std::future::pending()).await
    }

    /// Like [`visualize`](Self::visualize), but gives up as soon as `cancel`
    /// resolves. A cancelled request yields a `Cancelled` error, never a
    /// result.
    pub async fn visualize_until<C>(
        &self,
        request: VisualizeRequest,
        cancel: C,
    ) -> Result<VisualizationResult, PipelineError>
    where
        C: Future<Output = ()>,
    {
        let correlation_id = Uuid::new_v4().to_string();
        let _permit = self
            .admission
            .try_admit()
            .map_err(|error| error.with_correlation_id(&correlation_id))?;

        let tracker = PhaseTracker::default();
        let span = tracing::info_span!("visualize", correlation_id = %correlation_id);
        let context = ProcessingContext::new(correlation_id.clone(), tracker.clone());
        let pipeline = self.run(request, context).instrument(span.clone());

        tokio::select! {
            biased;
            () = cancel => {
                let phase = tracker.current();
                span.in_scope(|| tracing::warn!(phase = %phase, "request cancelled"));
                Err(PipelineError::new(
                    ErrorCategory::Cancelled,
                    phase,
                    "request was cancelled by the caller",
                )
                .with_correlation_id(correlation_id))
            }
            result = pipeline => result.map_err(|error| error.with_correlation_id(correlation_id)),
        }
    }

    async fn run(
        &self,
        request: VisualizeRequest,
        mut ctx: ProcessingContext,
    ) -> Result<VisualizationResult, PipelineError> {
        let started = Instant::now();
        let budget = TimeBudget::start(self.config.timeouts.total());
        let [validation, pattern_phase, chart_phase, processing_phase, mapping_phase, build_phase] =
            phase_table(&self.config.timeouts);
        let VisualizeRequest {
            data,
            intent,
            options,
            operations,
        } = request;
        tracing::info!(bytes = data.len(), "visualization started");

        let limits = self.config.limits.clone();
        let checked_intent = intent.clone();
        let checked_options = options.clone();
        let validated = run_step(
            &mut ctx,
            &validation,
            &budget,
            async move {
                tokio::task::spawn_blocking(move || {
                    validate_request(&data, &checked_intent, &checked_options, &limits)
                })
                .await
                .map_err(|error| join_failure(Phase::Validation, &error))?
            },
            Err,
        )
        .await?;
        let Validated {
            df,
            profile,
            original_rows,
            warning,
        } = validated;
        ctx.stats.original_rows = original_rows;
        ctx.stats.sampled = profile.sampled;
        ctx.extend_warnings(warning);

        let pattern_selector = PatternSelector::new(self.classifier.clone());
        let decision = run_step(
            &mut ctx,
            &pattern_phase,
            &budget,
            async {
                pattern_selector
                    .select(&profile, &intent)
                    .await
                    .map_err(PipelineError::from)
            },
            Err,
        )
        .await?;
        let pattern = decision.pattern;
        ctx.decisions.pattern_reasoning = decision.reasoning;
        ctx.decisions.pattern_confidence = decision.confidence;

        let chart_selector =
            ChartSelector::new(self.classifier.clone(), Arc::clone(&self.registry))
                .with_auxiliary_deadline(auxiliary_deadline(&chart_phase));
        let chart = run_step(
            &mut ctx,
            &chart_phase,
            &budget,
            async {
                chart_selector
                    .select(pattern, &profile, &intent)
                    .await
                    .map_err(PipelineError::from)
            },
            |_| chart_selector.fallback(pattern).map_err(PipelineError::from),
        )
        .await?;
        if chart.fallback_applied {
            ctx.fallback_applied = true;
        }
        ctx.extend_warnings(chart.warnings);
        ctx.decisions.template_reasoning = chart.reasoning;
        let auxiliary = chart.auxiliary;
        let template = self.registry.template(&chart.template_id).ok_or_else(|| {
            PipelineError::new(
                ErrorCategory::InternalError,
                Phase::ChartSelection,
                format!("template '{}' is not registered", chart.template_id),
            )
        })?;

        let plan = resolve_plan(operations.as_ref(), template, &profile);
        let processor = DataProcessor::new(Arc::clone(&self.operations))
            .with_max_steps(self.config.processing.max_steps);
        let unmodified = df.clone();
        let processed = run_step(
            &mut ctx,
            &processing_phase,
            &budget,
            async move {
                tokio::task::spawn_blocking(move || processor.process(df, &plan))
                    .await
                    .map_err(|error| join_failure(Phase::DataProcessing, &error))
            },
            |_| {
                Ok(ProcessedTable {
                    df: unmodified,
                    applied: Vec::new(),
                    warnings: Vec::new(),
                })
            },
        )
        .await?;
        ctx.operations_applied = processed.applied;
        ctx.extend_warnings(processed.warnings);

        let mapped = run_step(
            &mut ctx,
            &mapping_phase,
            &budget,
            self.map_columns(template, processed.df, &intent, mapping_phase.timeout),
            Err,
        )
        .await?;
        let MappedTable {
            df: table,
            mapping,
            coercions,
            warnings,
        } = mapped;
        ctx.extend_warnings(warnings);
        ctx.stats.rows = table.height();
        ctx.stats.cols = table.width();
        tracing::debug!(
            channels = mapping.len(),
            coercions = coercions.len(),
            "columns mapped"
        );

        let image = match &self.renderer {
            Some(renderer) => {
                let instruction = RenderInstruction {
                    template_id: &template.id,
                    table: &table,
                    mapping: &mapping,
                    auxiliary: &auxiliary,
                    options: &options,
                };
                let rendered = run_step(
                    &mut ctx,
                    &build_phase,
                    &budget,
                    render_with_fallback(renderer.as_ref(), &instruction),
                    Err,
                )
                .await?;
                if rendered.fell_back {
                    ctx.fallback_applied = true;
                }
                ctx.extend_warnings(rendered.warnings);
                Some(rendered.image)
            }
            None => {
                tracing::debug!("no renderer configured, build skipped");
                None
            }
        };

        ctx.timings.total_ms = elapsed_ms(started);
        tracing::info!(
            pattern = %pattern,
            template = %template.id,
            warnings = ctx.warnings.len(),
            fallback_applied = ctx.fallback_applied,
            duration_ms = ctx.timings.total_ms,
            "visualization completed"
        );

        Ok(ctx.into_result(PipelineOutcome {
            pattern,
            template_id: template.id.clone(),
            mapping,
            auxiliary,
            versions: Versions::new(self.registry.revision()),
            image,
        }))
    }

    /// Re-profiles the processed table, optionally asks for a proposal and
    /// binds columns to the template's channels.
    async fn map_columns(
        &self,
        template: &TemplateSpec,
        df: DataFrame,
        intent: &str,
        phase_timeout: Duration,
    ) -> Result<MappedTable, PipelineError> {
        let profile = profile_table(&df);
        let mut notes = Vec::new();
        let mut mapper = DataMapper::new(template).with_intent_terms(intent_terms(intent));

        if self.config.processing.propose_mapping {
            let limit = Duration::from_millis(self.config.classifier.attempt_timeout_ms)
                .min(phase_timeout / 2);
            if let Some(proposal) = self
                .propose_mapping(template, &profile, intent, limit, &mut notes)
                .await
            {
                mapper = mapper.with_proposal(proposal);
            }
        }

        let mut mapped = mapper.map(df, &profile)?;
        notes.append(&mut mapped.warnings);
        mapped.warnings = notes;
        Ok(mapped)
    }

    async fn propose_mapping(
        &self,
        template: &TemplateSpec,
        profile: &DataProfile,
        intent: &str,
        limit: Duration,
        notes: &mut Vec<String>,
    ) -> Option<MappingConfig> {
        let proposer = MappingProposer::new(self.classifier.clone());
        match tokio::time::timeout(limit, proposer.propose(template, profile, intent)).await {
            Ok(Ok(proposal)) => Some(proposal),
            Ok(Err(ClassifierError::Unavailable)) => {
                tracing::debug!("mapping proposal unavailable, using heuristic");
                None
            }
            Ok(Err(error)) => {
                notes.push(format!(
                    "Mapping proposal failed, columns were matched heuristically: {error}"
                ));
                None
            }
            Err(_) => {
                notes.push(format!(
                    "Mapping proposal timed out after {} ms, columns were matched heuristically",
                    limit.as_millis()
                ));
                None
            }
        }
    }
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("config", &self.config)
            .field("templates", &self.registry.revision())
            .field("operations", &self.operations.len())
            .field("renderer", &self.renderer.is_some())
            .finish()
    }
}

/// Auxiliary selection must give up before the chart selection phase times
/// out, otherwise the phase timeout discards an already chosen template.
const AUXILIARY_MARGIN: Duration = Duration::from_millis(250);

fn auxiliary_deadline(descriptor: &PhaseDescriptor) -> Instant {
    Instant::now() + descriptor.timeout.saturating_sub(AUXILIARY_MARGIN)
}

/// Runs a phase and records its timing, fallback and current-phase marker.
async fn run_step<T, W, F>(
    ctx: &mut ProcessingContext,
    descriptor: &PhaseDescriptor,
    budget: &TimeBudget,
    work: W,
    fallback: F,
) -> Result<T, PipelineError>
where
    W: Future<Output = Result<T, PipelineError>>,
    F: FnOnce(PipelineError) -> Result<T, PipelineError>,
{
    ctx.enter(descriptor.phase);
    let started = Instant::now();
    let outcome = run_phase(descriptor, budget, work, fallback).await;
    ctx.record_timing(descriptor.phase, elapsed_ms(started));
    match outcome {
        PhaseOutcome::Success(value) => Ok(value),
        PhaseOutcome::Fallback { value, reason } => {
            ctx.record_fallback(descriptor.phase, &reason);
            Ok(value)
        }
        PhaseOutcome::Error(error) => Err(error),
    }
}

struct Validated {
    df: DataFrame,
    profile: DataProfile,
    original_rows: usize,
    warning: Option<String>,
}

/// Intent, options, payload and table checks, then sampling and profiling.
fn validate_request(
    data: &str,
    intent: &str,
    options: &RenderOptions,
    limits: &DataLimits,
) -> Result<Validated, PipelineError> {
    let start = std::time::Instant::now();
    limits.check_intent(intent)?;
    let problems = options.problems();
    if !problems.is_empty() {
        return Err(PipelineError::validation("render options are out of range")
            .with_hint("Adjust width, height or dpi to the allowed ranges")
            .with_details(problems));
    }

    let df = load_table(data, limits)?;
    let sampled = Sampler::new(limits.max_rows, limits.max_cells)
        .apply(df)
        .map_err(|error| {
            tracing::error!(%error, "sampling failed");
            PipelineError::new(
                ErrorCategory::InternalError,
                Phase::Validation,
                "sampling the table failed",
            )
        })?;
    let warning = sampled.warning();
    let mut profile = profile_table(&sampled.df);
    profile.sampled = sampled.sampled;
    profile.original_rows = sampled.sampled.then_some(sampled.original_rows);

    tracing::debug!(
        rows = profile.rows,
        cols = profile.column_count(),
        sampled = profile.sampled,
        duration_ms = start.elapsed().as_millis() as u64,
        "request validated"
    );
    Ok(Validated {
        df: sampled.df,
        profile,
        original_rows: sampled.original_rows,
        warning,
    })
}

fn join_failure(phase: Phase, error: &tokio::task::JoinError) -> PipelineError {
    tracing::error!(phase = %phase, panicked = error.is_panic(), "worker task failed");
    PipelineError::new(
        ErrorCategory::InternalError,
        phase,
        format!("{phase} worker stopped unexpectedly"),
    )
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}
