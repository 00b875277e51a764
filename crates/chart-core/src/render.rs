//! Render capability.
//!
//! Drawing happens outside this workspace. The coordinator hands a
//! [`RenderInstruction`] to a [`Renderer`] and retries a failed PNG once as
//! SVG; SVG is never retried as PNG.

use async_trait::async_trait;
use chart_model::{
    AuxiliaryElement, ErrorCategory, ErrorDetail, MappingConfig, OutputFormat, Phase,
    PipelineError, RenderOptions, RenderedImage,
};
use polars::prelude::DataFrame;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{format} rendering failed: {reason}")]
pub struct RenderError {
    pub format: OutputFormat,
    pub reason: String,
}

impl RenderError {
    pub fn new(format: OutputFormat, reason: impl Into<String>) -> Self {
        Self {
            format,
            reason: reason.into(),
        }
    }
}

/// Everything a renderer needs to draw one chart.
#[derive(Debug, Clone, Copy)]
pub struct RenderInstruction<'a> {
    pub template_id: &'a str,
    pub table: &'a DataFrame,
    pub mapping: &'a MappingConfig,
    pub auxiliary: &'a [AuxiliaryElement],
    pub options: &'a RenderOptions,
}

#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(
        &self,
        instruction: &RenderInstruction<'_>,
        format: OutputFormat,
    ) -> Result<Vec<u8>, RenderError>;
}

/// A rendered image plus what happened on the way.
#[derive(Debug)]
pub struct RenderOutcome {
    pub image: RenderedImage,
    /// The alternate format was used.
    pub fell_back: bool,
    pub warnings: Vec<String>,
}

/// Renders in the requested format, retrying a PNG failure once as SVG.
pub async fn render_with_fallback(
    renderer: &dyn Renderer,
    instruction: &RenderInstruction<'_>,
) -> Result<RenderOutcome, PipelineError> {
    let requested = instruction.options.format;
    let first = match renderer.render(instruction, requested).await {
        Ok(bytes) => {
            tracing::debug!(format = %requested, bytes = bytes.len(), "rendered chart");
            return Ok(RenderOutcome {
                image: RenderedImage::new(requested, bytes),
                fell_back: false,
                warnings: Vec::new(),
            });
        }
        Err(error) => error,
    };
    tracing::warn!(format = %requested, reason = %first.reason, "render failed");

    let Some(alternate) = requested.alternate() else {
        return Err(render_failure(&[first]));
    };
    match renderer.render(instruction, alternate).await {
        Ok(bytes) => {
            tracing::debug!(format = %alternate, bytes = bytes.len(), "rendered chart after retry");
            Ok(RenderOutcome {
                image: RenderedImage::new(alternate, bytes),
                fell_back: true,
                warnings: vec![format!(
                    "{} export failed, fell back to {}",
                    requested.as_str().to_uppercase(),
                    alternate.as_str().to_uppercase()
                )],
            })
        }
        Err(second) => Err(render_failure(&[first, second])),
    }
}

fn render_failure(attempts: &[RenderError]) -> PipelineError {
    let formats: Vec<&str> = attempts.iter().map(|error| error.format.as_str()).collect();
    PipelineError::new(
        ErrorCategory::RenderError,
        Phase::Build,
        format!("Chart rendering failed ({})", formats.join(", ")),
    )
    .with_hint("Try a smaller image size or SVG output")
    .with_details(attempts.iter().map(|error| {
        ErrorDetail::new(error.to_string()).with_field(format!("options.format.{}", error.format))
    }))
    .with_fallback_attempted(attempts.len() > 1)
}
