//! Result and structured error returned to callers.
//!
//! Neither type carries raw cell values or the intent text.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auxiliary::AuxiliaryElement;
use crate::mapping::MappingConfig;
use crate::pattern::Pattern;
use crate::phase::Phase;
use crate::request::OutputFormat;

pub const API_VERSION: &str = "0.2.0";
pub const PATTERNS_VERSION: &str = "v1";

/// Error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCategory {
    ValidationError,
    PatternSelectionError,
    MappingError,
    RenderError,
    TimeoutError,
    RateLimited,
    Cancelled,
    InternalError,
}

impl ErrorCategory {
    pub fn default_code(self) -> ErrorCode {
        match self {
            Self::ValidationError => ErrorCode::E400Validation,
            Self::PatternSelectionError | Self::MappingError => ErrorCode::E422Unprocessable,
            Self::RenderError | Self::InternalError => ErrorCode::E500Internal,
            Self::TimeoutError => ErrorCode::E408Timeout,
            Self::RateLimited => ErrorCode::E429RateLimited,
            Self::Cancelled => ErrorCode::E499Cancelled,
        }
    }
}

/// Machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    #[serde(rename = "E400_VALIDATION")]
    E400Validation,
    #[serde(rename = "E413_TOO_LARGE")]
    E413TooLarge,
    #[serde(rename = "E415_UNSUPPORTED_FORMAT")]
    E415UnsupportedFormat,
    #[serde(rename = "E422_UNPROCESSABLE")]
    E422Unprocessable,
    #[serde(rename = "E424_UPSTREAM_CLASSIFIER")]
    E424UpstreamClassifier,
    #[serde(rename = "E408_TIMEOUT")]
    E408Timeout,
    #[serde(rename = "E429_RATE_LIMITED")]
    E429RateLimited,
    #[serde(rename = "E499_CANCELLED")]
    E499Cancelled,
    #[serde(rename = "E500_INTERNAL")]
    E500Internal,
    #[serde(rename = "E503_DEPENDENCY_UNAVAILABLE")]
    E503DependencyUnavailable,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::E400Validation => "E400_VALIDATION",
            Self::E413TooLarge => "E413_TOO_LARGE",
            Self::E415UnsupportedFormat => "E415_UNSUPPORTED_FORMAT",
            Self::E422Unprocessable => "E422_UNPROCESSABLE",
            Self::E424UpstreamClassifier => "E424_UPSTREAM_CLASSIFIER",
            Self::E408Timeout => "E408_TIMEOUT",
            Self::E429RateLimited => "E429_RATE_LIMITED",
            Self::E499Cancelled => "E499_CANCELLED",
            Self::E500Internal => "E500_INTERNAL",
            Self::E503DependencyUnavailable => "E503_DEPENDENCY_UNAVAILABLE",
        }
    }
}

/// One itemised problem inside an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl ErrorDetail {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            field: None,
            reason: reason.into(),
            suggestion: None,
        }
    }

    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// Structured pipeline failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("{code_str} in {phase}: {message}", code_str = .code.as_str())]
pub struct PipelineError {
    pub category: ErrorCategory,
    pub code: ErrorCode,
    pub phase: Phase,
    pub message: String,
    pub hint: Option<String>,
    #[serde(default)]
    pub details: Vec<ErrorDetail>,
    pub correlation_id: Option<String>,
    #[serde(default)]
    pub fallback_attempted: bool,
}

impl PipelineError {
    pub fn new(category: ErrorCategory, phase: Phase, message: impl Into<String>) -> Self {
        Self {
            category,
            code: category.default_code(),
            phase,
            message: message.into(),
            hint: None,
            details: Vec::new(),
            correlation_id: None,
            fallback_attempted: false,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::ValidationError, Phase::Validation, message)
    }

    pub fn timeout(phase: Phase, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::TimeoutError, phase, message)
    }

    #[must_use]
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = code;
        self
    }

    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    #[must_use]
    pub fn with_detail(mut self, detail: ErrorDetail) -> Self {
        self.details.push(detail);
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: impl IntoIterator<Item = ErrorDetail>) -> Self {
        self.details.extend(details);
        self
    }

    #[must_use]
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_fallback_attempted(mut self, attempted: bool) -> Self {
        self.fallback_attempted = attempted;
        self
    }
}

/// Per-phase elapsed time in milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTimings {
    pub phases: BTreeMap<Phase, u64>,
    pub total_ms: u64,
}

impl PhaseTimings {
    pub fn record(&mut self, phase: Phase, elapsed_ms: u64) {
        self.phases.insert(phase, elapsed_ms);
    }

    pub fn get(&self, phase: Phase) -> Option<u64> {
        self.phases.get(&phase).copied()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultStats {
    pub rows: usize,
    pub cols: usize,
    pub original_rows: usize,
    pub sampled: bool,
}

/// Reasoning returned by the classifier. Never contains the intent text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Decisions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern_reasoning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern_confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_reasoning: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Versions {
    pub api: String,
    pub templates: String,
    pub patterns: String,
}

impl Versions {
    pub fn new(templates: impl Into<String>) -> Self {
        Self {
            api: API_VERSION.to_string(),
            templates: templates.into(),
            patterns: PATTERNS_VERSION.to_string(),
        }
    }
}

/// Output of the render capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedImage {
    pub format: OutputFormat,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl RenderedImage {
    pub fn new(format: OutputFormat, bytes: Vec<u8>) -> Self {
        Self { format, bytes }
    }
}

/// Successful pipeline outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualizationResult {
    pub correlation_id: String,
    pub pattern: Pattern,
    pub template_id: String,
    pub mapping: MappingConfig,
    pub auxiliary: Vec<AuxiliaryElement>,
    pub operations_applied: Vec<String>,
    pub warnings: Vec<String>,
    pub timings: PhaseTimings,
    pub stats: ResultStats,
    pub decisions: Decisions,
    pub fallback_applied: bool,
    pub versions: Versions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<RenderedImage>,
}

impl VisualizationResult {
    pub fn sampled(&self) -> bool {
        self.stats.sampled
    }
}
