//! Pattern classification.
//!
//! A failed classification is always an error. No default pattern is ever
//! substituted, since a wrong pattern would misrepresent the request.

use chart_model::{
    DataProfile, ErrorCategory, ErrorCode, ErrorDetail, Pattern, Phase, PipelineError,
};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::classifier::{ClassifierError, ClassifierTask, ConstrainedClassifier};
use crate::prompt::pattern_request;

/// The chosen pattern and what the classifier said about it.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternDecision {
    pub pattern: Pattern,
    pub reasoning: Option<String>,
    /// In `0.0..=1.0`; out-of-range values are dropped.
    pub confidence: Option<f64>,
}

#[derive(Debug, Error)]
pub enum PatternSelectionError {
    #[error("pattern selection timed out")]
    Timeout,

    #[error("pattern classifier is unavailable: {0}")]
    Upstream(ClassifierError),

    #[error("pattern classifier reply was not usable: {0}")]
    InvalidReply(ClassifierError),
}

impl From<ClassifierError> for PatternSelectionError {
    fn from(error: ClassifierError) -> Self {
        match error {
            ClassifierError::Timeout(_) => Self::Timeout,
            ClassifierError::Transport(_) | ClassifierError::Unavailable => Self::Upstream(error),
            ClassifierError::Malformed(_) | ClassifierError::OutOfEnumeration(_) => {
                Self::InvalidReply(error)
            }
        }
    }
}

impl PatternSelectionError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Timeout | Self::InvalidReply(_) => ErrorCode::E422Unprocessable,
            Self::Upstream(ClassifierError::Unavailable) => ErrorCode::E503DependencyUnavailable,
            Self::Upstream(_) => ErrorCode::E424UpstreamClassifier,
        }
    }

    pub fn hint(&self) -> &'static str {
        match self {
            Self::Timeout => "The request took too long. Try a shorter request or try again",
            Self::Upstream(_) => "The classification service is unavailable. Try again later",
            Self::InvalidReply(_) => {
                "Rephrase the request: say what you want to compare, track or understand about your data"
            }
        }
    }
}

impl From<PatternSelectionError> for PipelineError {
    fn from(error: PatternSelectionError) -> Self {
        PipelineError::new(
            ErrorCategory::PatternSelectionError,
            Phase::PatternSelection,
            format!("Failed to select visualization pattern: {error}"),
        )
        .with_code(error.code())
        .with_hint(error.hint())
        .with_detail(ErrorDetail::new(error.to_string()).with_field("pattern_selection"))
    }
}

#[derive(Debug, Deserialize)]
struct PatternReply {
    pattern_id: String,
    #[serde(default)]
    reasoning: Option<String>,
    #[serde(default)]
    confidence: Option<Value>,
}

/// Classifies a profile and intent into one of the nine patterns.
#[derive(Debug, Clone)]
pub struct PatternSelector {
    classifier: ConstrainedClassifier,
}

impl PatternSelector {
    pub fn new(classifier: ConstrainedClassifier) -> Self {
        Self { classifier }
    }

    pub async fn select(
        &self,
        profile: &DataProfile,
        intent: &str,
    ) -> Result<PatternDecision, PatternSelectionError> {
        tracing::debug!(
            rows = profile.rows,
            cols = profile.column_count(),
            has_temporal = profile.has_temporal(),
            "selecting pattern"
        );
        let reply: PatternReply = self.classifier.ask(pattern_request(profile, intent)).await?;
        let decision = interpret(reply)?;
        tracing::debug!(
            pattern = %decision.pattern,
            confidence = decision.confidence,
            "pattern selected"
        );
        Ok(decision)
    }
}

fn interpret(reply: PatternReply) -> Result<PatternDecision, ClassifierError> {
    let pattern: Pattern = reply
        .pattern_id
        .parse()
        .map_err(|_| ClassifierError::OutOfEnumeration(ClassifierTask::Pattern))?;
    let confidence = reply
        .confidence
        .as_ref()
        .and_then(confidence_value)
        .filter(|value| (0.0..=1.0).contains(value));
    Ok(PatternDecision {
        pattern,
        reasoning: reply.reasoning.filter(|text| !text.trim().is_empty()),
        confidence,
    })
}

fn confidence_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}
