//! Error types for input ingestion.
//!
//! Messages describe the shape of the problem only; they never echo cell
//! values or intent text.

use chart_model::{DataFormat, ErrorCode, ErrorDetail, PipelineError};
use thiserror::Error;

/// Errors that can occur while validating and parsing a request payload.
#[derive(Debug, Error)]
pub enum IngestError {
    // === Payload ===
    #[error("data cannot be empty")]
    EmptyData,

    #[error("data size ({bytes} bytes) exceeds maximum of {max} bytes")]
    TooLarge { bytes: usize, max: usize },

    #[error("failed to parse {format} data")]
    Parse {
        format: DataFormat,
        #[source]
        source: polars::error::PolarsError,
    },

    #[error("invalid JSON data: {0}")]
    InvalidJson(String),

    #[error("unsupported JSON structure: expected an array of records or an object of arrays")]
    UnsupportedJsonShape,

    // === Table shape ===
    #[error("data has no columns")]
    NoColumns,

    #[error("data has {count} columns, maximum is {max}")]
    TooManyColumns { count: usize, max: usize },

    // === Intent ===
    #[error("intent cannot be empty")]
    EmptyIntent,

    #[error("intent has {chars} characters, maximum is {max}")]
    IntentTooLong { chars: usize, max: usize },
}

impl IngestError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::TooLarge { .. } => ErrorCode::E413TooLarge,
            Self::Parse { .. } | Self::InvalidJson(_) => ErrorCode::E422Unprocessable,
            Self::UnsupportedJsonShape => ErrorCode::E415UnsupportedFormat,
            Self::EmptyData
            | Self::NoColumns
            | Self::TooManyColumns { .. }
            | Self::EmptyIntent
            | Self::IntentTooLong { .. } => ErrorCode::E400Validation,
        }
    }

    pub fn field(&self) -> &'static str {
        match self {
            Self::EmptyIntent | Self::IntentTooLong { .. } => "intent",
            _ => "data",
        }
    }

    pub fn hint(&self) -> String {
        match self {
            Self::EmptyData => "Provide CSV or JSON data with a header row".to_string(),
            Self::TooLarge { .. } => "Reduce data size or pre-aggregate before sending".to_string(),
            Self::Parse { format, .. } => format!("Ensure your data is valid {format} format"),
            Self::InvalidJson(_) | Self::UnsupportedJsonShape => {
                "Send JSON as an array of records or an object of equal-length arrays".to_string()
            }
            Self::NoColumns => "Provide data with at least one column".to_string(),
            Self::TooManyColumns { max, .. } => {
                format!("Select at most {max} columns relevant to the chart")
            }
            Self::EmptyIntent | Self::IntentTooLong { .. } => {
                "Describe the visualization in 1 to 1000 characters".to_string()
            }
        }
    }
}

impl From<IngestError> for PipelineError {
    fn from(error: IngestError) -> Self {
        let detail = ErrorDetail::new(error.to_string()).with_field(error.field());
        PipelineError::validation(error.to_string())
            .with_code(error.code())
            .with_hint(error.hint())
            .with_detail(detail)
    }
}
