//! Mapping errors.

use chart_model::{ChannelSpec, ErrorCategory, ErrorCode, ErrorDetail, Phase, PipelineError};
use polars::error::PolarsError;
use thiserror::Error;

/// Column names listed in a hint before the rest are summarised.
const HINT_COLUMNS: usize = 10;

#[derive(Debug, Error)]
pub enum MappingError {
    /// One or more required channels found no usable column.
    #[error(
        "template '{template}' needs a column for {} but none is compatible",
        channel_list(.missing)
    )]
    MissingRequired {
        template: String,
        missing: Vec<ChannelSpec>,
        available: Vec<String>,
    },

    #[error("table engine rejected a column conversion")]
    Table(#[from] PolarsError),
}

pub type Result<T> = std::result::Result<T, MappingError>;

impl MappingError {
    pub fn hint(&self) -> String {
        match self {
            Self::MissingRequired { available, .. } => available_columns_hint(available),
            Self::Table(_) => "Check that the data columns have consistent types".to_string(),
        }
    }
}

impl From<MappingError> for PipelineError {
    fn from(error: MappingError) -> Self {
        let hint = error.hint();
        let message = error.to_string();
        match error {
            MappingError::MissingRequired { missing, .. } => {
                let details = missing.iter().map(|spec| {
                    let types: Vec<&str> = spec.types.iter().map(|ty| ty.as_str()).collect();
                    ErrorDetail::new(format!(
                        "no column with type {} is available",
                        types.join(" or ")
                    ))
                    .with_field(spec.channel.as_str())
                    .with_suggestion(format!(
                        "Ensure data has a column suitable for '{}' encoding",
                        spec.channel
                    ))
                });
                PipelineError::new(ErrorCategory::MappingError, Phase::DataMapping, message)
                    .with_hint(hint)
                    .with_details(details)
            }
            MappingError::Table(_) => {
                PipelineError::new(ErrorCategory::InternalError, Phase::DataMapping, message)
                    .with_code(ErrorCode::E500Internal)
                    .with_hint(hint)
            }
        }
    }
}

/// `Available columns: a, b, c (and 4 more)`.
pub fn available_columns_hint(columns: &[String]) -> String {
    if columns.is_empty() {
        return "Available columns: none".to_string();
    }
    let shown = columns
        .iter()
        .take(HINT_COLUMNS)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if columns.len() > HINT_COLUMNS {
        format!(
            "Available columns: {shown} (and {} more)",
            columns.len() - HINT_COLUMNS
        )
    } else {
        format!("Available columns: {shown}")
    }
}

fn channel_list(missing: &[ChannelSpec]) -> String {
    missing
        .iter()
        .map(|spec| format!("'{}'", spec.channel))
        .collect::<Vec<_>>()
        .join(", ")
}
