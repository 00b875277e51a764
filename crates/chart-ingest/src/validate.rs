//! Request limits and structural checks.

use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};

use chart_model::DataFormat;

use crate::error::IngestError;

/// Size limits applied to every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataLimits {
    pub max_bytes: usize,
    /// Rows kept after sampling.
    pub max_rows: usize,
    pub max_columns: usize,
    /// Cell count above which the table is sampled.
    pub max_cells: usize,
    pub max_intent_chars: usize,
}

impl Default for DataLimits {
    fn default() -> Self {
        Self {
            max_bytes: 100 * 1024 * 1024,
            max_rows: 10_000,
            max_columns: 100,
            max_cells: 1_000_000,
            max_intent_chars: 1000,
        }
    }
}

impl DataLimits {
    /// Checks payload size and detects its format.
    pub fn check_payload(&self, data: &str) -> Result<DataFormat, IngestError> {
        if data.trim().is_empty() {
            return Err(IngestError::EmptyData);
        }
        if data.len() > self.max_bytes {
            return Err(IngestError::TooLarge {
                bytes: data.len(),
                max: self.max_bytes,
            });
        }
        Ok(DataFormat::detect(data))
    }

    pub fn check_intent(&self, intent: &str) -> Result<(), IngestError> {
        let chars = intent.trim().chars().count();
        if chars == 0 {
            return Err(IngestError::EmptyIntent);
        }
        if chars > self.max_intent_chars {
            return Err(IngestError::IntentTooLong {
                chars,
                max: self.max_intent_chars,
            });
        }
        Ok(())
    }

    /// Rejects tables with no rows, no columns or too many columns.
    pub fn check_shape(&self, df: &DataFrame) -> Result<(), IngestError> {
        if df.width() == 0 {
            return Err(IngestError::NoColumns);
        }
        if df.width() > self.max_columns {
            return Err(IngestError::TooManyColumns {
                count: df.width(),
                max: self.max_columns,
            });
        }
        if df.height() == 0 {
            return Err(IngestError::EmptyData);
        }
        Ok(())
    }
}
