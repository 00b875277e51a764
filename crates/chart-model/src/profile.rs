//! Data profile shared by every decision stage.

use serde::{Deserialize, Serialize};

use crate::encoding::SemanticType;

/// Storage class of a column after parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnDtype {
    Integer,
    Float,
    Boolean,
    String,
    Date,
    Datetime,
    Other,
}

impl ColumnDtype {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::String => "string",
            Self::Date => "date",
            Self::Datetime => "datetime",
            Self::Other => "other",
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Float)
    }
}

/// Profile of one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub name: String,
    pub dtype: ColumnDtype,
    pub semantic_type: SemanticType,
    /// Ratio of null or empty values (0.0 to 1.0).
    pub null_ratio: f64,
    /// Distinct non-null values.
    pub unique_count: usize,
    /// String column whose values mostly parse as numbers.
    pub numeric_like: bool,
    /// String column whose values mostly parse as dates.
    pub temporal_like: bool,
}

/// Profile of the whole table.
///
/// Computed once per table and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataProfile {
    pub rows: usize,
    pub columns: Vec<ColumnProfile>,
    pub sampled: bool,
    /// Row count before sampling, when sampling happened.
    pub original_rows: Option<usize>,
}

impl DataProfile {
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn cell_count(&self) -> usize {
        self.rows.saturating_mul(self.columns.len())
    }

    pub fn column(&self, name: &str) -> Option<&ColumnProfile> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|column| column.name.as_str()).collect()
    }

    pub fn has_temporal(&self) -> bool {
        self.columns
            .iter()
            .any(|column| column.semantic_type == SemanticType::Temporal || column.temporal_like)
    }

    /// First column that is, or can become, temporal.
    pub fn first_temporal(&self) -> Option<&ColumnProfile> {
        self.columns
            .iter()
            .find(|column| column.semantic_type == SemanticType::Temporal)
            .or_else(|| self.columns.iter().find(|column| column.temporal_like))
    }

    /// A discrete column with fewer distinct values than half the rows.
    pub fn has_categorical(&self) -> bool {
        self.columns.iter().any(|column| {
            column.semantic_type.is_discrete()
                && !column.temporal_like
                && !column.numeric_like
                && (column.unique_count as f64) < self.rows as f64 * 0.5
        })
    }

    /// Number of columns per semantic type, in a stable order.
    pub fn type_counts(&self) -> Vec<(SemanticType, usize)> {
        SemanticType::ALL
            .into_iter()
            .map(|ty| {
                let count = self
                    .columns
                    .iter()
                    .filter(|column| column.semantic_type == ty)
                    .count();
                (ty, count)
            })
            .filter(|(_, count)| *count > 0)
            .collect()
    }
}
