//! Error types for table operations.
//!
//! Messages may name columns and operations but never carry cell values.

use polars::error::PolarsError;
use thiserror::Error;

/// Errors raised by a single operation step.
///
/// The processor turns every one of these into a warning and reverts the
/// step; none of them aborts a request.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    #[error("column '{0}' not found")]
    ColumnNotFound(String),

    #[error("column '{column}' must be {expected}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
    },

    #[error("result would have {count} columns, maximum is {max}")]
    TooManyColumns { count: usize, max: usize },

    #[error("column '{0}' already exists")]
    DuplicateColumn(String),

    /// Polars messages can quote cell values, so only the source keeps them.
    #[error("table engine rejected the operation")]
    Polars(#[from] PolarsError),
}

pub type Result<T> = std::result::Result<T, OperationError>;
