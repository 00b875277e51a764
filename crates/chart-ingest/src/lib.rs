//! Input handling for the chart pipeline.
//!
//! Parses CSV or JSON payloads into Polars DataFrames, enforces request
//! limits and builds the [`DataProfile`](chart_model::DataProfile) every
//! decision stage reads.

pub mod error;
pub mod profile;
pub mod reader;
pub mod validate;

pub use error::IngestError;
pub use profile::{dtype_class, profile_table};
pub use reader::read_table;
pub use validate::DataLimits;

use polars::prelude::DataFrame;

/// Checks the payload against `limits`, parses it and checks the table shape.
pub fn load_table(data: &str, limits: &DataLimits) -> Result<DataFrame, IngestError> {
    let format = limits.check_payload(data)?;
    let df = read_table(data, format)?;
    limits.check_shape(&df)?;
    Ok(df)
}
