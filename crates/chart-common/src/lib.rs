//! Shared utilities for the chart pipeline crates.
//!
//! Cell parsing, column coercion, intent text handling and case-insensitive
//! column lookup.

pub mod lookup;
pub mod polars;
pub mod text;

pub use lookup::CaseInsensitiveSet;
pub use polars::{cell_text, days_since_epoch, parse_f64, string_to_date, string_to_float};
pub use text::{intent_terms, looks_temporal, normalize_text, parse_temporal};
