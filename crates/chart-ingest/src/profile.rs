//! Default profiling capability.
//!
//! Every column is scanned once through its string form, the same way for
//! every dtype, so counts stay comparable between CSV and JSON inputs.

use std::collections::BTreeSet;
use std::time::Instant;

use polars::prelude::{Column, DataFrame, DataType};

use chart_common::{cell_text, looks_temporal, parse_f64};
use chart_model::{ColumnDtype, ColumnProfile, DataProfile, SemanticType};

/// Share of non-empty values that must parse for a string column to count
/// as numeric-like or temporal-like.
const SNIFF_THRESHOLD: f64 = 0.9;

/// Integer columns with at most this many distinct values may be ordinal.
const ORDINAL_MAX_DISTINCT: usize = 12;
const ORDINAL_MAX_RATIO: f64 = 0.05;

/// Profiles every column of `df`.
pub fn profile_table(df: &DataFrame) -> DataProfile {
    let start = Instant::now();
    let columns: Vec<ColumnProfile> = df.get_columns().iter().map(profile_column).collect();

    tracing::debug!(
        rows = df.height(),
        cols = columns.len(),
        duration_ms = start.elapsed().as_millis() as u64,
        "profiled table"
    );

    DataProfile {
        rows: df.height(),
        columns,
        sampled: false,
        original_rows: None,
    }
}

/// Maps a Polars dtype to its storage class.
pub fn dtype_class(dtype: &DataType) -> ColumnDtype {
    match dtype {
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => ColumnDtype::Integer,
        DataType::Float32 | DataType::Float64 => ColumnDtype::Float,
        DataType::Boolean => ColumnDtype::Boolean,
        DataType::String => ColumnDtype::String,
        DataType::Date => ColumnDtype::Date,
        DataType::Datetime(_, _) => ColumnDtype::Datetime,
        _ => ColumnDtype::Other,
    }
}

#[derive(Default)]
struct ValueScan {
    empty: usize,
    distinct: BTreeSet<String>,
    numeric: usize,
    temporal: usize,
}

impl ValueScan {
    fn push(&mut self, raw: &str, sniff: bool) {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            self.empty += 1;
            return;
        }
        if sniff {
            if parse_f64(trimmed).is_some() {
                self.numeric += 1;
            } else if looks_temporal(trimmed) {
                self.temporal += 1;
            }
        }
        if !self.distinct.contains(trimmed) {
            self.distinct.insert(trimmed.to_string());
        }
    }
}

fn profile_column(col: &Column) -> ColumnProfile {
    let total = col.len();
    let dtype = dtype_class(col.dtype());
    let sniff = dtype == ColumnDtype::String;

    let mut scan = ValueScan::default();
    match col.cast(&DataType::String) {
        Ok(strings) => match strings.str() {
            Ok(chunked) => {
                for value in chunked.iter() {
                    scan.push(value.unwrap_or(""), sniff);
                }
            }
            Err(_) => scan_any_values(col, &mut scan, sniff),
        },
        Err(_) => scan_any_values(col, &mut scan, sniff),
    }

    let non_empty = total - scan.empty;
    let null_ratio = if total == 0 {
        1.0
    } else {
        scan.empty as f64 / total as f64
    };
    let share = |count: usize| non_empty > 0 && count as f64 / non_empty as f64 > SNIFF_THRESHOLD;
    let numeric_like = sniff && share(scan.numeric);
    let temporal_like = sniff && share(scan.temporal);
    let unique_count = scan.distinct.len();

    ColumnProfile {
        name: col.name().to_string(),
        dtype,
        semantic_type: semantic_type(dtype, unique_count, non_empty),
        null_ratio,
        unique_count,
        numeric_like,
        temporal_like,
    }
}

fn scan_any_values(col: &Column, scan: &mut ValueScan, sniff: bool) {
    for idx in 0..col.len() {
        let text = col.get(idx).map(cell_text).unwrap_or_default();
        scan.push(&text, sniff);
    }
}

fn semantic_type(dtype: ColumnDtype, unique_count: usize, non_empty: usize) -> SemanticType {
    match dtype {
        ColumnDtype::Date | ColumnDtype::Datetime => SemanticType::Temporal,
        ColumnDtype::Integer => {
            let ratio = if non_empty == 0 {
                1.0
            } else {
                unique_count as f64 / non_empty as f64
            };
            if unique_count <= ORDINAL_MAX_DISTINCT && ratio < ORDINAL_MAX_RATIO {
                SemanticType::Ordinal
            } else {
                SemanticType::Quantitative
            }
        }
        ColumnDtype::Float => SemanticType::Quantitative,
        ColumnDtype::Boolean | ColumnDtype::String | ColumnDtype::Other => SemanticType::Nominal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    #[test]
    fn test_profile_types_and_nulls() {
        let df = df! {
            "region" => ["north", "south", "north", ""],
            "sales" => [10.5, 12.0, 9.25, 11.0],
            "units" => [Some(1i64), None, Some(3), Some(4)],
            "active" => [true, false, true, true],
        }
        .unwrap();

        let profile = profile_table(&df);
        assert_eq!(profile.rows, 4);
        assert_eq!(profile.column_count(), 4);

        let region = profile.column("region").unwrap();
        assert_eq!(region.dtype, ColumnDtype::String);
        assert_eq!(region.semantic_type, SemanticType::Nominal);
        assert_eq!(region.unique_count, 2);
        assert!((region.null_ratio - 0.25).abs() < f64::EPSILON);

        let sales = profile.column("sales").unwrap();
        assert_eq!(sales.semantic_type, SemanticType::Quantitative);
        assert_eq!(sales.null_ratio, 0.0);

        let units = profile.column("units").unwrap();
        assert_eq!(units.dtype, ColumnDtype::Integer);
        assert_eq!(units.semantic_type, SemanticType::Quantitative);

        assert_eq!(
            profile.column("active").unwrap().semantic_type,
            SemanticType::Nominal
        );
    }

    #[test]
    fn test_string_columns_get_sniff_flags() {
        let df = df! {
            "when" => ["2024-01-01", "2024-02-01", "2024-03-01"],
            "amount" => ["1,200", "1,350.5", "980"],
            "label" => ["a", "b", "c"],
        }
        .unwrap();
        let profile = profile_table(&df);

        let when = profile.column("when").unwrap();
        assert!(when.temporal_like);
        assert!(!when.numeric_like);
        assert_eq!(when.semantic_type, SemanticType::Nominal);

        assert!(profile.column("amount").unwrap().numeric_like);
        let label = profile.column("label").unwrap();
        assert!(!label.numeric_like && !label.temporal_like);
        assert_eq!(profile.first_temporal().unwrap().name, "when");
    }

    #[test]
    fn test_low_cardinality_integers_are_ordinal() {
        let ratings: Vec<i64> = (0..300).map(|i| i % 5).collect();
        let df = DataFrame::new(vec![Series::new("rating".into(), ratings).into_column()]).unwrap();
        let profile = profile_table(&df);
        assert_eq!(
            profile.column("rating").unwrap().semantic_type,
            SemanticType::Ordinal
        );
    }

    #[test]
    fn test_dates_are_temporal() {
        let dates = Series::new("day".into(), [19_000i32, 19_001, 19_002])
            .cast(&DataType::Date)
            .unwrap();
        let df = DataFrame::new(vec![dates.into_column()]).unwrap();
        let profile = profile_table(&df);
        let day = profile.column("day").unwrap();
        assert_eq!(day.dtype, ColumnDtype::Date);
        assert_eq!(day.semantic_type, SemanticType::Temporal);
        assert!(profile.has_temporal());
    }
}
