//! Cell parsing and column coercion for loaded tables.

use chrono::NaiveDate;
use polars::prelude::{AnyValue, Column, DataType, IntoColumn, NamedFrom, PolarsResult, Series};

use crate::text::parse_temporal;

/// Text of one cell as the profiler sees it when counting distinct values
/// and sniffing numbers or dates. Null is empty and strings are unquoted.
pub fn cell_text(value: AnyValue<'_>) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::String(s) => s.to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        AnyValue::Float32(v) => v.to_string(),
        AnyValue::Float64(v) => v.to_string(),
        other => other.to_string(),
    }
}

/// Parses a finite `f64`, tolerating surrounding whitespace and thousands separators.
pub fn parse_f64(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    let parsed = trimmed
        .parse::<f64>()
        .ok()
        .or_else(|| trimmed.replace(',', "").parse::<f64>().ok())?;
    parsed.is_finite().then_some(parsed)
}

/// Days since 1970-01-01, the physical value of a Polars `Date`.
pub fn days_since_epoch(date: NaiveDate) -> Option<i32> {
    i32::try_from(date.signed_duration_since(NaiveDate::default()).num_days()).ok()
}

/// Parses every value of `column` as a number with [`parse_f64`].
///
/// Unparsable values become null; the caller decides whether that is acceptable.
pub fn string_to_float(column: &Column) -> PolarsResult<Column> {
    let strings = column.cast(&DataType::String)?;
    let values: Vec<Option<f64>> = strings.str()?.iter().map(|v| v.and_then(parse_f64)).collect();
    Ok(Series::new(column.name().clone(), values).into_column())
}

/// Parses every value of `column` as a date with [`parse_temporal`].
///
/// Times of day are dropped. Unparsable values become null.
pub fn string_to_date(column: &Column) -> PolarsResult<Column> {
    let strings = column.cast(&DataType::String)?;
    let days: Vec<Option<i32>> = strings
        .str()?
        .iter()
        .map(|v| {
            v.and_then(parse_temporal)
                .and_then(|parsed| days_since_epoch(parsed.date()))
        })
        .collect();
    Series::new(column.name().clone(), days)
        .cast(&DataType::Date)
        .map(IntoColumn::into_column)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_text_is_unquoted_and_plain() {
        assert_eq!(cell_text(AnyValue::Null), "");
        assert_eq!(cell_text(AnyValue::Int64(-100)), "-100");
        assert_eq!(cell_text(AnyValue::Float64(120.0)), "120");
        assert_eq!(cell_text(AnyValue::Float64(2.5)), "2.5");
        assert_eq!(cell_text(AnyValue::String("north")), "north");
    }

    #[test]
    fn test_parse_f64() {
        assert_eq!(parse_f64(" 2.5 "), Some(2.5));
        assert_eq!(parse_f64("1,200"), Some(1200.0));
        assert_eq!(parse_f64(""), None);
        assert_eq!(parse_f64("NaN"), None);
        assert_eq!(parse_f64("abc"), None);
    }

    #[test]
    fn test_string_to_float_nulls_unparsable() {
        let column = Series::new("amount".into(), ["1,200", "x", "3.5"]).into_column();
        let parsed = string_to_float(&column).unwrap();
        assert_eq!(parsed.dtype(), &DataType::Float64);
        assert_eq!(parsed.null_count(), 1);
        assert_eq!(parsed.f64().unwrap().get(0), Some(1200.0));
    }

    #[test]
    fn test_string_to_date() {
        let column = Series::new("when".into(), ["1970-01-02", "2024-03", ""]).into_column();
        let parsed = string_to_date(&column).unwrap();
        assert_eq!(parsed.dtype(), &DataType::Date);
        assert_eq!(parsed.null_count(), 1);
        assert_eq!(parsed.get(0).unwrap(), AnyValue::Date(1));
        assert_eq!(
            days_since_epoch(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()),
            Some(19_783)
        );
    }
}
