//! Parsing request payloads into Polars DataFrames.

use std::io::Cursor;

use polars::prelude::{
    Column, CsvReadOptions, DataFrame, IntoColumn, NamedFrom, SerReader, Series,
};
use serde_json::{Map, Value};

use chart_model::DataFormat;

use crate::error::IngestError;

/// Rows scanned for CSV schema inference.
const INFER_SCHEMA_ROWS: usize = 1000;

/// Parses `data` in the given format.
pub fn read_table(data: &str, format: DataFormat) -> Result<DataFrame, IngestError> {
    if data.trim().is_empty() {
        return Err(IngestError::EmptyData);
    }
    match format {
        DataFormat::Csv => read_csv(data),
        DataFormat::Json => read_json(data),
    }
}

fn read_csv(data: &str) -> Result<DataFrame, IngestError> {
    let cursor = Cursor::new(data.as_bytes().to_vec());
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
        .map_parse_options(|options| options.with_try_parse_dates(true))
        .into_reader_with_file_handle(cursor)
        .finish()
        .map_err(|source| IngestError::Parse {
            format: DataFormat::Csv,
            source,
        })
}

/// Reads an array of records or an object of arrays.
fn read_json(data: &str) -> Result<DataFrame, IngestError> {
    let value: Value =
        serde_json::from_str(data).map_err(|e| IngestError::InvalidJson(e.to_string()))?;

    let columns: Vec<(String, Vec<Value>)> = match value {
        Value::Array(records) => columns_from_records(records)?,
        Value::Object(object) => object
            .into_iter()
            .map(|(name, values)| match values {
                Value::Array(values) => Ok((name, values)),
                _ => Err(IngestError::UnsupportedJsonShape),
            })
            .collect::<Result<_, _>>()?,
        _ => return Err(IngestError::UnsupportedJsonShape),
    };

    let columns: Vec<Column> = columns
        .into_iter()
        .map(|(name, values)| build_column(&name, &values))
        .collect();
    DataFrame::new(columns).map_err(|source| IngestError::Parse {
        format: DataFormat::Json,
        source,
    })
}

fn columns_from_records(records: Vec<Value>) -> Result<Vec<(String, Vec<Value>)>, IngestError> {
    let rows: Vec<Map<String, Value>> = records
        .into_iter()
        .map(|record| match record {
            Value::Object(map) => Ok(map),
            _ => Err(IngestError::UnsupportedJsonShape),
        })
        .collect::<Result<_, _>>()?;

    // Column order follows first appearance across records.
    let mut names: Vec<String> = Vec::new();
    for row in &rows {
        for key in row.keys() {
            if !names.contains(key) {
                names.push(key.clone());
            }
        }
    }

    Ok(names
        .into_iter()
        .map(|name| {
            let values = rows
                .iter()
                .map(|row| row.get(&name).cloned().unwrap_or(Value::Null))
                .collect();
            (name, values)
        })
        .collect())
}

/// Builds the narrowest column type that holds every non-null value.
fn build_column(name: &str, values: &[Value]) -> Column {
    let non_null = || values.iter().filter(|value| !value.is_null());

    let series = if non_null().all(Value::is_boolean) {
        let data: Vec<Option<bool>> = values.iter().map(Value::as_bool).collect();
        Series::new(name.into(), data)
    } else if non_null().all(|value| value.is_i64()) {
        let data: Vec<Option<i64>> = values.iter().map(Value::as_i64).collect();
        Series::new(name.into(), data)
    } else if non_null().all(Value::is_number) {
        let data: Vec<Option<f64>> = values.iter().map(Value::as_f64).collect();
        Series::new(name.into(), data)
    } else {
        let data: Vec<Option<String>> = values
            .iter()
            .map(|value| match value {
                Value::Null => None,
                Value::String(text) => Some(text.clone()),
                other => Some(other.to_string()),
            })
            .collect();
        Series::new(name.into(), data)
    };
    series.into_column()
}
