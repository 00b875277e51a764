//! Implementations of the registered table operations.
//!
//! Every function takes the table by reference and returns a new one, so a
//! failing step leaves its input untouched. Column names in parameters are
//! resolved case-insensitively.

use polars::prelude::*;
use serde_json::{Map, Value};

use chart_common::{
    CaseInsensitiveSet, days_since_epoch, parse_f64, parse_temporal, string_to_date,
    string_to_float,
};

use crate::error::{OperationError, Result};
use crate::params::{
    AggFunc, CastParams, CastType, ColumnsParams, CompareOp, FillNullParams, FillStrategy,
    FilterParams, GroupAggregateParams, LimitFrom, LimitParams, PivotParams, RenameParams,
    ResampleParams, SampleParams, SortParams, parse_params,
};
use crate::sampler::{equidistant_indices, take_rows};

/// Most columns a pivot may produce.
pub const MAX_PIVOT_COLUMNS: usize = 50;

struct ColumnLookup {
    names: CaseInsensitiveSet,
}

impl ColumnLookup {
    fn new(df: &DataFrame) -> Self {
        Self {
            names: CaseInsensitiveSet::new(df.get_column_names_owned()),
        }
    }

    fn resolve(&self, name: &str) -> Result<String> {
        self.names
            .get(name)
            .map(str::to_string)
            .ok_or_else(|| OperationError::ColumnNotFound(name.to_string()))
    }

    fn resolve_all(&self, names: &[String]) -> Result<Vec<String>> {
        names.iter().map(|name| self.resolve(name)).collect()
    }
}

fn is_numeric(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

fn is_temporal(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Date | DataType::Datetime(_, _))
}

/// Builds a literal comparable with a column of `dtype`.
fn literal_for(dtype: &DataType, column: &str, value: &Value) -> Result<Expr> {
    match (dtype, value) {
        (_, Value::Null) => Err(OperationError::InvalidParams(
            "value must not be null".to_string(),
        )),
        (DataType::Date, Value::String(text)) => {
            let days = parse_temporal(text)
                .and_then(|parsed| days_since_epoch(parsed.date()))
                .ok_or_else(|| OperationError::TypeMismatch {
                    column: column.to_string(),
                    expected: "compared with a date",
                })?;
            Ok(lit(days).cast(DataType::Date))
        }
        (DataType::Datetime(unit, _), Value::String(text)) => {
            let parsed = parse_temporal(text).ok_or_else(|| OperationError::TypeMismatch {
                column: column.to_string(),
                expected: "compared with a datetime",
            })?;
            let utc = parsed.and_utc();
            let stamp = match unit {
                TimeUnit::Nanoseconds => utc.timestamp_nanos_opt(),
                TimeUnit::Microseconds => Some(utc.timestamp_micros()),
                TimeUnit::Milliseconds => Some(utc.timestamp_millis()),
            }
            .ok_or_else(|| OperationError::InvalidParams("datetime out of range".to_string()))?;
            Ok(lit(stamp).cast(dtype.clone()))
        }
        (dtype, Value::String(text)) if is_numeric(dtype) => parse_f64(text)
            .map(lit)
            .ok_or_else(|| OperationError::TypeMismatch {
                column: column.to_string(),
                expected: "compared with a number",
            }),
        (_, Value::String(text)) => Ok(lit(text.clone())),
        (_, Value::Bool(flag)) => Ok(lit(*flag)),
        (_, Value::Number(number)) => match (number.as_i64(), number.as_f64()) {
            (Some(int), _) => Ok(lit(int)),
            (None, Some(float)) => Ok(lit(float)),
            (None, None) => Err(OperationError::InvalidParams(
                "number out of range".to_string(),
            )),
        },
        (_, Value::Array(_) | Value::Object(_)) => Err(OperationError::InvalidParams(
            "value must be a scalar".to_string(),
        )),
    }
}

fn aggregation(df: &DataFrame, column: &str, func: AggFunc) -> Result<Expr> {
    if func.needs_numeric() && !is_numeric(df.column(column)?.dtype()) {
        return Err(OperationError::TypeMismatch {
            column: column.to_string(),
            expected: "numeric",
        });
    }
    Ok(apply_agg(col(column), func).alias(format!("{column}_{}", func.as_str())))
}

fn apply_agg(expr: Expr, func: AggFunc) -> Expr {
    match func {
        AggFunc::Sum => expr.sum(),
        AggFunc::Mean => expr.mean(),
        AggFunc::Count => expr.count(),
        AggFunc::Min => expr.min(),
        AggFunc::Max => expr.max(),
        AggFunc::Median => expr.median(),
        AggFunc::Std => expr.std(1),
    }
}

/// Keeps rows where `column <op> value`.
pub fn filter(df: &DataFrame, params: &Map<String, Value>) -> Result<DataFrame> {
    let params: FilterParams = parse_params(params)?;
    let column = ColumnLookup::new(df).resolve(&params.column)?;
    let value = literal_for(df.column(&column)?.dtype(), &column, &params.value)?;
    let target = col(column.as_str());
    let predicate = match params.op {
        CompareOp::Eq => target.eq(value),
        CompareOp::Ne => target.neq(value),
        CompareOp::Gt => target.gt(value),
        CompareOp::Ge => target.gt_eq(value),
        CompareOp::Lt => target.lt(value),
        CompareOp::Le => target.lt_eq(value),
    };
    Ok(df.clone().lazy().filter(predicate).collect()?)
}

/// Stable sort by one or more columns; nulls last.
pub fn sort(df: &DataFrame, params: &Map<String, Value>) -> Result<DataFrame> {
    let params: SortParams = parse_params(params)?;
    let by = ColumnLookup::new(df).resolve_all(&params.by.into_vec())?;
    if by.is_empty() {
        return Err(OperationError::InvalidParams("'by' must name a column".to_string()));
    }
    let exprs: Vec<Expr> = by.iter().map(|name| col(name.as_str())).collect();
    let options = SortMultipleOptions::default()
        .with_order_descending(params.descending)
        .with_nulls_last(true)
        .with_maintain_order(true);
    Ok(df.clone().lazy().sort_by_exprs(exprs, options).collect()?)
}

/// Groups in first-appearance order and aggregates into `<column>_<func>`.
pub fn group_aggregate(df: &DataFrame, params: &Map<String, Value>) -> Result<DataFrame> {
    let params: GroupAggregateParams = parse_params(params)?;
    let lookup = ColumnLookup::new(df);
    let by = lookup.resolve_all(&params.by.into_vec())?;
    if by.is_empty() || params.aggregations.is_empty() {
        return Err(OperationError::InvalidParams(
            "'by' and 'aggregations' must not be empty".to_string(),
        ));
    }
    let aggs = params
        .aggregations
        .iter()
        .map(|(name, func)| aggregation(df, &lookup.resolve(name)?, *func))
        .collect::<Result<Vec<_>>>()?;
    let keys: Vec<Expr> = by.iter().map(|name| col(name.as_str())).collect();
    Ok(df.clone().lazy().group_by_stable(keys).agg(aggs).collect()?)
}

/// Spreads the distinct values of `columns` into one column each.
pub fn pivot(df: &DataFrame, params: &Map<String, Value>) -> Result<DataFrame> {
    let params: PivotParams = parse_params(params)?;
    let lookup = ColumnLookup::new(df);
    let index = lookup.resolve(&params.index)?;
    let spread = lookup.resolve(&params.columns)?;
    let values = lookup.resolve(&params.values)?;
    if params.aggregate.needs_numeric() && !is_numeric(df.column(&values)?.dtype()) {
        return Err(OperationError::TypeMismatch {
            column: values,
            expected: "numeric",
        });
    }

    let keys_column = df.column(&spread)?.cast(&DataType::String)?;
    let mut keys: Vec<String> = Vec::new();
    for key in keys_column.str()?.iter().flatten() {
        if !key.is_empty() && !keys.iter().any(|seen| seen == key) {
            keys.push(key.to_string());
        }
    }
    if keys.len() > MAX_PIVOT_COLUMNS {
        return Err(OperationError::TooManyColumns {
            count: keys.len(),
            max: MAX_PIVOT_COLUMNS,
        });
    }

    let aggs: Vec<Expr> = keys
        .iter()
        .map(|key| {
            let name = if *key == index {
                format!("{values}_{key}")
            } else {
                key.clone()
            };
            let cell = col(values.as_str())
                .filter(col(spread.as_str()).cast(DataType::String).eq(lit(key.clone())));
            apply_agg(cell, params.aggregate).alias(name)
        })
        .collect();
    Ok(df
        .clone()
        .lazy()
        .group_by_stable([col(index.as_str())])
        .agg(aggs)
        .collect()?)
}

/// Buckets a date or datetime column and aggregates per bucket.
pub fn resample(df: &DataFrame, params: &Map<String, Value>) -> Result<DataFrame> {
    let params: ResampleParams = parse_params(params)?;
    let lookup = ColumnLookup::new(df);
    let time = lookup.resolve(&params.time_column)?;
    if !is_temporal(df.column(&time)?.dtype()) {
        return Err(OperationError::TypeMismatch {
            column: time,
            expected: "a date or datetime",
        });
    }
    if params.aggregations.is_empty() {
        return Err(OperationError::InvalidParams(
            "'aggregations' must not be empty".to_string(),
        ));
    }
    let aggs = params
        .aggregations
        .iter()
        .map(|(name, func)| aggregation(df, &lookup.resolve(name)?, *func))
        .collect::<Result<Vec<_>>>()?;
    let bucket = col(time.as_str())
        .dt()
        .truncate(lit(params.every.as_duration()))
        .alias(time.as_str());
    Ok(df
        .clone()
        .lazy()
        .group_by_stable([bucket])
        .agg(aggs)
        .sort_by_exprs(
            [col(time.as_str())],
            SortMultipleOptions::default().with_maintain_order(true),
        )
        .collect()?)
}

/// Renames columns in one pass, so swaps and chains are allowed.
pub fn rename(df: &DataFrame, params: &Map<String, Value>) -> Result<DataFrame> {
    let params: RenameParams = parse_params(params)?;
    let lookup = ColumnLookup::new(df);
    let mut renames: Vec<(String, String)> = Vec::with_capacity(params.mapping.len());
    for (old, new) in &params.mapping {
        if new.trim().is_empty() {
            return Err(OperationError::InvalidParams(
                "new column names must not be empty".to_string(),
            ));
        }
        renames.push((lookup.resolve(old)?, new.clone()));
    }

    let mut final_names: Vec<String> = Vec::with_capacity(df.width());
    let mut exprs: Vec<Expr> = Vec::with_capacity(df.width());
    for name in df.get_column_names_owned() {
        let name = name.as_str().to_string();
        let target = renames
            .iter()
            .find(|(old, _)| *old == name)
            .map_or_else(|| name.clone(), |(_, new)| new.clone());
        if final_names.contains(&target) {
            return Err(OperationError::DuplicateColumn(target));
        }
        exprs.push(col(name.as_str()).alias(target.as_str()));
        final_names.push(target);
    }
    Ok(df.clone().lazy().select(exprs).collect()?)
}

/// First or last `n` rows.
pub fn limit(df: &DataFrame, params: &Map<String, Value>) -> Result<DataFrame> {
    let params: LimitParams = parse_params(params)?;
    if params.n == 0 {
        return Err(OperationError::InvalidParams("'n' must be at least 1".to_string()));
    }
    Ok(match params.from {
        LimitFrom::Head => df.head(Some(params.n)),
        LimitFrom::Tail => df.tail(Some(params.n)),
    })
}

/// Keeps `n` rows at a fixed stride from the first row.
pub fn sample(df: &DataFrame, params: &Map<String, Value>) -> Result<DataFrame> {
    let params: SampleParams = parse_params(params)?;
    if params.n == 0 {
        return Err(OperationError::InvalidParams("'n' must be at least 1".to_string()));
    }
    if params.n >= df.height() {
        return Ok(df.clone());
    }
    Ok(take_rows(df, &equidistant_indices(df.height(), params.n))?)
}

pub fn select(df: &DataFrame, params: &Map<String, Value>) -> Result<DataFrame> {
    let params: ColumnsParams = parse_params(params)?;
    let columns = ColumnLookup::new(df).resolve_all(&params.columns)?;
    if columns.is_empty() {
        return Err(OperationError::InvalidParams(
            "'columns' must not be empty".to_string(),
        ));
    }
    Ok(df.select(columns)?)
}

pub fn drop(df: &DataFrame, params: &Map<String, Value>) -> Result<DataFrame> {
    let params: ColumnsParams = parse_params(params)?;
    let dropped = ColumnLookup::new(df).resolve_all(&params.columns)?;
    let kept: Vec<String> = df
        .get_column_names_owned()
        .iter()
        .map(|name| name.as_str().to_string())
        .filter(|name| !dropped.contains(name))
        .collect();
    if kept.is_empty() {
        return Err(OperationError::InvalidParams(
            "cannot drop every column".to_string(),
        ));
    }
    Ok(df.select(kept)?)
}

/// Casts one column. String sources are parsed value by value and the cast
/// is refused if any value fails to parse.
pub fn cast(df: &DataFrame, params: &Map<String, Value>) -> Result<DataFrame> {
    let params: CastParams = parse_params(params)?;
    let name = ColumnLookup::new(df).resolve(&params.column)?;
    let source = df.column(&name)?;
    let lossy = || OperationError::TypeMismatch {
        column: name.clone(),
        expected: match params.dtype {
            CastType::Int => "integer-like",
            CastType::Float => "numeric-like",
            CastType::Date => "date-like",
            CastType::Str | CastType::Bool => "convertible",
        },
    };

    let converted = match (source.dtype(), params.dtype) {
        (DataType::String, CastType::Float) => string_to_float(source)?,
        (DataType::String, CastType::Int) => {
            let floats = string_to_float(source)?;
            let integral = floats
                .f64()?
                .iter()
                .flatten()
                .all(|value| value.fract() == 0.0);
            if !integral {
                return Err(lossy());
            }
            floats.cast(&DataType::Int64)?
        }
        (DataType::String, CastType::Date) => string_to_date(source)?,
        (_, CastType::Int) => source.strict_cast(&DataType::Int64)?,
        (_, CastType::Float) => source.strict_cast(&DataType::Float64)?,
        (_, CastType::Str) => source.cast(&DataType::String)?,
        (_, CastType::Bool) => source.strict_cast(&DataType::Boolean)?,
        (_, CastType::Date) => source.strict_cast(&DataType::Date)?,
    };
    if converted.null_count() > source.null_count() {
        return Err(lossy());
    }

    let mut out = df.clone();
    out.with_column(converted)?;
    Ok(out)
}

/// Fills nulls with a literal or a strategy; exactly one must be given.
pub fn fill_null(df: &DataFrame, params: &Map<String, Value>) -> Result<DataFrame> {
    let params: FillNullParams = parse_params(params)?;
    let name = ColumnLookup::new(df).resolve(&params.column)?;
    let column = df.column(&name)?;

    let filled: Column = match (params.value, params.strategy) {
        (Some(value), None) => {
            let literal = literal_for(column.dtype(), &name, &value)?;
            let out = df
                .clone()
                .lazy()
                .with_column(col(name.as_str()).fill_null(literal))
                .collect()?;
            return Ok(out);
        }
        (None, Some(strategy)) => {
            let strategy = match strategy {
                FillStrategy::Forward => FillNullStrategy::Forward(None),
                FillStrategy::Backward => FillNullStrategy::Backward(None),
                FillStrategy::Mean => FillNullStrategy::Mean,
                FillStrategy::Zero => FillNullStrategy::Zero,
            };
            column
                .as_materialized_series()
                .fill_null(strategy)?
                .into_column()
        }
        _ => {
            return Err(OperationError::InvalidParams(
                "give exactly one of 'value' or 'strategy'".to_string(),
            ));
        }
    };
    let mut out = df.clone();
    out.with_column(filled)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn sales() -> DataFrame {
        df! {
            "region" => ["north", "south", "north", "east", "south"],
            "product" => ["a", "a", "b", "b", "b"],
            "sales" => [10i64, 20, 30, 40, 50],
        }
        .unwrap()
    }

    fn i64_values(df: &DataFrame, name: &str) -> Vec<Option<i64>> {
        df.column(name).unwrap().i64().unwrap().iter().collect()
    }

    #[test]
    fn test_filter_gt_resolves_case_insensitively() {
        let out = filter(&sales(), &params(json!({"column": "Sales", "op": "gt", "value": 25})))
            .unwrap();
        assert_eq!(i64_values(&out, "sales"), vec![Some(30), Some(40), Some(50)]);
    }

    #[test]
    fn test_filter_on_strings() {
        let out = filter(
            &sales(),
            &params(json!({"column": "region", "op": "eq", "value": "south"})),
        )
        .unwrap();
        assert_eq!(out.height(), 2);
    }

    #[test]
    fn test_filter_unknown_column() {
        let error = filter(&sales(), &params(json!({"column": "profit", "op": "eq", "value": 1})))
            .unwrap_err();
        assert!(matches!(error, OperationError::ColumnNotFound(name) if name == "profit"));
    }

    #[test]
    fn test_sort_descending_is_stable() {
        let out = sort(&sales(), &params(json!({"by": ["product"], "descending": true}))).unwrap();
        assert_eq!(
            i64_values(&out, "sales"),
            vec![Some(30), Some(40), Some(50), Some(10), Some(20)]
        );
    }

    #[test]
    fn test_group_aggregate_keeps_first_seen_order() {
        let out = group_aggregate(
            &sales(),
            &params(json!({"by": "region", "aggregations": {"sales": "sum"}})),
        )
        .unwrap();
        let regions: Vec<Option<&str>> = out.column("region").unwrap().str().unwrap().iter().collect();
        assert_eq!(regions, vec![Some("north"), Some("south"), Some("east")]);
        assert_eq!(i64_values(&out, "sales_sum"), vec![Some(40), Some(70), Some(40)]);
    }

    #[test]
    fn test_group_aggregate_rejects_mean_of_strings() {
        let error = group_aggregate(
            &sales(),
            &params(json!({"by": "region", "aggregations": {"product": "mean"}})),
        )
        .unwrap_err();
        assert!(matches!(error, OperationError::TypeMismatch { .. }));
    }

    #[test]
    fn test_pivot_spreads_keys() {
        let out = pivot(
            &sales(),
            &params(json!({"index": "region", "columns": "product", "values": "sales"})),
        )
        .unwrap();
        assert_eq!(out.get_column_names_owned().len(), 3);
        assert_eq!(i64_values(&out, "a"), vec![Some(10), Some(20), Some(0)]);
        assert_eq!(i64_values(&out, "b"), vec![Some(30), Some(50), Some(40)]);
    }

    #[test]
    fn test_pivot_caps_column_count() {
        let keys: Vec<String> = (0..60).map(|i| format!("k{i}")).collect();
        let values: Vec<i64> = (0..60).collect();
        let index: Vec<&str> = vec!["row"; 60];
        let df = df! { "index" => index, "key" => keys, "value" => values }.unwrap();
        let error = pivot(
            &df,
            &params(json!({"index": "index", "columns": "key", "values": "value"})),
        )
        .unwrap_err();
        assert!(matches!(error, OperationError::TooManyColumns { count: 60, max: 50 }));
    }

    #[test]
    fn test_resample_monthly() {
        let days = Series::new("date".into(), [19_723i32, 19_724, 19_754, 19_755])
            .cast(&DataType::Date)
            .unwrap();
        let df = DataFrame::new(vec![
            days.into_column(),
            Series::new("sales".into(), [1i64, 2, 3, 4]).into_column(),
        ])
        .unwrap();
        let out = resample(
            &df,
            &params(json!({"time_column": "date", "every": "1mo", "aggregations": {"sales": "sum"}})),
        )
        .unwrap();
        assert_eq!(out.height(), 2);
        assert_eq!(i64_values(&out, "sales_sum"), vec![Some(3), Some(7)]);
    }

    #[test]
    fn test_resample_requires_temporal_column() {
        let error = resample(
            &sales(),
            &params(json!({"time_column": "region", "every": "1d", "aggregations": {"sales": "sum"}})),
        )
        .unwrap_err();
        assert!(matches!(error, OperationError::TypeMismatch { .. }));
    }

    #[test]
    fn test_rename_allows_swaps_and_rejects_collisions() {
        let swapped = rename(
            &sales(),
            &params(json!({"mapping": {"region": "product", "product": "region"}})),
        )
        .unwrap();
        let regions: Vec<Option<&str>> =
            swapped.column("region").unwrap().str().unwrap().iter().take(1).collect();
        assert_eq!(regions, vec![Some("a")]);

        let error = rename(&sales(), &params(json!({"mapping": {"region": "sales"}}))).unwrap_err();
        assert!(matches!(error, OperationError::DuplicateColumn(name) if name == "sales"));
    }

    #[test]
    fn test_limit_and_sample() {
        let tail = limit(&sales(), &params(json!({"n": 2, "from": "tail"}))).unwrap();
        assert_eq!(i64_values(&tail, "sales"), vec![Some(40), Some(50)]);

        let sampled = sample(&sales(), &params(json!({"n": 2}))).unwrap();
        assert_eq!(i64_values(&sampled, "sales"), vec![Some(10), Some(30)]);

        assert!(limit(&sales(), &params(json!({"n": 0}))).is_err());
    }

    #[test]
    fn test_select_and_drop() {
        let selected = select(&sales(), &params(json!({"columns": ["SALES"]}))).unwrap();
        assert_eq!(selected.width(), 1);
        let dropped = drop(&sales(), &params(json!({"columns": ["product"]}))).unwrap();
        assert_eq!(dropped.width(), 2);
        assert!(drop(&sales(), &params(json!({"columns": ["region", "product", "sales"]}))).is_err());
    }

    #[test]
    fn test_cast_string_to_float_refuses_lossy_values() {
        let df = df! { "amount" => ["1,200", "3.5", "n/a"] }.unwrap();
        let error = cast(&df, &params(json!({"column": "amount", "dtype": "float"}))).unwrap_err();
        assert!(matches!(error, OperationError::TypeMismatch { .. }));

        let clean = df! { "amount" => ["1,200", "3.5"] }.unwrap();
        let out = cast(&clean, &params(json!({"column": "amount", "dtype": "float"}))).unwrap();
        assert_eq!(out.column("amount").unwrap().dtype(), &DataType::Float64);
    }

    #[test]
    fn test_cast_string_to_date() {
        let df = df! { "when" => ["2024-01-01", "2024-02-01"] }.unwrap();
        let out = cast(&df, &params(json!({"column": "when", "dtype": "date"}))).unwrap();
        assert_eq!(out.column("when").unwrap().dtype(), &DataType::Date);
    }

    #[test]
    fn test_fill_null_value_and_strategy() {
        let df = df! { "sales" => [Some(1i64), None, Some(3)] }.unwrap();
        let by_value = fill_null(&df, &params(json!({"column": "sales", "value": 0}))).unwrap();
        assert_eq!(i64_values(&by_value, "sales"), vec![Some(1), Some(0), Some(3)]);

        let forward =
            fill_null(&df, &params(json!({"column": "sales", "strategy": "forward"}))).unwrap();
        assert_eq!(i64_values(&forward, "sales"), vec![Some(1), Some(1), Some(3)]);

        assert!(fill_null(&df, &params(json!({"column": "sales"}))).is_err());
    }
}
