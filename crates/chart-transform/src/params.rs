//! Typed parameters for the registered operations.
//!
//! Plans carry parameters as JSON objects; each operation deserialises them
//! into one of these structs before touching the table.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{OperationError, Result};

/// Deserialises step parameters into `T`.
///
/// Type errors are reported without the offending value, which may come
/// from the data.
pub fn parse_params<T: DeserializeOwned>(params: &Map<String, Value>) -> Result<T> {
    serde_json::from_value(Value::Object(params.clone())).map_err(|e| {
        let message = e.to_string();
        if message.starts_with("missing field") || message.starts_with("unknown field") {
            OperationError::InvalidParams(message)
        } else {
            OperationError::InvalidParams("a parameter has the wrong type".to_string())
        }
    })
}

/// A single column name or a list of them.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(name) => vec![name],
            Self::Many(names) => names,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggFunc {
    #[default]
    Sum,
    Mean,
    Count,
    Min,
    Max,
    Median,
    Std,
}

impl AggFunc {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Mean => "mean",
            Self::Count => "count",
            Self::Min => "min",
            Self::Max => "max",
            Self::Median => "median",
            Self::Std => "std",
        }
    }

    /// Whether the function only makes sense on numeric columns.
    pub fn needs_numeric(self) -> bool {
        matches!(self, Self::Sum | Self::Mean | Self::Median | Self::Std)
    }
}

/// Resampling bucket width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Every {
    #[serde(rename = "1d")]
    Day,
    #[serde(rename = "1w")]
    Week,
    #[serde(rename = "1mo")]
    Month,
    #[serde(rename = "1q")]
    Quarter,
    #[serde(rename = "1y")]
    Year,
}

impl Every {
    /// Polars duration string.
    pub fn as_duration(self) -> &'static str {
        match self {
            Self::Day => "1d",
            Self::Week => "1w",
            Self::Month => "1mo",
            Self::Quarter => "1q",
            Self::Year => "1y",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LimitFrom {
    #[default]
    Head,
    Tail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CastType {
    Int,
    Float,
    Str,
    Bool,
    Date,
}

impl CastType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::Str => "str",
            Self::Bool => "bool",
            Self::Date => "date",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillStrategy {
    Forward,
    Backward,
    Mean,
    Zero,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterParams {
    pub column: String,
    pub op: CompareOp,
    pub value: Value,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SortParams {
    pub by: OneOrMany,
    #[serde(default)]
    pub descending: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupAggregateParams {
    pub by: OneOrMany,
    pub aggregations: BTreeMap<String, AggFunc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PivotParams {
    pub index: String,
    pub columns: String,
    pub values: String,
    #[serde(default)]
    pub aggregate: AggFunc,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResampleParams {
    pub time_column: String,
    pub every: Every,
    pub aggregations: BTreeMap<String, AggFunc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenameParams {
    pub mapping: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LimitParams {
    pub n: usize,
    #[serde(default)]
    pub from: LimitFrom,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SampleParams {
    pub n: usize,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnsParams {
    pub columns: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CastParams {
    pub column: String,
    pub dtype: CastType,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FillNullParams {
    pub column: String,
    pub value: Option<Value>,
    pub strategy: Option<FillStrategy>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_sort_accepts_single_column() {
        let params: SortParams = parse_params(&object(json!({"by": "date"}))).unwrap();
        assert_eq!(params.by.into_vec(), vec!["date".to_string()]);
        assert!(!params.descending);
    }

    #[test]
    fn test_unknown_field_is_named() {
        let error = parse_params::<LimitParams>(&object(json!({"n": 3, "offset": 2}))).unwrap_err();
        assert!(error.to_string().contains("unknown field `offset`"));
    }

    #[test]
    fn test_type_errors_do_not_echo_values() {
        let error =
            parse_params::<LimitParams>(&object(json!({"n": "secret-value"}))).unwrap_err();
        assert!(!error.to_string().contains("secret-value"));
    }

    #[test]
    fn test_resample_every_uses_duration_strings() {
        let params: ResampleParams = parse_params(&object(json!({
            "time_column": "date",
            "every": "1mo",
            "aggregations": {"sales": "sum"}
        })))
        .unwrap();
        assert_eq!(params.every.as_duration(), "1mo");
        assert_eq!(params.aggregations["sales"], AggFunc::Sum);
    }
}
