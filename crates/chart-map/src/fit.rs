//! Column-to-channel compatibility and type conversion.

use std::fmt;

use chart_common::{string_to_date, string_to_float};
use chart_model::{ChannelSpec, ColumnProfile, SemanticType};
use polars::prelude::{Column, DataFrame, DataType, PolarsResult};

/// Most distinct values a quantitative column may have to be used as categories.
pub const DISCRETE_MAX_VALUES: usize = 20;

/// How a column is made to fit a channel it does not match directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Coercion {
    /// Numeric-looking strings cast to floats.
    ParseNumber,
    /// Date-looking strings cast to dates.
    ParseDate,
    /// Few-valued numbers used as categories, no cast.
    AsDiscrete,
    /// Numeric ordinal column used as a measure, no cast.
    AsQuantitative,
}

impl Coercion {
    pub fn needs_cast(self) -> bool {
        matches!(self, Self::ParseNumber | Self::ParseDate)
    }
}

impl fmt::Display for Coercion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ParseNumber => "number conversion",
            Self::ParseDate => "date conversion",
            Self::AsDiscrete => "categorical use",
            Self::AsQuantitative => "numeric use",
        })
    }
}

/// How well a column fits a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fit {
    pub coercion: Option<Coercion>,
    /// Position of the matched type in the channel's preference order.
    pub preference: usize,
}

impl Fit {
    pub fn is_direct(&self) -> bool {
        self.coercion.is_none()
    }
}

/// Why a column cannot serve a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    TooManyGroups { count: usize, max: usize },
    IncompatibleType(SemanticType),
    LosesValues,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooManyGroups { count, max } => {
                write!(f, "{count} distinct values exceed the limit of {max}")
            }
            Self::IncompatibleType(ty) => write!(f, "{ty} columns are not accepted"),
            Self::LosesValues => f.write_str("conversion would drop values"),
        }
    }
}

/// Checks whether `column` can be bound to the channel described by `spec`.
///
/// A direct type match always beats a coercion; among coercions the one
/// reaching the most preferred type wins.
pub fn assess(column: &ColumnProfile, spec: &ChannelSpec) -> Result<Fit, Rejection> {
    if let Some(max) = spec.channel.max_groups()
        && column.unique_count > max
    {
        return Err(Rejection::TooManyGroups {
            count: column.unique_count,
            max,
        });
    }

    if let Some(preference) = spec.preference(column.semantic_type) {
        return Ok(Fit {
            coercion: None,
            preference,
        });
    }

    let mut options = Vec::new();
    if column.numeric_like {
        options.push((Coercion::ParseNumber, SemanticType::Quantitative));
    }
    if column.temporal_like {
        options.push((Coercion::ParseDate, SemanticType::Temporal));
    }
    if column.semantic_type == SemanticType::Quantitative
        && column.unique_count <= DISCRETE_MAX_VALUES
    {
        options.push((Coercion::AsDiscrete, SemanticType::Ordinal));
        options.push((Coercion::AsDiscrete, SemanticType::Nominal));
    }
    if column.semantic_type == SemanticType::Ordinal && column.dtype.is_numeric() {
        options.push((Coercion::AsQuantitative, SemanticType::Quantitative));
    }

    options
        .into_iter()
        .filter_map(|(coercion, ty)| {
            spec.preference(ty).map(|preference| Fit {
                coercion: Some(coercion),
                preference,
            })
        })
        .min_by_key(|fit| fit.preference)
        .ok_or(Rejection::IncompatibleType(column.semantic_type))
}

/// Casts `name` in place when `coercion` needs a cast.
///
/// Returns `Ok(false)` and leaves the table untouched when the cast would
/// turn present values into nulls.
pub fn apply_coercion(df: &mut DataFrame, name: &str, coercion: Coercion) -> PolarsResult<bool> {
    if !coercion.needs_cast() {
        return Ok(true);
    }
    let column = df.column(name)?;
    let converted = match coercion {
        Coercion::ParseNumber => string_to_float(column)?,
        Coercion::ParseDate => string_to_date(column)?,
        Coercion::AsDiscrete | Coercion::AsQuantitative => return Ok(true),
    };
    if converted.null_count() > missing_count(column)? {
        return Ok(false);
    }
    df.with_column(converted)?;
    Ok(true)
}

/// Nulls plus blank strings; both are already missing before a cast.
fn missing_count(column: &Column) -> PolarsResult<usize> {
    let strings = column.cast(&DataType::String)?;
    Ok(strings
        .str()?
        .iter()
        .filter(|value| value.is_none_or(|text| text.trim().is_empty()))
        .count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chart_model::{Channel, ColumnDtype};
    use polars::prelude::*;

    fn profile(semantic_type: SemanticType, dtype: ColumnDtype, unique_count: usize) -> ColumnProfile {
        ColumnProfile {
            name: "c".to_string(),
            dtype,
            semantic_type,
            null_ratio: 0.0,
            unique_count,
            numeric_like: false,
            temporal_like: false,
        }
    }

    #[test]
    fn direct_match_reports_preference() {
        let spec = ChannelSpec::new(
            Channel::X,
            vec![SemanticType::Temporal, SemanticType::Quantitative],
        );
        let fit = assess(
            &profile(SemanticType::Quantitative, ColumnDtype::Float, 40),
            &spec,
        )
        .unwrap();
        assert!(fit.is_direct());
        assert_eq!(fit.preference, 1);
    }

    #[test]
    fn numeric_strings_need_parsing() {
        let spec = ChannelSpec::new(Channel::Y, vec![SemanticType::Quantitative]);
        let mut column = profile(SemanticType::Nominal, ColumnDtype::String, 40);
        column.numeric_like = true;
        let fit = assess(&column, &spec).unwrap();
        assert_eq!(fit.coercion, Some(Coercion::ParseNumber));
    }

    #[test]
    fn few_valued_numbers_serve_as_categories() {
        let spec = ChannelSpec::new(Channel::X, vec![SemanticType::Nominal, SemanticType::Ordinal]);
        let fit = assess(
            &profile(SemanticType::Quantitative, ColumnDtype::Integer, 5),
            &spec,
        )
        .unwrap();
        assert_eq!(fit.coercion, Some(Coercion::AsDiscrete));
        assert_eq!(fit.preference, 1);

        let many = assess(
            &profile(SemanticType::Quantitative, ColumnDtype::Integer, 500),
            &spec,
        );
        assert_eq!(
            many,
            Err(Rejection::IncompatibleType(SemanticType::Quantitative))
        );
    }

    #[test]
    fn grouping_channels_cap_distinct_values() {
        let spec = ChannelSpec::with_default_types(Channel::Facet);
        let result = assess(&profile(SemanticType::Nominal, ColumnDtype::String, 13), &spec);
        assert_eq!(result, Err(Rejection::TooManyGroups { count: 13, max: 12 }));
    }

    #[test]
    fn cast_rejected_when_values_would_be_lost() {
        let mut df = df! { "amount" => ["1.5", "2", "n/a"] }.unwrap();
        assert!(!apply_coercion(&mut df, "amount", Coercion::ParseNumber).unwrap());
        assert_eq!(df.column("amount").unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn cast_keeps_existing_blanks() {
        let mut df = df! { "when" => [Some("2024-01-01"), Some(" "), None] }.unwrap();
        assert!(apply_coercion(&mut df, "when", Coercion::ParseDate).unwrap());
        assert_eq!(df.column("when").unwrap().dtype(), &DataType::Date);
        assert_eq!(df.column("when").unwrap().null_count(), 2);
    }
}
