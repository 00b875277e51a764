//! Encoding channels and the semantic types they accept.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Semantic type of a column as seen by an encoding channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticType {
    Temporal,
    Ordinal,
    Nominal,
    Quantitative,
}

impl SemanticType {
    pub const ALL: [SemanticType; 4] = [
        Self::Temporal,
        Self::Ordinal,
        Self::Nominal,
        Self::Quantitative,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Temporal => "temporal",
            Self::Ordinal => "ordinal",
            Self::Nominal => "nominal",
            Self::Quantitative => "quantitative",
        }
    }

    /// True for types that partition rows into groups.
    pub fn is_discrete(self) -> bool {
        matches!(self, Self::Ordinal | Self::Nominal)
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SemanticType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|ty| ty.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ModelError::UnknownSemanticType(s.trim().to_string()))
    }
}

/// Visual encoding channel a column can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    X,
    Y,
    Color,
    Facet,
    Size,
    Shape,
    Row,
    Column,
    StrokeDash,
    Opacity,
}

impl Channel {
    pub const ALL: [Channel; 10] = [
        Self::X,
        Self::Y,
        Self::Color,
        Self::Facet,
        Self::Size,
        Self::Shape,
        Self::Row,
        Self::Column,
        Self::StrokeDash,
        Self::Opacity,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Y => "y",
            Self::Color => "color",
            Self::Facet => "facet",
            Self::Size => "size",
            Self::Shape => "shape",
            Self::Row => "row",
            Self::Column => "column",
            Self::StrokeDash => "stroke_dash",
            Self::Opacity => "opacity",
        }
    }

    /// Types a channel accepts when a template does not narrow them.
    pub fn default_types(self) -> &'static [SemanticType] {
        use SemanticType::{Nominal, Ordinal, Quantitative, Temporal};
        match self {
            Self::X => &[Temporal, Ordinal, Quantitative, Nominal],
            Self::Y => &[Quantitative, Ordinal, Nominal],
            Self::Color => &[Nominal, Ordinal, Quantitative],
            Self::Size | Self::Opacity => &[Quantitative],
            Self::Facet | Self::Row | Self::Column | Self::Shape | Self::StrokeDash => {
                &[Nominal, Ordinal]
            }
        }
    }

    /// Maximum number of distinct values for channels that split data into groups.
    pub fn max_groups(self) -> Option<usize> {
        match self {
            Self::Color => Some(20),
            Self::Facet | Self::Row | Self::Column | Self::Shape | Self::StrokeDash => Some(12),
            Self::X | Self::Y | Self::Size | Self::Opacity => None,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        let normalized = if normalized == "strokedash" {
            "stroke_dash".to_string()
        } else {
            normalized
        };
        Self::ALL
            .into_iter()
            .find(|channel| channel.as_str() == normalized)
            .ok_or_else(|| ModelError::UnknownChannel(s.trim().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_parse_accepts_camel_case_stroke_dash() {
        assert_eq!("strokeDash".parse::<Channel>(), Ok(Channel::StrokeDash));
        assert_eq!("stroke-dash".parse::<Channel>(), Ok(Channel::StrokeDash));
        assert_eq!("Y".parse::<Channel>(), Ok(Channel::Y));
        assert!("z".parse::<Channel>().is_err());
    }

    #[test]
    fn grouping_channels_are_bounded() {
        assert_eq!(Channel::Color.max_groups(), Some(20));
        assert_eq!(Channel::Facet.max_groups(), Some(12));
        assert_eq!(Channel::Y.max_groups(), None);
    }
}
