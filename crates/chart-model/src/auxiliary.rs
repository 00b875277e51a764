//! Auxiliary visual elements.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Maximum number of auxiliary elements on one chart.
pub const MAX_AUXILIARY: usize = 3;

/// Category an auxiliary element belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuxiliaryCategory {
    Emphasis,
    ReferenceLine,
    Trend,
}

/// One entry of the fixed ten-element auxiliary catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuxiliaryElement {
    Highlight,
    Annotation,
    ColorEmphasis,
    MeanLine,
    MedianLine,
    TargetLine,
    Threshold,
    MovingAvg,
    Regression,
    ConfidenceBand,
}

impl AuxiliaryElement {
    pub const ALL: [AuxiliaryElement; 10] = [
        Self::Highlight,
        Self::Annotation,
        Self::ColorEmphasis,
        Self::MeanLine,
        Self::MedianLine,
        Self::TargetLine,
        Self::Threshold,
        Self::MovingAvg,
        Self::Regression,
        Self::ConfidenceBand,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Highlight => "highlight",
            Self::Annotation => "annotation",
            Self::ColorEmphasis => "color_emphasis",
            Self::MeanLine => "mean_line",
            Self::MedianLine => "median_line",
            Self::TargetLine => "target_line",
            Self::Threshold => "threshold",
            Self::MovingAvg => "moving_avg",
            Self::Regression => "regression",
            Self::ConfidenceBand => "confidence_band",
        }
    }

    pub fn category(self) -> AuxiliaryCategory {
        match self {
            Self::Highlight | Self::Annotation | Self::ColorEmphasis => AuxiliaryCategory::Emphasis,
            Self::MeanLine | Self::MedianLine | Self::TargetLine | Self::Threshold => {
                AuxiliaryCategory::ReferenceLine
            }
            Self::MovingAvg | Self::Regression | Self::ConfidenceBand => AuxiliaryCategory::Trend,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Highlight => "Highlight specific data points",
            Self::Annotation => "Text annotation on notable values",
            Self::ColorEmphasis => "Emphasise one category with a contrasting color",
            Self::MeanLine => "Horizontal line at the mean",
            Self::MedianLine => "Horizontal line at the median",
            Self::TargetLine => "Horizontal line at a target value",
            Self::Threshold => "Shaded band above or below a threshold",
            Self::MovingAvg => "Moving average trend line",
            Self::Regression => "Linear regression trend line",
            Self::ConfidenceBand => "Confidence band around the trend",
        }
    }
}

impl fmt::Display for AuxiliaryElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuxiliaryElement {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|element| element.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ModelError::UnknownAuxiliary(trimmed.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_has_three_categories() {
        let count = |category| {
            AuxiliaryElement::ALL
                .iter()
                .filter(|element| element.category() == category)
                .count()
        };
        assert_eq!(count(AuxiliaryCategory::Emphasis), 3);
        assert_eq!(count(AuxiliaryCategory::ReferenceLine), 4);
        assert_eq!(count(AuxiliaryCategory::Trend), 3);
    }

    #[test]
    fn parse_round_trips_names() {
        for element in AuxiliaryElement::ALL {
            assert_eq!(element.as_str().parse::<AuxiliaryElement>(), Ok(element));
        }
        assert!("sparkle".parse::<AuxiliaryElement>().is_err());
    }
}
