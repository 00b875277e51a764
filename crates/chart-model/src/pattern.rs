//! Visualization patterns.
//!
//! A pattern is a (primary intent, secondary intent) pair drawn from a 3x3
//! matrix with the diagonal removed and a "no secondary" column added. The
//! identifier encodes the pair: the first digit is the primary intent
//! (1 = Transition, 2 = Difference, 3 = Overview), the second digit the
//! secondary intent (0 = none).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Analytical intent behind a chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Change over an ordered axis, usually time.
    Transition,
    /// Comparison between categories.
    Difference,
    /// Distribution or composition of the whole.
    Overview,
}

impl Intent {
    fn digit(self) -> u8 {
        match self {
            Self::Transition => 1,
            Self::Difference => 2,
            Self::Overview => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Transition => "transition",
            Self::Difference => "difference",
            Self::Overview => "overview",
        }
    }
}

/// One of the nine fixed visualization patterns.
///
/// No other value is constructible: parsing rejects anything outside
/// [`Pattern::ALL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Pattern {
    /// Single time series.
    P01,
    /// Category comparison.
    P02,
    /// Distribution of a single measure.
    P03,
    /// Several time series compared.
    P12,
    /// Distribution changing over time.
    P13,
    /// Category differences changing over time.
    P21,
    /// Distributions compared across categories.
    P23,
    /// Overall picture over time, split into panels.
    P31,
    /// Distribution summaries compared between categories.
    P32,
}

impl Pattern {
    pub const ALL: [Pattern; 9] = [
        Self::P01,
        Self::P02,
        Self::P03,
        Self::P12,
        Self::P13,
        Self::P21,
        Self::P23,
        Self::P31,
        Self::P32,
    ];

    /// Stable identifier, e.g. `"P12"`.
    pub fn id(self) -> &'static str {
        match self {
            Self::P01 => "P01",
            Self::P02 => "P02",
            Self::P03 => "P03",
            Self::P12 => "P12",
            Self::P13 => "P13",
            Self::P21 => "P21",
            Self::P23 => "P23",
            Self::P31 => "P31",
            Self::P32 => "P32",
        }
    }

    pub fn primary(self) -> Intent {
        match self {
            Self::P01 | Self::P12 | Self::P13 => Intent::Transition,
            Self::P02 | Self::P21 | Self::P23 => Intent::Difference,
            Self::P03 | Self::P31 | Self::P32 => Intent::Overview,
        }
    }

    pub fn secondary(self) -> Option<Intent> {
        match self {
            Self::P01 | Self::P02 | Self::P03 => None,
            Self::P21 | Self::P31 => Some(Intent::Transition),
            Self::P12 | Self::P32 => Some(Intent::Difference),
            Self::P13 | Self::P23 => Some(Intent::Overview),
        }
    }

    /// Looks up the pattern for an intent pair.
    ///
    /// Returns `None` when `secondary == Some(primary)`, which is not a pattern.
    pub fn from_intents(primary: Intent, secondary: Option<Intent>) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|pattern| pattern.primary() == primary && pattern.secondary() == secondary)
    }

    /// Short description used when presenting the option space to a classifier.
    pub fn description(self) -> &'static str {
        match self {
            Self::P01 => "Transition only: how a single measure changes over time",
            Self::P02 => "Difference only: comparing a measure across categories",
            Self::P03 => "Overview only: distribution of a single measure",
            Self::P12 => "Transition + Difference: several series changing over time, compared",
            Self::P13 => "Transition + Overview: how a distribution shifts over time",
            Self::P21 => "Difference + Transition: how category differences change over time",
            Self::P23 => "Difference + Overview: distributions compared across categories",
            Self::P31 => "Overview + Transition: the overall picture over time, in panels",
            Self::P32 => "Overview + Difference: distribution summaries compared between categories",
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Pattern {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|pattern| pattern.id().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ModelError::UnknownPattern(trimmed.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_encode_intent_digits() {
        for pattern in Pattern::ALL {
            let secondary = pattern.secondary().map_or(0, Intent::digit);
            let expected = format!("P{}{}", pattern.primary().digit(), secondary);
            assert_eq!(pattern.id(), expected);
        }
    }

    #[test]
    fn secondary_never_equals_primary() {
        for pattern in Pattern::ALL {
            assert_ne!(pattern.secondary(), Some(pattern.primary()));
        }
    }

    #[test]
    fn from_intents_rejects_diagonal() {
        assert_eq!(
            Pattern::from_intents(Intent::Transition, Some(Intent::Transition)),
            None
        );
        assert_eq!(
            Pattern::from_intents(Intent::Difference, Some(Intent::Overview)),
            Some(Pattern::P23)
        );
    }

    #[test]
    fn parse_accepts_only_known_ids() {
        assert_eq!("p12".parse::<Pattern>(), Ok(Pattern::P12));
        assert_eq!(" P01 ".parse::<Pattern>(), Ok(Pattern::P01));
        assert!("P11".parse::<Pattern>().is_err());
        assert!("P00".parse::<Pattern>().is_err());
        assert!("line".parse::<Pattern>().is_err());
    }
}
