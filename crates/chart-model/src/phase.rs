use std::fmt;

use serde::{Deserialize, Serialize};

/// Pipeline phases, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Validation,
    PatternSelection,
    ChartSelection,
    DataProcessing,
    DataMapping,
    Build,
}

impl Phase {
    pub const ALL: [Phase; 6] = [
        Self::Validation,
        Self::PatternSelection,
        Self::ChartSelection,
        Self::DataProcessing,
        Self::DataMapping,
        Self::Build,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::PatternSelection => "pattern_selection",
            Self::ChartSelection => "chart_selection",
            Self::DataProcessing => "data_processing",
            Self::DataMapping => "data_mapping",
            Self::Build => "build",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
