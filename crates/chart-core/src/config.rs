//! Pipeline configuration.
//!
//! Every section has defaults, so an empty TOML document is a valid
//! configuration:
//!
//! ```toml
//! [timeouts]
//! pattern_selection = 10000
//! total = 60000
//!
//! [limits]
//! max_rows = 10000
//!
//! [concurrency]
//! max_in_flight = 8
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use chart_ingest::DataLimits;
use chart_model::Phase;
use chart_select::ClassifierSettings;
use chart_transform::DEFAULT_MAX_STEPS;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {source}")]
    Parse {
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config: {message}")]
    Invalid { message: String },
}

impl ConfigError {
    fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }
}

/// Per-phase and global timeouts in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseTimeouts {
    pub validation: u64,
    pub pattern_selection: u64,
    pub chart_selection: u64,
    pub data_processing: u64,
    pub data_mapping: u64,
    pub build: u64,
    pub total: u64,
}

impl Default for PhaseTimeouts {
    fn default() -> Self {
        Self {
            validation: 5_000,
            pattern_selection: 10_000,
            chart_selection: 10_000,
            data_processing: 10_000,
            data_mapping: 5_000,
            build: 10_000,
            total: 60_000,
        }
    }
}

impl PhaseTimeouts {
    pub fn for_phase(&self, phase: Phase) -> Duration {
        let ms = match phase {
            Phase::Validation => self.validation,
            Phase::PatternSelection => self.pattern_selection,
            Phase::ChartSelection => self.chart_selection,
            Phase::DataProcessing => self.data_processing,
            Phase::DataMapping => self.data_mapping,
            Phase::Build => self.build,
        };
        Duration::from_millis(ms)
    }

    pub fn total(&self) -> Duration {
        Duration::from_millis(self.total)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingSettings {
    /// Plans longer than this are truncated.
    pub max_steps: usize,
    /// Ask the classifier for a column mapping before the heuristic runs.
    pub propose_mapping: bool,
}

impl Default for ProcessingSettings {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            propose_mapping: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConcurrencySettings {
    /// Requests admitted at once; the rest are rejected.
    pub max_in_flight: usize,
}

impl Default for ConcurrencySettings {
    fn default() -> Self {
        Self { max_in_flight: 8 }
    }
}

/// Everything the coordinator needs besides its collaborators.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub timeouts: PhaseTimeouts,
    pub limits: DataLimits,
    pub classifier: ClassifierSettings,
    pub processing: ProcessingSettings,
    pub concurrency: ConcurrencySettings,
}

impl PipelineConfig {
    /// Parses and validates a TOML document. Unknown keys are ignored.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(contents).map_err(|source| ConfigError::Parse { source })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&contents)?;
        tracing::debug!(path = %path.display(), "loaded pipeline config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for phase in Phase::ALL {
            if self.timeouts.for_phase(phase).is_zero() {
                return Err(ConfigError::invalid(format!(
                    "timeouts.{phase} must be greater than zero"
                )));
            }
        }
        if self.timeouts.total == 0 {
            return Err(ConfigError::invalid("timeouts.total must be greater than zero"));
        }
        let limits = &self.limits;
        if limits.max_bytes == 0
            || limits.max_rows == 0
            || limits.max_columns == 0
            || limits.max_cells == 0
            || limits.max_intent_chars == 0
        {
            return Err(ConfigError::invalid("limits must all be greater than zero"));
        }
        if self.classifier.attempt_timeout_ms == 0 {
            return Err(ConfigError::invalid(
                "classifier.attempt_timeout_ms must be greater than zero",
            ));
        }
        if self.concurrency.max_in_flight == 0 {
            return Err(ConfigError::invalid(
                "concurrency.max_in_flight must be at least 1",
            ));
        }
        Ok(())
    }
}
