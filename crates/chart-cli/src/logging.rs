//! Log output for `chartsmith` runs.
//!
//! Each request runs inside a `visualize` span carrying its correlation id,
//! with a nested `phase` span per pipeline phase. Warnings mark fallbacks
//! (default template, heuristic mapping, SVG instead of PNG) and rejected
//! requests. Phase durations are logged at debug. Classifier exchanges are
//! logged at trace.
//!
//! The intent text and cell values stay out of the logs unless `--log-data`
//! is given; see [`redact_value`].

use std::fs::{File, OpenOptions};
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

static LOG_DATA_ENABLED: AtomicBool = AtomicBool::new(false);

/// Stands in for the intent or a cell value when `--log-data` is off.
pub const REDACTED_VALUE: &str = "[REDACTED]";

/// Pipeline crates; everything else (reqwest, hyper, polars) stays at warn.
const PIPELINE_TARGETS: [&str; 9] = [
    "chart_cli",
    "chart_common",
    "chart_core",
    "chart_ingest",
    "chart_map",
    "chart_model",
    "chart_select",
    "chart_standards",
    "chart_transform",
];

type OutputLayer = Box<dyn Layer<Registry> + Send + Sync>;

pub fn log_data_enabled() -> bool {
    LOG_DATA_ENABLED.load(Ordering::Relaxed)
}

/// `value` if `--log-data` was given, otherwise [`REDACTED_VALUE`].
pub fn redact_value(value: &str) -> &str {
    if log_data_enabled() {
        value
    } else {
        REDACTED_VALUE
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    /// One JSON object per line, with span close events carrying `time.busy`.
    Json,
}

/// Logging choices made on the command line.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Level for the pipeline crates.
    pub level_filter: LevelFilter,
    /// `RUST_LOG` wins when no level flag was given.
    pub use_env_filter: bool,
    pub with_timestamps: bool,
    pub with_target: bool,
    /// Span close events in JSON output.
    pub with_spans: bool,
    pub with_ansi: bool,
    pub format: LogFormat,
    /// Append to this file instead of stderr.
    pub log_file: Option<PathBuf>,
    pub log_data: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level_filter: LevelFilter::WARN,
            use_env_filter: true,
            with_timestamps: false,
            with_target: false,
            with_spans: true,
            with_ansi: true,
            format: LogFormat::default(),
            log_file: None,
            log_data: false,
        }
    }
}

impl LogConfig {
    /// Pins the pipeline level and ignores `RUST_LOG`.
    #[must_use]
    pub fn with_level(mut self, level_filter: LevelFilter) -> Self {
        self.level_filter = level_filter;
        self.use_env_filter = false;
        self
    }
}

/// Installs the global subscriber, writing to `config.log_file` or stderr.
///
/// # Errors
///
/// Returns an error if the log file cannot be opened for appending.
pub fn init_logging(config: &LogConfig) -> io::Result<()> {
    match &config.log_file {
        Some(path) => {
            let file: File = OpenOptions::new().create(true).append(true).open(path)?;
            init_logging_with_writer(config, Mutex::new(file));
        }
        None => init_logging_with_writer(config, io::stderr),
    }
    Ok(())
}

/// Installs the global subscriber with `writer`. Only the first call in a
/// process takes effect.
pub fn init_logging_with_writer<W>(config: &LogConfig, writer: W)
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    LOG_DATA_ENABLED.store(config.log_data, Ordering::Release);
    let result = tracing_subscriber::registry()
        .with(output_layer(config, writer))
        .with(build_env_filter(config))
        .try_init();
    if let Err(error) = result {
        tracing::debug!(%error, "logging already initialized");
    }
}

fn output_layer<W>(config: &LogConfig, writer: W) -> OutputLayer
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    let base = fmt::layer()
        .with_writer(writer)
        .with_target(config.with_target)
        .with_ansi(config.with_ansi && config.format != LogFormat::Json);
    match (config.format, config.with_timestamps) {
        (LogFormat::Json, _) => {
            let spans = if config.with_spans {
                FmtSpan::CLOSE
            } else {
                FmtSpan::NONE
            };
            base.json().with_span_events(spans).boxed()
        }
        (LogFormat::Compact, true) => base.compact().boxed(),
        (LogFormat::Compact, false) => base.compact().without_time().boxed(),
        (LogFormat::Pretty, true) => base.boxed(),
        (LogFormat::Pretty, false) => base.without_time().boxed(),
    }
}

/// `warn` for dependencies, `level` for every pipeline crate.
pub fn pipeline_directives(level: LevelFilter) -> String {
    let level = level.to_string().to_lowercase();
    std::iter::once("warn".to_string())
        .chain(
            PIPELINE_TARGETS
                .iter()
                .map(|target| format!("{target}={level}")),
        )
        .collect::<Vec<_>>()
        .join(",")
}

fn build_env_filter(config: &LogConfig) -> EnvFilter {
    let pinned = || EnvFilter::new(pipeline_directives(config.level_filter));
    if config.use_env_filter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| pinned())
    } else {
        pinned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directives_name_every_pipeline_crate() {
        let directives = pipeline_directives(LevelFilter::DEBUG);
        assert!(directives.starts_with("warn,"));
        for target in PIPELINE_TARGETS {
            assert!(directives.contains(&format!("{target}=debug")), "{target}");
        }
    }

    #[test]
    fn explicit_level_disables_env_filter() {
        let config = LogConfig::default().with_level(LevelFilter::TRACE);
        assert!(!config.use_env_filter);
        assert_eq!(config.level_filter, LevelFilter::TRACE);
    }

    #[test]
    fn intent_is_redacted_by_default() {
        assert!(!LogConfig::default().log_data);
        assert_eq!(redact_value("monthly revenue by region"), REDACTED_VALUE);
    }
}
