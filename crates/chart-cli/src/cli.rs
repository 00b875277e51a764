//! CLI argument definitions for chartsmith.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "chartsmith",
    version,
    about = "Choose a chart for a table and a stated intent",
    long_about = "Choose a chart for a table and a stated intent.\n\n\
                  Picks one of nine visualization patterns, a template for it, auxiliary\n\
                  elements and a channel-to-column mapping. The result is written as JSON\n\
                  for a renderer to draw."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow cell values and intent text in logs.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Decide a chart for a CSV or JSON file.
    Visualize(VisualizeArgs),

    /// List the nine visualization patterns.
    Patterns,

    /// List catalog templates.
    Templates(TemplatesArgs),
}

#[derive(Parser)]
pub struct VisualizeArgs {
    /// CSV or JSON data file.
    #[arg(value_name = "DATA_FILE")]
    pub data_file: PathBuf,

    /// What the chart should show, in plain words.
    #[arg(long = "intent", value_name = "TEXT")]
    pub intent: String,

    /// JSON file with a processing plan (array of {operation, params}).
    #[arg(long = "operations", value_name = "PLAN_JSON")]
    pub operations: Option<PathBuf>,

    /// Requested image format.
    #[arg(long = "format", value_enum, default_value = "png")]
    pub format: ImageFormatArg,

    /// Image width in pixels (600-2000).
    #[arg(long = "width", default_value_t = 1200)]
    pub width: u32,

    /// Image height in pixels (400-2000).
    #[arg(long = "height", default_value_t = 900)]
    pub height: u32,

    /// Image resolution (72-300).
    #[arg(long = "dpi", default_value_t = 300)]
    pub dpi: u32,

    /// Pipeline and classifier settings (TOML).
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Where to write the result JSON (default: <DATA_FILE>.chart.json).
    #[arg(long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Parser)]
pub struct TemplatesArgs {
    /// Only templates for this pattern (e.g. P01).
    #[arg(long = "pattern", value_name = "ID")]
    pub pattern: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ImageFormatArg {
    Png,
    Svg,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
