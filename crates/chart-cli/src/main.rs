//! chartsmith CLI.

use chart_cli::logging::{LogConfig, LogFormat, init_logging};
use clap::{ColorChoice, Parser};
use std::io::{self, IsTerminal};
use tracing::level_filters::LevelFilter;

mod cli;
mod commands;
mod summary;

use crate::cli::{Cli, Command, LogFormatArg, LogLevelArg};
use crate::commands::{
    print_pipeline_error, run_patterns, run_templates, run_visualize, write_result,
};
use crate::summary::print_summary;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let exit_code = match cli.command {
        Command::Visualize(args) => match run_visualize(&args).await {
            Ok(Ok(result)) => {
                print_summary(&result);
                match write_result(&args, &result) {
                    Ok(()) => 0,
                    Err(error) => {
                        eprintln!("error: {error:#}");
                        1
                    }
                }
            }
            Ok(Err(error)) => {
                print_pipeline_error(&error);
                1
            }
            Err(error) => {
                eprintln!("error: {error:#}");
                1
            }
        },
        Command::Patterns => match run_patterns() {
            Ok(()) => 0,
            Err(error) => {
                eprintln!("error: {error:#}");
                1
            }
        },
        Command::Templates(args) => match run_templates(&args) {
            Ok(()) => 0,
            Err(error) => {
                eprintln!("error: {error:#}");
                1
            }
        },
    };
    std::process::exit(exit_code);
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.with_timestamps = config.log_file.is_some();
    config.log_data = cli.log_data;
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_flag_overrides_env_filter() {
        let cli = Cli::parse_from(["chartsmith", "--log-level", "debug", "patterns"]);
        let config = log_config_from_cli(&cli);
        assert_eq!(config.level_filter, LevelFilter::DEBUG);
        assert!(!config.use_env_filter);
    }

    #[test]
    fn defaults_defer_to_rust_log() {
        let cli = Cli::parse_from(["chartsmith", "--log-data", "patterns"]);
        let config = log_config_from_cli(&cli);
        assert!(config.use_env_filter);
        assert!(config.log_data);
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(!config.with_timestamps);
    }

    #[test]
    fn log_file_gets_timestamps_without_color() {
        let cli = Cli::parse_from(["chartsmith", "--log-file", "run.log", "patterns"]);
        let config = log_config_from_cli(&cli);
        assert!(config.with_timestamps);
        assert!(!config.with_ansi);
    }

    #[test]
    fn visualize_arguments_parse() {
        let cli = Cli::parse_from([
            "chartsmith",
            "visualize",
            "sales.csv",
            "--intent",
            "monthly sales trend",
            "--format",
            "svg",
            "--width",
            "800",
        ]);
        let Command::Visualize(args) = cli.command else {
            panic!("expected visualize");
        };
        assert_eq!(args.intent, "monthly sales trend");
        assert!(matches!(args.format, cli::ImageFormatArg::Svg));
        assert_eq!(args.width, 800);
        assert_eq!(args.height, 900);
        assert!(args.output.is_none());
    }
}
