//! JSON logging to a file. The global subscriber is per process, so this
//! file holds a single test.

use chart_cli::logging::{LogConfig, LogFormat, init_logging, redact_value};
use tracing::level_filters::LevelFilter;

#[test]
fn json_log_file_keeps_pipeline_events_and_redacts_intent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chartsmith.log");
    let config = LogConfig {
        format: LogFormat::Json,
        log_file: Some(path.clone()),
        with_timestamps: true,
        ..LogConfig::default().with_level(LevelFilter::INFO)
    };
    init_logging(&config).unwrap();

    tracing::info!(
        target: "chart_core::coordinator",
        intent = redact_value("revenue by region"),
        "visualization started"
    );
    tracing::info!(target: "hyper::client", "connection opened");
    tracing::warn!(target: "chart_select::chart", template = "bar", "chart selection fell back");

    let lines: Vec<serde_json::Value> = std::fs::read_to_string(&path)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.len(), 2, "{lines:?}");
    assert_eq!(lines[0]["fields"]["message"], "visualization started");
    assert_eq!(lines[0]["fields"]["intent"], "[REDACTED]");
    assert_eq!(lines[1]["level"], "WARN");
    assert_eq!(lines[1]["fields"]["template"], "bar");
}
