use std::io::{self, IsTerminal};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use comfy_table::Table;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use chart_cli::logging::redact_value;
use chart_cli::request::{build_request, default_output_path, read_plan, render_options};
use chart_cli::{AppConfig, HttpClassifier};
use chart_core::Coordinator;
use chart_model::{
    AuxiliaryElement, Intent, OutputFormat, Pattern, PipelineError, VisualizationResult,
};
use chart_standards::{TemplateCatalog, TemplateRegistry};

use crate::cli::{ImageFormatArg, TemplatesArgs, VisualizeArgs};
use crate::summary::apply_table_style;

pub fn run_patterns() -> Result<()> {
    let mut table = Table::new();
    table.set_header(vec!["Pattern", "Primary", "Secondary", "Description"]);
    apply_table_style(&mut table);
    for pattern in Pattern::ALL {
        table.add_row(vec![
            pattern.id().to_string(),
            pattern.primary().as_str().to_string(),
            pattern
                .secondary()
                .map_or("-", Intent::as_str)
                .to_string(),
            pattern.description().to_string(),
        ]);
    }
    println!("{table}");
    Ok(())
}

pub fn run_templates(args: &TemplatesArgs) -> Result<()> {
    let catalog = TemplateCatalog::builtin().context("load template catalog")?;
    let patterns: Vec<Pattern> = match &args.pattern {
        Some(id) => vec![id.trim().to_uppercase().parse::<Pattern>()?],
        None => Pattern::ALL.to_vec(),
    };
    let mut table = Table::new();
    table.set_header(vec!["Pattern", "Template", "Required", "Optional", "Auxiliary"]);
    apply_table_style(&mut table);
    for pattern in patterns {
        for template in catalog.templates_for(pattern) {
            let id = if template.is_default {
                format!("{} (default)", template.id)
            } else {
                template.id.clone()
            };
            table.add_row(vec![
                pattern.id().to_string(),
                id,
                join(template.required.iter().map(|spec| spec.channel.as_str())),
                join(template.optional.iter().map(|spec| spec.channel.as_str())),
                join(template.auxiliary.iter().copied().map(AuxiliaryElement::as_str)),
            ]);
        }
    }
    println!("Catalog revision: {}", catalog.revision());
    println!("{table}");
    Ok(())
}

/// Outer error: the request could not be set up. Inner error: the pipeline
/// ran and failed.
pub async fn run_visualize(
    args: &VisualizeArgs,
) -> Result<std::result::Result<VisualizationResult, PipelineError>> {
    let config = AppConfig::load(args.config.as_deref())?;
    let plan = args.operations.as_deref().map(read_plan).transpose()?;
    let options = render_options(output_format(args.format), args.width, args.height, args.dpi);
    let request = build_request(&args.data_file, &args.intent, options, plan)?;
    debug!(
        data_file = %args.data_file.display(),
        bytes = request.data.len(),
        intent = %redact_value(&request.intent),
        "request prepared"
    );

    let classifier =
        HttpClassifier::from_settings(&config.endpoint).context("set up classifier")?;
    info!(endpoint = %classifier.url(), model = %config.endpoint.model, "using classifier");
    let catalog = TemplateCatalog::builtin().context("load template catalog")?;
    let coordinator = Coordinator::new(config.pipeline, Arc::new(classifier), Arc::new(catalog));

    let spinner = spinner();
    let start = Instant::now();
    let outcome = coordinator.visualize_until(request, interrupted()).await;
    spinner.finish_and_clear();
    debug!(
        duration_ms = start.elapsed().as_millis(),
        ok = outcome.is_ok(),
        "pipeline finished"
    );
    Ok(outcome)
}

pub fn write_result(args: &VisualizeArgs, result: &VisualizationResult) -> Result<()> {
    let path = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.data_file));
    write_json(&path, result)?;
    println!("Result: {}", path.display());
    Ok(())
}

fn write_json(path: &Path, result: &VisualizationResult) -> Result<()> {
    let json = serde_json::to_string_pretty(result).context("serialize result")?;
    std::fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Structured error on stdout for callers that parse it.
pub fn print_pipeline_error(error: &PipelineError) {
    match serde_json::to_string_pretty(error) {
        Ok(json) => println!("{json}"),
        Err(_) => println!("{{\"message\": {:?}}}", error.message),
    }
    eprintln!("error: {} failed: {}", error.phase, error.message);
    if let Some(hint) = &error.hint {
        eprintln!("hint: {hint}");
    }
}

fn output_format(format: ImageFormatArg) -> OutputFormat {
    match format {
        ImageFormatArg::Png => OutputFormat::Png,
        ImageFormatArg::Svg => OutputFormat::Svg,
    }
}

/// Resolves on Ctrl-C. If the handler cannot be installed it never resolves.
async fn interrupted() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

fn spinner() -> ProgressBar {
    if !io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg} [{elapsed}]") {
        spinner.set_style(style);
    }
    spinner.set_message("Choosing a chart");
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

fn join<'a>(names: impl Iterator<Item = &'a str>) -> String {
    let names: Vec<&str> = names.collect();
    if names.is_empty() {
        "-".to_string()
    } else {
        names.join(", ")
    }
}
