//! Turning CLI inputs into a [`VisualizeRequest`].

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chart_model::{OperationPlan, OutputFormat, RenderOptions, VisualizeRequest};

/// Reads a processing plan: a JSON array of `{"operation", "params"}` steps.
pub fn read_plan(path: &Path) -> Result<OperationPlan> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("read operations {}", path.display()))?;
    let plan: OperationPlan = serde_json::from_str(&contents)
        .with_context(|| format!("parse operations {}", path.display()))?;
    tracing::debug!(steps = plan.len(), "loaded operation plan");
    Ok(plan)
}

pub fn render_options(format: OutputFormat, width: u32, height: u32, dpi: u32) -> RenderOptions {
    RenderOptions {
        format,
        width,
        height,
        dpi,
        ..RenderOptions::default()
    }
}

pub fn build_request(
    data_file: &Path,
    intent: &str,
    options: RenderOptions,
    plan: Option<OperationPlan>,
) -> Result<VisualizeRequest> {
    let data = std::fs::read_to_string(data_file)
        .with_context(|| format!("read data file {}", data_file.display()))?;
    let mut request = VisualizeRequest::new(data, intent).with_options(options);
    if let Some(plan) = plan {
        request = request.with_operations(plan);
    }
    Ok(request)
}

/// `sales.csv` → `sales.chart.json`, next to the data file.
pub fn default_output_path(data_file: &Path) -> PathBuf {
    let stem = data_file
        .file_stem()
        .map_or_else(|| "result".into(), |stem| stem.to_string_lossy());
    data_file.with_file_name(format!("{stem}.chart.json"))
}
