//! Caller-facing request types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::operation::OperationPlan;
use crate::result::ErrorDetail;

/// Serialisation of the input table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataFormat {
    Csv,
    Json,
}

impl DataFormat {
    /// JSON when the payload opens with `[` or `{`, CSV otherwise.
    pub fn detect(data: &str) -> Self {
        match data.trim_start().chars().next() {
            Some('[' | '{') => Self::Json,
            _ => Self::Csv,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Image format produced by the render capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    Svg,
}

impl OutputFormat {
    /// Format to retry with after a render failure. Only PNG has one.
    pub fn alternate(self) -> Option<Self> {
        match self {
            Self::Png => Some(Self::Svg),
            Self::Svg => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Svg => "svg",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    En,
    Ja,
}

pub const WIDTH_RANGE: (u32, u32) = (600, 2000);
pub const HEIGHT_RANGE: (u32, u32) = (400, 2000);
pub const DPI_RANGE: (u32, u32) = (72, 300);
pub const MAX_IMAGE_PIXELS: u64 = 4_000_000;

/// Output options passed through to the render capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    pub format: OutputFormat,
    pub width: u32,
    pub height: u32,
    pub dpi: u32,
    pub locale: Option<Locale>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            format: OutputFormat::Png,
            width: 1200,
            height: 900,
            dpi: 300,
            locale: None,
        }
    }
}

impl RenderOptions {
    /// Range checks; an empty list means the options are valid.
    pub fn problems(&self) -> Vec<ErrorDetail> {
        let mut problems = Vec::new();
        let mut check = |field: &str, value: u32, (min, max): (u32, u32)| {
            if !(min..=max).contains(&value) {
                problems.push(
                    ErrorDetail::new(format!("{field} {value} is outside {min}..={max}"))
                        .with_field(format!("options.{field}"))
                        .with_suggestion(format!("Use a {field} between {min} and {max}")),
                );
            }
        };
        check("width", self.width, WIDTH_RANGE);
        check("height", self.height, HEIGHT_RANGE);
        check("dpi", self.dpi, DPI_RANGE);
        let pixels = u64::from(self.width) * u64::from(self.height);
        if pixels > MAX_IMAGE_PIXELS {
            problems.push(
                ErrorDetail::new(format!(
                    "image size {pixels} pixels exceeds {MAX_IMAGE_PIXELS}"
                ))
                .with_field("options")
                .with_suggestion("Reduce width or height"),
            );
        }
        problems
    }
}

/// One visualization request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualizeRequest {
    /// CSV or JSON text.
    pub data: String,
    /// Free-text visualization intent.
    pub intent: String,
    #[serde(default)]
    pub options: RenderOptions,
    /// Caller-supplied processing plan; derived from the template when absent.
    #[serde(default)]
    pub operations: Option<OperationPlan>,
}

impl VisualizeRequest {
    pub fn new(data: impl Into<String>, intent: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            intent: intent.into(),
            options: RenderOptions::default(),
            operations: None,
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_operations(mut self, plan: OperationPlan) -> Self {
        self.operations = Some(plan);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_format_from_first_character() {
        assert_eq!(DataFormat::detect("  [{\"a\": 1}]"), DataFormat::Json);
        assert_eq!(DataFormat::detect("{\"a\": [1]}"), DataFormat::Json);
        assert_eq!(DataFormat::detect("a,b\n1,2"), DataFormat::Csv);
    }

    #[test]
    fn only_png_has_an_alternate() {
        assert_eq!(OutputFormat::Png.alternate(), Some(OutputFormat::Svg));
        assert_eq!(OutputFormat::Svg.alternate(), None);
    }

    #[test]
    fn default_options_are_valid() {
        assert!(RenderOptions::default().problems().is_empty());
    }

    #[test]
    fn out_of_range_options_are_reported() {
        let options = RenderOptions {
            width: 2000,
            height: 2000,
            dpi: 600,
            ..RenderOptions::default()
        };
        let problems = options.problems();
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].field.as_deref(), Some("options.dpi"));

        let oversized = RenderOptions {
            width: 2000,
            height: 2001,
            ..RenderOptions::default()
        };
        assert_eq!(oversized.problems().len(), 2);
    }
}
