//! CLI configuration file.
//!
//! One TOML document feeds both the pipeline settings and the classifier
//! endpoint:
//!
//! ```toml
//! [timeouts]
//! total = 30000
//!
//! [classifier]
//! attempt_timeout_ms = 4500
//! endpoint = "http://localhost:11434/v1"
//! model = "llama3.1"
//! api_key_env = "CHARTSMITH_API_KEY"
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use chart_core::PipelineConfig;
use serde::Deserialize;

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Where classification requests are sent.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EndpointSettings {
    /// Base URL of an OpenAI-compatible API; `/chat/completions` is appended.
    pub endpoint: String,
    pub model: String,
    /// Environment variable holding the API key. Unset means no auth header.
    pub api_key_env: String,
}

impl Default for EndpointSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EndpointDocument {
    classifier: EndpointSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppConfig {
    pub pipeline: PipelineConfig,
    pub endpoint: EndpointSettings,
}

impl AppConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let pipeline = PipelineConfig::from_toml_str(contents)?;
        let document: EndpointDocument =
            toml::from_str(contents).context("parse [classifier] endpoint settings")?;
        anyhow::ensure!(
            !document.classifier.endpoint.trim().is_empty(),
            "classifier.endpoint must not be empty"
        );
        Ok(Self {
            pipeline,
            endpoint: document.classifier,
        })
    }

    /// Defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let config = Self::from_toml_str(&contents)
            .with_context(|| format!("load config {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }
}
