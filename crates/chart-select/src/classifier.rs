//! Constrained classification protocol.
//!
//! Every classifier-backed decision goes through [`ConstrainedClassifier`]:
//! one bounded call, at most one retry for transient failures, and a reply
//! parsed into a typed structure before anything else sees it. Callers then
//! check the parsed value against their closed enumeration.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which decision a classification request serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ClassifierTask {
    Pattern,
    Template,
    Auxiliary,
    Mapping,
}

impl ClassifierTask {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pattern => "pattern",
            Self::Template => "template",
            Self::Auxiliary => "auxiliary",
            Self::Mapping => "mapping",
        }
    }
}

impl fmt::Display for ClassifierTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One bounded question for the classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationRequest {
    pub task: ClassifierTask,
    /// Fixed instructions for the task.
    pub system: String,
    pub prompt: String,
    /// Values the reply must be drawn from.
    pub allowed: Vec<String>,
    /// Time allowed for one attempt.
    pub timeout: Duration,
}

impl ClassificationRequest {
    pub fn new(
        task: ClassifierTask,
        system: impl Into<String>,
        prompt: impl Into<String>,
        allowed: Vec<String>,
    ) -> Self {
        Self {
            task,
            system: system.into(),
            prompt: prompt.into(),
            allowed,
            timeout: Duration::from_millis(ClassifierSettings::default().attempt_timeout_ms),
        }
    }
}

/// External classification capability.
///
/// Implementations return the raw reply text; validation happens in
/// [`ConstrainedClassifier`].
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, request: &ClassificationRequest) -> Result<String, ClassifierError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifierError {
    #[error("classifier timed out after {0} ms")]
    Timeout(u64),

    #[error("classifier request failed: {0}")]
    Transport(String),

    #[error("classifier reply is not a valid {0} object")]
    Malformed(ClassifierTask),

    #[error("classifier chose a value outside the allowed {0} options")]
    OutOfEnumeration(ClassifierTask),

    #[error("no classifier is configured")]
    Unavailable,
}

impl ClassifierError {
    /// Timeouts and transport failures may succeed on a second attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Transport(_))
    }
}

/// Retry and timeout settings for classifier calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierSettings {
    pub attempt_timeout_ms: u64,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            attempt_timeout_ms: 4_500,
            max_retries: 1,
            retry_backoff_ms: 250,
        }
    }
}

/// Wraps a [`Classifier`] with timeouts, retry and reply parsing.
#[derive(Clone)]
pub struct ConstrainedClassifier {
    inner: Arc<dyn Classifier>,
    settings: ClassifierSettings,
}

impl ConstrainedClassifier {
    pub fn new(inner: Arc<dyn Classifier>) -> Self {
        Self {
            inner,
            settings: ClassifierSettings::default(),
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: ClassifierSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &ClassifierSettings {
        &self.settings
    }

    /// Asks the classifier and parses the reply as `T`.
    ///
    /// Only timeouts and transport errors are retried; a reply that does
    /// not parse is final.
    pub async fn ask<T: DeserializeOwned>(
        &self,
        request: ClassificationRequest,
    ) -> Result<T, ClassifierError> {
        let mut request = request;
        request.timeout = Duration::from_millis(self.settings.attempt_timeout_ms);
        let task = request.task;
        let mut attempt = 0;

        loop {
            let start = Instant::now();
            let outcome = match tokio::time::timeout(request.timeout, self.inner.classify(&request))
                .await
            {
                Ok(reply) => reply,
                Err(_) => Err(ClassifierError::Timeout(self.settings.attempt_timeout_ms)),
            };
            tracing::debug!(
                task = %task,
                attempt,
                ok = outcome.is_ok(),
                duration_ms = start.elapsed().as_millis() as u64,
                "classifier call"
            );

            match outcome {
                Ok(text) => return parse_reply(task, &text),
                Err(error) if error.is_retryable() && attempt < self.settings.max_retries => {
                    tracing::warn!(task = %task, attempt, %error, "retrying classifier call");
                    attempt += 1;
                    tokio::time::sleep(Duration::from_millis(self.settings.retry_backoff_ms))
                        .await;
                }
                Err(error) => {
                    tracing::warn!(task = %task, attempt, %error, "classifier call failed");
                    return Err(error);
                }
            }
        }
    }
}

impl fmt::Debug for ConstrainedClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstrainedClassifier")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// The outermost `{...}` of a reply, dropping prose and code fences around it.
pub fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Parses a reply into `T`. Parse errors never echo the reply text.
pub fn parse_reply<T: DeserializeOwned>(task: ClassifierTask, text: &str) -> Result<T, ClassifierError> {
    let json = extract_json(text).ok_or(ClassifierError::Malformed(task))?;
    serde_json::from_str(json).map_err(|_| ClassifierError::Malformed(task))
}
