//! OpenAI-compatible chat completions classifier.

use async_trait::async_trait;
use chart_select::{ClassificationRequest, Classifier, ClassifierError, ClassifierTask};
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::config::EndpointSettings;

const USER_AGENT_VALUE: &str = concat!("chartsmith/", env!("CARGO_PKG_VERSION"));

/// Sends each classification request as one chat completion with
/// temperature 0 and a JSON object response format.
#[derive(Debug, Clone)]
pub struct HttpClassifier {
    client: reqwest::Client,
    url: String,
    model: String,
    api_key: Option<String>,
}

impl HttpClassifier {
    pub fn new(
        endpoint: &str,
        model: impl Into<String>,
        api_key: Option<String>,
    ) -> Result<Self, ClassifierError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| {
                ClassifierError::Transport(format!("failed to create HTTP client: {e}"))
            })?;
        Ok(Self {
            client,
            url: completions_url(endpoint),
            model: model.into(),
            api_key: api_key.filter(|key| !key.is_empty()),
        })
    }

    /// Reads the API key from the environment variable named in `settings`.
    pub fn from_settings(settings: &EndpointSettings) -> Result<Self, ClassifierError> {
        let api_key = std::env::var(&settings.api_key_env).ok();
        if api_key.is_none() {
            tracing::debug!(
                variable = %settings.api_key_env,
                "no API key in environment, sending unauthenticated requests"
            );
        }
        Self::new(&settings.endpoint, settings.model.clone(), api_key)
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Classifier for HttpClassifier {
    async fn classify(&self, request: &ClassificationRequest) -> Result<String, ClassifierError> {
        let body = request_body(&self.model, request);
        let mut builder = self
            .client
            .post(&self.url)
            .timeout(request.timeout)
            .json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        tracing::trace!(task = %request.task, url = %self.url, "sending classification request");

        let timeout_ms = u64::try_from(request.timeout.as_millis()).unwrap_or(u64::MAX);
        let response = builder
            .send()
            .await
            .map_err(|error| transport_error(&error, timeout_ms))?;
        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status));
        }
        let reply: ChatResponse = response
            .json()
            .await
            .map_err(|error| transport_error(&error, timeout_ms))?;
        reply_content(reply, request.task)
    }
}

/// Appends `/chat/completions` unless the endpoint already names it.
pub fn completions_url(endpoint: &str) -> String {
    let endpoint = endpoint.trim().trim_end_matches('/');
    if endpoint.ends_with("/chat/completions") {
        endpoint.to_string()
    } else {
        format!("{endpoint}/chat/completions")
    }
}

pub fn request_body(model: &str, request: &ClassificationRequest) -> Value {
    json!({
        "model": model,
        "temperature": 0,
        "response_format": { "type": "json_object" },
        "messages": [
            { "role": "system", "content": request.system },
            { "role": "user", "content": request.prompt },
        ],
    })
}

/// Rate limits and server errors are worth a retry; other statuses are not.
pub fn status_error(status: StatusCode) -> ClassifierError {
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        ClassifierError::Transport(format!("classifier endpoint returned {status}"))
    } else {
        tracing::warn!(%status, "classifier endpoint rejected the request");
        ClassifierError::Unavailable
    }
}

fn transport_error(error: &reqwest::Error, timeout_ms: u64) -> ClassifierError {
    if error.is_timeout() {
        ClassifierError::Timeout(timeout_ms)
    } else if error.is_decode() {
        ClassifierError::Transport("classifier reply is not a chat completion".to_string())
    } else {
        ClassifierError::Transport(error.to_string())
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

pub fn reply_content(reply: ChatResponse, task: ClassifierTask) -> Result<String, ClassifierError> {
    reply
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or(ClassifierError::Malformed(task))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ClassificationRequest {
        ClassificationRequest::new(
            ClassifierTask::Pattern,
            "Pick one pattern.",
            "Columns: date (temporal)",
            vec!["P01".to_string()],
        )
    }

    #[test]
    fn url_gets_completions_path_once() {
        assert_eq!(
            completions_url("https://api.openai.com/v1/"),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(
            completions_url("http://localhost:8080/v1/chat/completions"),
            "http://localhost:8080/v1/chat/completions"
        );
    }

    #[test]
    fn body_is_deterministic_json_mode() {
        let body = request_body("gpt-4o-mini", &request());
        assert_eq!(body["temperature"], 0);
        assert_eq!(body["response_format"]["type"], "json_object");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "Columns: date (temporal)");
    }

    #[test]
    fn first_choice_content_is_the_reply() {
        let reply: ChatResponse = serde_json::from_value(json!({
            "choices": [{ "message": { "role": "assistant", "content": "{\"pattern_id\":\"P01\"}" } }]
        }))
        .unwrap();
        assert_eq!(
            reply_content(reply, ClassifierTask::Pattern).unwrap(),
            "{\"pattern_id\":\"P01\"}"
        );
    }

    #[test]
    fn empty_choices_are_malformed() {
        let reply: ChatResponse = serde_json::from_value(json!({ "choices": [] })).unwrap();
        assert_eq!(
            reply_content(reply, ClassifierTask::Template).unwrap_err(),
            ClassifierError::Malformed(ClassifierTask::Template)
        );
    }

    #[test]
    fn only_transient_statuses_are_retryable() {
        assert!(status_error(StatusCode::TOO_MANY_REQUESTS).is_retryable());
        assert!(status_error(StatusCode::BAD_GATEWAY).is_retryable());
        assert_eq!(status_error(StatusCode::UNAUTHORIZED), ClassifierError::Unavailable);
    }
}
