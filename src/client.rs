// Copyright 2025
// SPDX-License-Identifier: Apache-2.0
//
// Reasoning-service client for OpenAI-compatible chat completion endpoints

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::{json, Value};

/// Default OpenAI API base URL
const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Default local llama-server URL
const LOCAL_BASE_URL: &str = "http://localhost:8080/v1";

/// Local servers ignore the key but the header must be present
const LOCAL_PLACEHOLDER_KEY: &str = "sk-no-key-required";

/// Failures talking to a reasoning service
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("missing api key for provider: {provider}")]
    MissingApiKey { provider: String },

    #[error("request failed: {reason}")]
    Transport { reason: String },

    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("response parse error: {reason}")]
    Parse { reason: String },
}

/// One system + user exchange
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub system: String,
    pub user: String,
    /// Sampling temperature (0.0 = deterministic)
    pub temperature: f32,
    /// Ask the service to reply with a single JSON object
    pub json_object: bool,
    /// Overrides the client's default model
    pub model: Option<String>,
}

impl ChatRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            temperature: 0.7,
            json_object: false,
            model: None,
        }
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn json_object(mut self) -> Self {
        self.json_object = true;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// Request/response access to a text-generation service
///
/// Implementations return the generated text, or an error for transport,
/// status and parse failures. Callers decide whether a failure is fatal.
pub trait ReasoningClient: Send + Sync {
    fn complete(&self, request: &ChatRequest) -> Result<String, ClientError>;
}

/// Connection settings for one endpoint
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub provider: String,
    pub api_key: String,
    pub base_url: String,
    pub default_model: String,
    /// Request-level timeout; `None` leaves the call unbounded
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    /// Local llama-server style endpoint
    pub fn local() -> Self {
        Self {
            provider: "local".to_string(),
            api_key: LOCAL_PLACEHOLDER_KEY.to_string(),
            base_url: LOCAL_BASE_URL.to_string(),
            default_model: "mistral".to_string(),
            timeout: None,
        }
    }

    /// Hosted OpenAI API
    pub fn openai(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: "openai".to_string(),
            api_key: api_key.into(),
            base_url: OPENAI_BASE_URL.to_string(),
            default_model: model.into(),
            timeout: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Blocking OpenAI Chat Completions client
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    config: ClientConfig,
    http: reqwest::blocking::Client,
}

impl OpenAiClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        if config.api_key.is_empty() {
            return Err(ClientError::MissingApiKey {
                provider: config.provider.clone(),
            });
        }

        let mut builder = reqwest::blocking::Client::builder();
        // reqwest's blocking client defaults to 30s; keep unbounded unless asked
        builder = builder.timeout(config.timeout);
        let http = builder.build().map_err(|e| ClientError::Transport {
            reason: format!("failed to build HTTP client: {e}"),
        })?;

        Ok(Self { config, http })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn headers(&self) -> Result<HeaderMap, ClientError> {
        let mut headers = HeaderMap::new();
        let auth_value = format!("Bearer {}", self.config.api_key);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth_value).map_err(|e| ClientError::Transport {
                reason: format!("invalid authorization header: {e}"),
            })?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

impl ReasoningClient for OpenAiClient {
    fn complete(&self, request: &ChatRequest) -> Result<String, ClientError> {
        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let body = build_request_body(request, &self.config.default_model);

        tracing::debug!(
            url = %url,
            model = %body["model"],
            provider = %self.config.provider,
            json_object = request.json_object,
            "sending chat completion request"
        );

        let resp = self
            .http
            .post(&url)
            .headers(self.headers()?)
            .json(&body)
            .send()
            .map_err(|e| ClientError::Transport {
                reason: e.to_string(),
            })?;

        let status = resp.status();
        let text = resp.text().map_err(|e| ClientError::Transport {
            reason: format!("failed to read response body: {e}"),
        })?;

        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let v: Value = serde_json::from_str(&text).map_err(|e| ClientError::Parse {
            reason: format!("invalid JSON response: {e}"),
        })?;

        parse_response(&v)
    }
}

/// Build the JSON body for the Chat Completions API
pub fn build_request_body(request: &ChatRequest, default_model: &str) -> Value {
    let mut body = json!({
        "model": request.model.as_deref().unwrap_or(default_model),
        "messages": [
            { "role": "system", "content": request.system },
            { "role": "user", "content": request.user },
        ],
        "temperature": request.temperature,
    });

    if request.json_object {
        body["response_format"] = json!({ "type": "json_object" });
    }

    body
}

/// Extract `choices[0].message.content`
pub fn parse_response(v: &Value) -> Result<String, ClientError> {
    v["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_owned)
        .ok_or_else(|| ClientError::Parse {
            reason: "missing `choices[0].message.content` in response".into(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_plain() {
        let request = ChatRequest::new("sys", "hello");
        let body = build_request_body(&request, "gpt-4o");
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "hello");
        assert!(body.get("response_format").is_none());
    }

    #[test]
    fn test_request_body_json_mode() {
        let request = ChatRequest::new("sys", "hello")
            .temperature(0.0)
            .json_object()
            .model("mistral");
        let body = build_request_body(&request, "gpt-4o");
        assert_eq!(body["model"], "mistral");
        assert_eq!(body["temperature"], 0.0);
        assert_eq!(body["response_format"]["type"], "json_object");
    }

    #[test]
    fn test_parse_response() {
        let v = json!({"choices": [{"message": {"role": "assistant", "content": "done"}}]});
        assert_eq!(parse_response(&v).unwrap(), "done");
    }

    #[test]
    fn test_parse_response_missing_content() {
        let v = json!({"error": {"message": "overloaded"}});
        assert!(matches!(parse_response(&v), Err(ClientError::Parse { .. })));
    }

    #[test]
    fn test_missing_api_key() {
        let err = OpenAiClient::new(ClientConfig::openai("", "gpt-4o")).unwrap_err();
        assert!(matches!(err, ClientError::MissingApiKey { .. }));
    }

    #[test]
    fn test_local_preset() {
        let config = ClientConfig::local();
        assert_eq!(config.base_url, "http://localhost:8080/v1");
        assert!(!config.api_key.is_empty());
        assert!(OpenAiClient::new(config).is_ok());
    }
}
