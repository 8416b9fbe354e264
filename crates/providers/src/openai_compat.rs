//! OpenAI-compatible provider implementation.
//!
//! Works with the Gemini OpenAI-compatibility endpoint, OpenAI, OpenRouter,
//! Ollama, vLLM, and anything else exposing `POST /chat/completions`.
//!
//! Requests are always non-streaming and carry the requested
//! `response_format`, so the step protocol gets exactly one JSON object back.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use termagent_core::error::ProviderError;
use termagent_core::message::Message;
use termagent_core::provider::*;
use tracing::{debug, warn};

/// Maximum characters of an error body kept in a `ProviderError`.
const ERROR_BODY_LIMIT: usize = 500;

/// An OpenAI-compatible LLM provider.
pub struct OpenAiCompatProvider {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Create a new OpenAI-compatible provider.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {e}")))?;

        Ok(Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Convert our Message types to OpenAI API format.
    fn to_api_messages(messages: &[Message]) -> Vec<ApiMessage> {
        messages
            .iter()
            .map(|m| ApiMessage {
                role: m.role.as_str().into(),
                content: Some(m.content.clone()),
            })
            .collect()
    }

    fn request_body(request: &ProviderRequest) -> ApiRequest {
        ApiRequest {
            model: request.model.clone(),
            messages: Self::to_api_messages(&request.messages),
            response_format: ApiResponseFormat {
                r#type: request.response_format.as_str().into(),
            },
            temperature: request.temperature,
            stream: false,
        }
    }
}

#[async_trait]
impl Provider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = Self::request_body(&request);

        debug!(
            provider = %self.name,
            model = %request.model,
            messages = request.messages.len(),
            "Sending completion request"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(e.to_string())
                } else {
                    ProviderError::Network(e.to_string())
                }
            })?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            let message = extract_error_message(&error_body);
            warn!(
                provider = %self.name,
                model = %request.model,
                status = status.as_u16(),
                error = %message,
                "Provider returned error"
            );
            return Err(ProviderError::from_status(status.as_u16(), message));
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse response: {e}")))?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::InvalidResponse("No choices in response".into()))?;

        let usage = api_response.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(ProviderResponse {
            // An empty turn is left to the step codec to reject.
            content: choice.message.content.unwrap_or_default(),
            model: api_response.model.unwrap_or(request.model),
            usage,
        })
    }
}

/// Pull a readable message out of an error body.
///
/// OpenAI returns `{"error": {"message": ...}}`; Gemini sometimes wraps the
/// same object in an array. Anything else is passed through, truncated.
fn extract_error_message(body: &str) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    let object = match &parsed {
        Some(serde_json::Value::Array(items)) => items.first(),
        other => other.as_ref(),
    };

    if let Some(message) = object
        .and_then(|v| v.get("error"))
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
    {
        return message.to_string();
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "empty error body".into();
    }
    trimmed.chars().take(ERROR_BODY_LIMIT).collect()
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Serialize)]
struct ApiRequest {
    model: String,
    messages: Vec<ApiMessage>,
    response_format: ApiResponseFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ApiResponseFormat {
    r#type: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<ApiChoice>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}
