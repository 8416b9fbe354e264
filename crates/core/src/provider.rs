//! Provider trait: the abstraction over chat-completion endpoints.
//!
//! A Provider knows how to send a transcript to an LLM under a given model
//! name and get exactly one complete response back. Model selection and
//! fallback live above this trait; a provider never retries on its own.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::message::Message;

/// The output format requested from the endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    /// The model must answer with a single JSON object.
    #[default]
    JsonObject,
}

impl ResponseFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseFormat::JsonObject => "json_object",
        }
    }
}

/// One chat-completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// The model candidate to use (e.g. "gemini-2.5-pro")
    pub model: String,

    /// The transcript snapshot
    pub messages: Vec<Message>,

    /// Requested output format
    #[serde(default)]
    pub response_format: ResponseFormat,

    /// Sampling temperature; endpoint default when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl ProviderRequest {
    /// A JSON-mode request for the given model and transcript snapshot.
    pub fn json(model: impl Into<String>, messages: &[Message]) -> Self {
        Self {
            model: model.into(),
            messages: messages.to_vec(),
            response_format: ResponseFormat::JsonObject,
            temperature: None,
        }
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }
}

/// A complete (non-streaming) response from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// The raw text of the first choice
    pub content: String,

    /// Which model actually responded (may differ from requested)
    pub model: String,

    /// Token usage statistics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

/// Token usage information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// The core Provider trait.
///
/// The agent loop calls `complete()` once per iteration without knowing
/// which endpoint is behind it.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g. "gemini").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_request_defaults() {
        let messages = vec![Message::system("rules"), Message::user("hi")];
        let req = ProviderRequest::json("gemini-2.5-pro", &messages);
        assert_eq!(req.model, "gemini-2.5-pro");
        assert_eq!(req.response_format, ResponseFormat::JsonObject);
        assert_eq!(req.messages, messages);
        assert!(req.temperature.is_none());
    }

    #[test]
    fn response_format_wire_names() {
        assert_eq!(ResponseFormat::JsonObject.as_str(), "json_object");
        let json = serde_json::to_string(&ResponseFormat::JsonObject).unwrap();
        assert_eq!(json, r#""json_object""#);
    }
}
