//! OpenAI chat-completions provider.
//!
//! Supports:
//! - Chat completions with function calling (`invoke`)
//! - Streaming SSE text for final answers (`stream`)
//!
//! Tool calls carry server-issued ids which are echoed back on the
//! corresponding `tool` messages.

use async_trait::async_trait;
use arka_core::error::ProviderError;
use arka_core::message::{Message, Role, ToolCall};
use arka_core::provider::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::http;
use crate::sse;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const PROVIDER: &str = "OpenAI";

/// An OpenAI chat-completions provider.
pub struct OpenAiProvider {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl OpenAiProvider {
    /// Create a new OpenAI provider.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.into(),
            model: model.into(),
            client: http::client(120),
        }
    }

    /// Point at an OpenAI-compatible endpoint other than api.openai.com.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    #[cfg(test)]
    pub(crate) fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    fn url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// Convert our Message types to OpenAI API format.
    fn to_api_messages(messages: &[Message]) -> Vec<ApiMessage> {
        messages
            .iter()
            .map(|m| {
                let tool_calls = (!m.tool_calls.is_empty()).then(|| {
                    m.tool_calls
                        .iter()
                        .map(|tc| ApiToolCall {
                            id: tc.id.clone(),
                            r#type: "function".into(),
                            function: ApiFunction {
                                name: tc.name.clone(),
                                arguments: serde_json::Value::Object(tc.args.clone()).to_string(),
                            },
                        })
                        .collect()
                });

                // An assistant turn that only calls tools is sent with null content.
                let tool_only = m.role == Role::Assistant && m.content.is_empty();
                let content = if tool_only && tool_calls.is_some() {
                    None
                } else {
                    Some(m.content.clone())
                };

                ApiMessage {
                    role: m.role.as_str().into(),
                    content,
                    tool_calls,
                    tool_call_id: m.tool_call_id.clone(),
                }
            })
            .collect()
    }

    fn request_body(&self, messages: &[Message], options: &InvokeOptions) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": self.model,
            "messages": Self::to_api_messages(messages),
        });

        if !options.tools.is_empty() {
            body["tools"] = serde_json::json!(options.tools);
            body["tool_choice"] = serde_json::json!(options.tool_choice);
        }

        body
    }

    fn stream_body(&self, messages: &[Message], options: &InvokeOptions) -> serde_json::Value {
        let mut body = self.request_body(messages, options);
        body["stream"] = serde_json::json!(true);
        body
    }

    fn parse_response(api_response: ApiResponse) -> Result<ProviderResponse, ProviderError> {
        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| http::decode("No choices in response"))?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| ToolCall {
                args: parse_arguments(&tc.function.name, &tc.function.arguments),
                id: tc.id,
                name: tc.function.name,
            })
            .collect();

        Ok(ProviderResponse {
            content: choice.message.content.unwrap_or_default(),
            tool_calls,
        })
    }

    fn extract_delta(data: &str) -> Result<Option<String>, serde_json::Error> {
        let chunk: StreamResponse = serde_json::from_str(data)?;
        Ok(chunk
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta.content))
    }
}

/// Arguments arrive as a JSON-encoded string. Anything that is not an object
/// becomes an empty map, and schema validation reports what is missing.
fn parse_arguments(tool: &str, raw: &str) -> serde_json::Map<String, serde_json::Value> {
    if raw.trim().is_empty() {
        return serde_json::Map::new();
    }
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::Object(map)) => map,
        Ok(_) => {
            warn!(tool, raw, "Tool arguments are not a JSON object");
            serde_json::Map::new()
        }
        Err(e) => {
            warn!(tool, raw, error = %e, "Failed to parse tool arguments");
            serde_json::Map::new()
        }
    }
}

#[async_trait]
impl arka_core::Provider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn invoke(
        &self,
        messages: &[Message],
        options: &InvokeOptions,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let body = self.request_body(messages, options);

        debug!(
            provider = "openai",
            model = %self.model,
            messages = messages.len(),
            tools = options.tools.len(),
            "Sending completion request"
        );

        let response = self
            .client
            .post(self.url())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(http::network)?;

        let response = http::ensure_success(PROVIDER, response).await?;
        let api_response: ApiResponse = response.json().await.map_err(http::decode)?;
        Self::parse_response(api_response)
    }

    async fn stream(
        &self,
        messages: &[Message],
        options: &InvokeOptions,
    ) -> std::result::Result<StreamReceiver, ProviderError> {
        let body = self.stream_body(messages, options);

        debug!(provider = "openai", model = %self.model, "Sending streaming request");

        let response = self
            .client
            .post(self.url())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .header("Accept", "text/event-stream")
            .json(&body)
            .send()
            .await
            .map_err(http::network)?;

        let response = http::ensure_success(PROVIDER, response).await?;
        Ok(sse::spawn_text_stream("openai", response, Self::extract_delta))
    }
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ApiToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolCall {
    id: String,
    r#type: String,
    function: ApiFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiFunction {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

// --- Streaming SSE types ---

/// A single SSE `data: {...}` chunk from a streaming response.
#[derive(Debug, Deserialize)]
struct StreamResponse {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}
