//! Claude provider over Anthropic's native Messages API.
//!
//! Features:
//! - `x-api-key` header authentication (not Bearer)
//! - `anthropic-version` header
//! - System prompt as top-level field
//! - Native tool use with `tool_use` / `tool_result` content blocks
//! - Streaming via SSE with `content_block_delta` events

use async_trait::async_trait;
use arka_core::error::ProviderError;
use arka_core::message::{Message, Role, ToolCall};
use arka_core::provider::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::http;
use crate::sse;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_MAX_TOKENS: u32 = 4096;
const PROVIDER: &str = "Claude";

/// Anthropic native Messages API provider.
pub struct ClaudeProvider {
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    client: reqwest::Client,
}

impl ClaudeProvider {
    /// Create a new Claude provider.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.into(),
            model: model.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            client: http::client(300),
        }
    }

    /// Create with a custom base URL (e.g., for testing or proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    #[cfg(test)]
    pub(crate) fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    fn url(&self) -> String {
        format!("{}/v1/messages", self.base_url)
    }

    /// Extract system messages from the message list.
    /// Anthropic puts system prompt as a top-level field, not in messages.
    fn extract_system(messages: &[Message]) -> (Option<String>, Vec<&Message>) {
        let mut system_parts: Vec<&str> = Vec::new();
        let mut non_system: Vec<&Message> = Vec::new();

        for msg in messages {
            match msg.role {
                Role::System => system_parts.push(&msg.content),
                _ => non_system.push(msg),
            }
        }

        let system = if system_parts.is_empty() {
            None
        } else {
            Some(system_parts.join("\n\n"))
        };

        (system, non_system)
    }

    /// Convert messages to Anthropic API format with content blocks.
    ///
    /// Consecutive tool results are merged into one user turn, since every
    /// `tool_use` of an assistant turn must be answered in the next message.
    fn to_api_messages(messages: &[&Message]) -> Vec<AnthropicMessage> {
        let mut result: Vec<AnthropicMessage> = Vec::new();

        for msg in messages {
            match msg.role {
                Role::User => {
                    result.push(AnthropicMessage {
                        role: "user".into(),
                        content: AnthropicContent::Text(msg.content.clone()),
                    });
                }
                Role::Assistant if msg.tool_calls.is_empty() => {
                    result.push(AnthropicMessage {
                        role: "assistant".into(),
                        content: AnthropicContent::Text(msg.content.clone()),
                    });
                }
                Role::Assistant => {
                    let mut blocks: Vec<ContentBlock> = Vec::new();
                    if !msg.content.is_empty() {
                        blocks.push(ContentBlock::Text {
                            text: msg.content.clone(),
                        });
                    }
                    for tc in &msg.tool_calls {
                        blocks.push(ContentBlock::ToolUse {
                            id: tc.id.clone(),
                            name: tc.name.clone(),
                            input: serde_json::Value::Object(tc.args.clone()),
                        });
                    }
                    result.push(AnthropicMessage {
                        role: "assistant".into(),
                        content: AnthropicContent::Blocks(blocks),
                    });
                }
                Role::Tool => {
                    let block = ContentBlock::ToolResult {
                        tool_use_id: msg.tool_call_id.clone().unwrap_or_default(),
                        content: msg.content.clone(),
                    };
                    match result.last_mut() {
                        Some(AnthropicMessage {
                            role,
                            content: AnthropicContent::Blocks(blocks),
                        }) if role.as_str() == "user" => blocks.push(block),
                        _ => result.push(AnthropicMessage {
                            role: "user".into(),
                            content: AnthropicContent::Blocks(vec![block]),
                        }),
                    }
                }
                Role::System => {} // handled separately
            }
        }

        result
    }

    fn request_body(
        &self,
        messages: &[Message],
        options: &InvokeOptions,
        stream: bool,
    ) -> serde_json::Value {
        let (system, messages) = Self::extract_system(messages);

        let mut body = serde_json::json!({
            "model": self.model,
            "messages": Self::to_api_messages(&messages),
            "max_tokens": self.max_tokens,
        });

        if let Some(sys) = system {
            body["system"] = serde_json::json!(sys);
        }

        if !options.tools.is_empty() {
            body["tools"] = serde_json::json!(options.tools);
            body["tool_choice"] = serde_json::json!({ "type": options.tool_choice });
        }

        if stream {
            body["stream"] = serde_json::json!(true);
        }

        body
    }

    /// Convert Anthropic API response to our ProviderResponse.
    fn response_to_provider_response(resp: AnthropicResponse) -> ProviderResponse {
        let mut text_content = String::new();
        let mut tool_calls = Vec::new();

        for block in resp.content {
            match block {
                ResponseContentBlock::Text { text } => text_content.push_str(&text),
                ResponseContentBlock::ToolUse { id, name, input } => {
                    let args = match input {
                        serde_json::Value::Object(map) => map,
                        _ => serde_json::Map::new(),
                    };
                    tool_calls.push(ToolCall { id, name, args });
                }
                ResponseContentBlock::Other => {}
            }
        }

        debug!(
            provider = "claude",
            stop_reason = resp.stop_reason.as_deref().unwrap_or("unknown"),
            tool_calls = tool_calls.len(),
            "Parsed response"
        );

        ProviderResponse {
            content: text_content,
            tool_calls,
        }
    }

    /// Only `content_block_delta` events with a text delta carry output.
    fn extract_delta(data: &str) -> Result<Option<String>, serde_json::Error> {
        let event: StreamEvent = serde_json::from_str(data)?;
        Ok(match event {
            StreamEvent::ContentBlockDelta {
                delta: StreamDelta::TextDelta { text },
            } => Some(text),
            _ => None,
        })
    }
}

#[async_trait]
impl arka_core::Provider for ClaudeProvider {
    fn name(&self) -> &str {
        "claude"
    }

    async fn invoke(
        &self,
        messages: &[Message],
        options: &InvokeOptions,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let body = self.request_body(messages, options, false);

        debug!(
            provider = "claude",
            model = %self.model,
            messages = messages.len(),
            tools = options.tools.len(),
            "Sending completion request"
        );

        let response = self
            .client
            .post(self.url())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(http::network)?;

        let response = http::ensure_success(PROVIDER, response).await?;
        let api_resp: AnthropicResponse = response.json().await.map_err(http::decode)?;
        Ok(Self::response_to_provider_response(api_resp))
    }

    async fn stream(
        &self,
        messages: &[Message],
        options: &InvokeOptions,
    ) -> std::result::Result<StreamReceiver, ProviderError> {
        let body = self.request_body(messages, options, true);

        debug!(provider = "claude", model = %self.model, "Sending streaming request");

        let response = self
            .client
            .post(self.url())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .header("Accept", "text/event-stream")
            .json(&body)
            .send()
            .await
            .map_err(http::network)?;

        let response = http::ensure_success(PROVIDER, response).await?;
        Ok(sse::spawn_text_stream("claude", response, Self::extract_delta))
    }
}

// --- Anthropic API types ---

#[derive(Debug, Serialize, Deserialize)]
struct AnthropicMessage {
    role: String,
    content: AnthropicContent,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum AnthropicContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "tool_use")]
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    #[serde(rename = "tool_result")]
    ToolResult {
        tool_use_id: String,
        content: String,
    },
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ResponseContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ResponseContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "tool_use")]
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    /// Thinking and any block type added later.
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StreamEvent {
    ContentBlockDelta { delta: StreamDelta },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StreamDelta {
    TextDelta { text: String },
    #[serde(other)]
    Other,
}
