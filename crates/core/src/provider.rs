//! Provider trait — the abstraction over LLM backends.
//!
//! A Provider knows how to send a transcript to an LLM and get a response
//! back, either as a single structured answer (`invoke`, which may carry tool
//! calls) or as a stream of text fragments (`stream`, used for final answers).
//!
//! Implementations: OpenAI, Gemini, Claude.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ProviderError;
use crate::message::{Message, ToolCall};

/// The vendor families Arka can talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[serde(rename = "openai")]
    OpenAi,
    Gemini,
    Claude,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [Self::OpenAi, Self::Gemini, Self::Claude];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Gemini => "gemini",
            Self::Claude => "claude",
        }
    }

    /// Vendor name used in error messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::OpenAi => "OpenAI",
            Self::Gemini => "Gemini",
            Self::Claude => "Claude",
        }
    }

    /// A small, inexpensive model for background classification passes.
    pub fn cheap_model(&self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-4o-mini",
            Self::Gemini => "gemini-1.5-flash",
            Self::Claude => "claude-3-haiku-20240307",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "gemini" | "google" => Ok(Self::Gemini),
            "claude" | "anthropic" => Ok(Self::Claude),
            other => Err(format!(
                "unknown provider '{other}' (expected openai, gemini or claude)"
            )),
        }
    }
}

/// How the model may choose tools.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoice {
    /// The model decides whether to call a tool.
    #[default]
    Auto,
}

/// Options for a single `invoke` call.
#[derive(Debug, Clone, Default)]
pub struct InvokeOptions {
    /// Provider-formatted tool declarations
    pub tools: Vec<serde_json::Value>,

    pub tool_choice: ToolChoice,
}

impl InvokeOptions {
    pub fn with_tools(tools: Vec<serde_json::Value>) -> Self {
        Self {
            tools,
            tool_choice: ToolChoice::Auto,
        }
    }
}

/// A complete (non-streaming) response from a provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// Generated text (may be empty when only tools were called)
    pub content: String,

    /// Non-empty iff the model chose to act
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
}

impl ProviderResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// A single fragment of a streamed answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamChunk {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl StreamChunk {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }
}

/// Receiving half of a provider stream.
pub type StreamReceiver =
    tokio::sync::mpsc::Receiver<std::result::Result<StreamChunk, ProviderError>>;

/// The core Provider trait.
///
/// Every vendor adapter implements this trait. The agent loop calls
/// `invoke()` or `stream()` without knowing which vendor is being used.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "openai", "claude").
    fn name(&self) -> &str;

    /// Send the transcript and get one structured response.
    async fn invoke(
        &self,
        messages: &[Message],
        options: &InvokeOptions,
    ) -> std::result::Result<ProviderResponse, ProviderError>;

    /// Send the transcript and receive text fragments as they are generated.
    ///
    /// `options` must be the ones the transcript was built with: a transcript
    /// holding tool calls is only valid alongside its tool declarations.
    /// Default implementation calls `invoke()` and wraps the result as a
    /// single chunk.
    async fn stream(
        &self,
        messages: &[Message],
        options: &InvokeOptions,
    ) -> std::result::Result<StreamReceiver, ProviderError> {
        let response = self.invoke(messages, options).await?;
        let (tx, rx) = tokio::sync::mpsc::channel(1);
        let _ = tx.send(Ok(StreamChunk::text(response.content))).await;
        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_kind_parses_aliases() {
        assert_eq!("OpenAI".parse::<ProviderKind>(), Ok(ProviderKind::OpenAi));
        assert_eq!("anthropic".parse::<ProviderKind>(), Ok(ProviderKind::Claude));
        assert_eq!(" google ".parse::<ProviderKind>(), Ok(ProviderKind::Gemini));
        assert!("mistral".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn provider_kind_serde_matches_display() {
        for kind in ProviderKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{kind}\""));
        }
    }

    #[test]
    fn response_tool_call_flag() {
        assert!(!ProviderResponse::text("hi").has_tool_calls());
        let response = ProviderResponse {
            content: String::new(),
            tool_calls: vec![ToolCall::new("1", "x", Default::default())],
        };
        assert!(response.has_tool_calls());
    }

    struct Fixed;

    #[async_trait]
    impl Provider for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn invoke(
            &self,
            _messages: &[Message],
            _options: &InvokeOptions,
        ) -> std::result::Result<ProviderResponse, ProviderError> {
            Ok(ProviderResponse::text("all at once"))
        }
    }

    #[tokio::test]
    async fn default_stream_wraps_invoke() {
        let mut rx = Fixed
            .stream(&[Message::user("hi")], &InvokeOptions::default())
            .await
            .unwrap();
        let chunk = rx.recv().await.unwrap().unwrap();
        assert_eq!(chunk.text.as_deref(), Some("all at once"));
        assert!(rx.recv().await.is_none());
    }
}
