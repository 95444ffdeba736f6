//! Error types for the Arka domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; the orchestration loop decides
//! which of them are fatal (provider) and which are fed back to the model (tool).

use thiserror::Error;

/// The top-level error type for all Arka operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Memory errors ---
    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures talking to an LLM vendor. Always fatal to the current turn.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// Non-success HTTP status. Carries the raw response body.
    #[error("{provider} API error: {status} - {body}")]
    Api {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Stream interrupted: {0}")]
    Stream(String),

    #[error("Failed to decode provider response: {0}")]
    Decode(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Failures dispatching or running a tool.
///
/// The orchestration loop renders these as `Error: {message}` tool results,
/// so the display strings are written for the model to read.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid input for {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },

    #[error("{reason}")]
    ExecutionFailed { tool: String, reason: String },

    #[error("Safety violation: {0}")]
    SafetyViolation(String),

    #[error("{tool} timed out after {secs}s")]
    Timeout { tool: String, secs: u64 },
}

impl ToolError {
    /// Shorthand for [`ToolError::ExecutionFailed`].
    pub fn failed(tool: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::ExecutionFailed {
            tool: tool.into(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_status_and_body() {
        let err = Error::Provider(ProviderError::Api {
            provider: "OpenAI".into(),
            status: 429,
            body: "Too many requests".into(),
        });
        let text = err.to_string();
        assert!(text.contains("OpenAI API error: 429 - Too many requests"));
    }

    #[test]
    fn tool_error_messages_are_model_readable() {
        assert_eq!(
            ToolError::UnknownTool("teleport".into()).to_string(),
            "Unknown tool: teleport"
        );
        let err = ToolError::InvalidArguments {
            tool: "read_file".into(),
            reason: "missing required field 'path'".into(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid input for read_file: missing required field 'path'"
        );
        assert_eq!(ToolError::failed("x", "disk full").to_string(), "disk full");
    }

    #[test]
    fn timeout_mentions_seconds() {
        let err = ToolError::Timeout {
            tool: "execute_command".into(),
            secs: 300,
        };
        assert!(err.to_string().contains("300s"));
    }
}
