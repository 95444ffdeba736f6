//! Built-in tool implementations for Arka.
//!
//! Tools give the agent the ability to interact with the world:
//! read and write project files, run shell commands, grep the codebase,
//! search the web and make HTTP calls.
//!
//! Every path argument is confined to the session working directory.
//! Which tools the model sees depends on the [`AgentMode`].

mod args;
pub mod file_ops;
pub mod file_read;
pub mod file_write;
pub mod http_request;
pub mod modes;
pub mod search;
pub mod shell;
pub mod web_search;

pub use modes::{AgentMode, all_tools, registry_for_mode};

/// Knobs that configure the built-in tools.
#[derive(Debug, Clone)]
pub struct ToolSettings {
    /// Tavily key for `web_search`. Without it the tool reports an error.
    pub search_api_key: Option<String>,
    pub command_timeout_secs: u64,
    pub max_output_bytes: usize,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            search_api_key: None,
            command_timeout_secs: shell::DEFAULT_TIMEOUT_SECS,
            max_output_bytes: shell::DEFAULT_MAX_OUTPUT_BYTES,
        }
    }
}
