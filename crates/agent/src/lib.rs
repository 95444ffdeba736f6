//! The core agent loop — the heart of Arka.
//!
//! The agent follows a **Plan → Act → Observe** cycle:
//!
//! 1. **Receive** a user query
//! 2. **Build context** (system prompt from cwd, mode and memory + the query)
//! 3. **Send to LLM** via the configured provider, with the tool declarations
//! 4. **If tool calls**: approve, execute, append results, loop back to step 3
//! 5. **If text response**: stream it to the caller and save the turn
//!
//! The loop talks to the outside world only through [`AgentEvent`]s. When it
//! spends its step budget it asks, through the same channel, whether to go on.

pub mod analyzer;
pub mod event;
pub mod loop_runner;
pub mod preview;
pub mod prompt;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use analyzer::MemoryAnalyzer;
pub use event::{AgentEvent, ApprovalPrompt, ApprovalRequest};
pub use loop_runner::{AgentError, AgentLoop, DEFAULT_MAX_STEPS, DENIED_MESSAGE, Outcome, STOPPED_MESSAGE};
pub use preview::{arg_preview, tool_label};
pub use prompt::{PromptContext, build_system_prompt};
