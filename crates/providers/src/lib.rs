//! LLM provider implementations for Arka.
//!
//! All providers implement the `arka_core::Provider` trait.
//! The factory selects the correct adapter from a [`ProviderKind`].
//!
//! [`ProviderKind`]: arka_core::ProviderKind

pub mod anthropic;
pub mod factory;
pub mod gemini;
mod http;
pub mod openai;
pub mod sse;

pub use anthropic::ClaudeProvider;
pub use factory::{create_cheap_provider, create_provider};
pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;
pub use sse::{SseLine, SseLineBuffer};
