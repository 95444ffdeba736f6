//! Provider factory — builds the configured vendor adapter.

use std::sync::Arc;

use arka_core::provider::{Provider, ProviderKind};
use tracing::debug;

use crate::anthropic::ClaudeProvider;
use crate::gemini::GeminiProvider;
use crate::openai::OpenAiProvider;

/// Build the adapter for `kind`. The agent only ever sees the trait object.
pub fn create_provider(
    kind: ProviderKind,
    api_key: impl Into<String>,
    model: impl Into<String>,
) -> Arc<dyn Provider> {
    let api_key = api_key.into();
    let model = model.into();
    debug!(provider = %kind, model = %model, "Creating provider");

    match kind {
        ProviderKind::OpenAi => Arc::new(OpenAiProvider::new(api_key, model)),
        ProviderKind::Gemini => Arc::new(GeminiProvider::new(api_key, model)),
        ProviderKind::Claude => Arc::new(ClaudeProvider::new(api_key, model)),
    }
}

/// Same vendor and key, but the inexpensive model used for background
/// classification passes.
pub fn create_cheap_provider(kind: ProviderKind, api_key: impl Into<String>) -> Arc<dyn Provider> {
    create_provider(kind, api_key, kind.cheap_model())
}
