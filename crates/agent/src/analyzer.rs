//! Memory analyzer — spots user preferences worth keeping.
//!
//! Runs once per query in the background on a cheap model. It is strictly
//! best-effort: every failure is logged at debug level and dropped.

use std::sync::Arc;

use arka_core::memory::MemoryGateway;
use arka_core::message::Message;
use arka_core::provider::{InvokeOptions, Provider};
use serde::Deserialize;
use tokio::task::JoinHandle;
use tracing::debug;

const EXTRACTION_PROMPT: &str = "\
You are a memory extraction system. Decide whether the user's message states a \
personal fact or preference that should be remembered for future conversations.

Remember things like:
- \"My name is John\" -> \"User's name is John\"
- \"I prefer using pnpm\" -> \"User prefers pnpm as package manager\"
- \"I like dark themes\" -> \"User prefers dark themes\"

Do not remember questions or one-off requests such as \"How do I create a React app?\" \
or \"Fix this bug\".

Respond with JSON only: {\"found\": boolean, \"preference\": \"string or empty\"}";

#[derive(Debug, Deserialize, PartialEq)]
struct Extraction {
    #[serde(default)]
    found: bool,
    #[serde(default)]
    preference: String,
}

/// The slice from the first `{` to the last `}`, if any.
fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Parse a classification reply into a preference worth saving.
fn parse_preference(reply: &str) -> Option<String> {
    let json = extract_json(reply)?;
    let extraction: Extraction = match serde_json::from_str(json) {
        Ok(e) => e,
        Err(e) => {
            debug!(error = %e, "Memory analyzer reply was not valid JSON");
            return None;
        }
    };
    let preference = extraction.preference.trim();
    (extraction.found && !preference.is_empty()).then(|| preference.to_string())
}

#[derive(Clone)]
pub struct MemoryAnalyzer {
    provider: Arc<dyn Provider>,
    memory: Arc<dyn MemoryGateway>,
}

impl MemoryAnalyzer {
    pub fn new(provider: Arc<dyn Provider>, memory: Arc<dyn MemoryGateway>) -> Self {
        Self { provider, memory }
    }

    /// Classify `query` and save a long-term preference if one was found.
    pub async fn analyze(&self, query: &str) {
        let messages = [Message::system(EXTRACTION_PROMPT), Message::user(query)];
        let response = match self
            .provider
            .invoke(&messages, &InvokeOptions::default())
            .await
        {
            Ok(r) => r,
            Err(e) => {
                debug!(provider = self.provider.name(), error = %e, "Memory analyzer call failed");
                return;
            }
        };

        let Some(preference) = parse_preference(&response.content) else {
            return;
        };
        match self.memory.save_long_term(preference.clone()).await {
            Ok(()) => debug!(preference = %preference, "Saved preference to long-term memory"),
            Err(e) => debug!(error = %e, "Failed to save preference"),
        }
    }

    /// Fire-and-forget [`analyze`](Self::analyze) on the runtime.
    pub fn spawn(&self, query: String) -> JoinHandle<()> {
        let analyzer = self.clone();
        tokio::spawn(async move { analyzer.analyze(&query).await })
    }
}
