//! In-memory store — useful for testing and ephemeral sessions.

use async_trait::async_trait;
use arka_core::error::MemoryError;
use arka_core::memory::{MemoryGateway, Turn};
use tokio::sync::RwLock;

/// Keeps both stores in process memory. Nothing survives a restart.
#[derive(Default)]
pub struct InMemoryStore {
    short_term: RwLock<Vec<Turn>>,
    long_term: RwLock<Vec<String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed long-term preferences, e.g. for prompt tests.
    pub fn with_preferences<I, S>(preferences: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            short_term: RwLock::default(),
            long_term: RwLock::new(preferences.into_iter().map(Into::into).collect()),
        }
    }
}

#[async_trait]
impl MemoryGateway for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn load_short_term(&self) -> Vec<Turn> {
        self.short_term.read().await.clone()
    }

    async fn load_long_term(&self) -> Vec<String> {
        self.long_term.read().await.clone()
    }

    async fn save_short_term(&self, turns: Vec<Turn>) -> Result<(), MemoryError> {
        self.short_term.write().await.extend(turns);
        Ok(())
    }

    async fn save_long_term(&self, preference: String) -> Result<(), MemoryError> {
        self.long_term.write().await.push(preference);
        Ok(())
    }

    async fn clear_short_term(&self) -> Result<(), MemoryError> {
        self.short_term.write().await.clear();
        Ok(())
    }
}
