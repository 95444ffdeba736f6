//! Memory gateway trait — durable context across queries.
//!
//! Two independent stores:
//! - short-term: the recent conversation turns, surfaced into the next prompt
//! - long-term: preference strings extracted from what the user says
//!
//! Loads never fail (a missing or corrupt store reads as empty). Saves report
//! errors, but callers treat memory as best-effort and only log them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::MemoryError;
use crate::message::Role;

/// How many short-term turns are surfaced into a prompt.
pub const RECENT_TURNS: usize = 5;

/// One remembered conversation turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// The load/save contract every memory store implements.
#[async_trait]
pub trait MemoryGateway: Send + Sync {
    /// A human-readable name for this store.
    fn name(&self) -> &str;

    /// All stored short-term turns, oldest first.
    async fn load_short_term(&self) -> Vec<Turn>;

    /// All stored preference strings.
    async fn load_long_term(&self) -> Vec<String>;

    /// Append turns to the stored sequence.
    async fn save_short_term(&self, turns: Vec<Turn>) -> std::result::Result<(), MemoryError>;

    /// Append one preference. No deduplication.
    async fn save_long_term(&self, preference: String) -> std::result::Result<(), MemoryError>;

    /// Forget the short-term turns.
    async fn clear_short_term(&self) -> std::result::Result<(), MemoryError>;
}

/// The last [`RECENT_TURNS`] turns of a loaded sequence.
pub fn recent(turns: &[Turn]) -> &[Turn] {
    &turns[turns.len().saturating_sub(RECENT_TURNS)..]
}
