//! File-based memory store — two pretty-printed JSON arrays on disk.
//!
//! Storage location: `~/.arka/memory/`
//! - `short_term.json`: `[{"role": "user", "content": "..."}, ...]`
//! - `long_term.json`: `["prefers tabs", ...]`
//!
//! Every save is a read-modify-write of the whole file. There is no locking,
//! so two concurrent processes are last-writer-wins.

use async_trait::async_trait;
use arka_core::error::MemoryError;
use arka_core::memory::{MemoryGateway, Turn};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const SHORT_TERM_FILE: &str = "short_term.json";
pub const LONG_TERM_FILE: &str = "long_term.json";

pub struct FileMemoryStore {
    dir: PathBuf,
}

impl FileMemoryStore {
    /// Create a store rooted at `dir`. Nothing is touched until the first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn short_term_path(&self) -> PathBuf {
        self.dir.join(SHORT_TERM_FILE)
    }

    fn long_term_path(&self) -> PathBuf {
        self.dir.join(LONG_TERM_FILE)
    }
}

/// Read a JSON array, treating a missing or corrupt file as empty.
async fn load_array<T: DeserializeOwned>(path: &Path) -> Vec<T> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read memory file");
            return Vec::new();
        }
    };
    if content.trim().is_empty() {
        return Vec::new();
    }
    match serde_json::from_str(&content) {
        Ok(items) => items,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Ignoring corrupted memory file");
            Vec::new()
        }
    }
}

async fn write_array<T: Serialize>(path: &Path, items: &[T]) -> Result<(), MemoryError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(|e| {
            MemoryError::Storage(format!("Failed to create memory directory: {e}"))
        })?;
    }
    let content = serde_json::to_string_pretty(items)
        .map_err(|e| MemoryError::Serialization(e.to_string()))?;
    tokio::fs::write(path, content)
        .await
        .map_err(|e| MemoryError::Storage(format!("Failed to write {}: {e}", path.display())))
}

#[async_trait]
impl MemoryGateway for FileMemoryStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn load_short_term(&self) -> Vec<Turn> {
        load_array(&self.short_term_path()).await
    }

    async fn load_long_term(&self) -> Vec<String> {
        load_array(&self.long_term_path()).await
    }

    async fn save_short_term(&self, turns: Vec<Turn>) -> Result<(), MemoryError> {
        let path = self.short_term_path();
        let mut stored: Vec<Turn> = load_array(&path).await;
        stored.extend(turns);
        debug!(count = stored.len(), "Saving short-term memory");
        write_array(&path, &stored).await
    }

    async fn save_long_term(&self, preference: String) -> Result<(), MemoryError> {
        let path = self.long_term_path();
        let mut stored: Vec<String> = load_array(&path).await;
        stored.push(preference);
        debug!(count = stored.len(), "Saving long-term memory");
        write_array(&path, &stored).await
    }

    async fn clear_short_term(&self) -> Result<(), MemoryError> {
        match tokio::fs::remove_file(self.short_term_path()).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(MemoryError::Storage(format!(
                "Failed to clear short-term memory: {e}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_files_load_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileMemoryStore::new(dir.path().join("memory"));
        assert!(store.load_short_term().await.is_empty());
        assert!(store.load_long_term().await.is_empty());
    }

    #[tokio::test]
    async fn short_term_appends_across_saves() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileMemoryStore::new(dir.path().join("memory"));

        store
            .save_short_term(vec![Turn::user("What's 2+2"), Turn::assistant("4")])
            .await
            .unwrap();
        store
            .save_short_term(vec![Turn::user("And 3+3?"), Turn::assistant("6")])
            .await
            .unwrap();

        let turns = store.load_short_term().await;
        assert_eq!(turns.len(), 4);
        assert_eq!(turns[0], Turn::user("What's 2+2"));
        assert_eq!(turns[3], Turn::assistant("6"));
    }

    #[tokio::test]
    async fn file_format_is_a_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileMemoryStore::new(dir.path());
        store
            .save_short_term(vec![Turn::user("hi")])
            .await
            .unwrap();
        store.save_long_term("prefers tabs".into()).await.unwrap();

        let raw = std::fs::read_to_string(dir.path().join(SHORT_TERM_FILE)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value, serde_json::json!([{"role": "user", "content": "hi"}]));

        let raw = std::fs::read_to_string(dir.path().join(LONG_TERM_FILE)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value, serde_json::json!(["prefers tabs"]));
    }

    #[tokio::test]
    async fn long_term_keeps_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileMemoryStore::new(dir.path());
        store.save_long_term("likes rust".into()).await.unwrap();
        store.save_long_term("likes rust".into()).await.unwrap();
        assert_eq!(store.load_long_term().await, vec!["likes rust", "likes rust"]);
    }

    #[tokio::test]
    async fn corrupt_file_reads_empty_and_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SHORT_TERM_FILE), "{not json").unwrap();
        let store = FileMemoryStore::new(dir.path());

        assert!(store.load_short_term().await.is_empty());
        store.save_short_term(vec![Turn::user("fresh")]).await.unwrap();
        assert_eq!(store.load_short_term().await, vec![Turn::user("fresh")]);
    }

    #[tokio::test]
    async fn clear_short_term_leaves_long_term() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileMemoryStore::new(dir.path());
        store.save_short_term(vec![Turn::user("hi")]).await.unwrap();
        store.save_long_term("uses vim".into()).await.unwrap();

        store.clear_short_term().await.unwrap();
        store.clear_short_term().await.unwrap();

        assert!(store.load_short_term().await.is_empty());
        assert_eq!(store.load_long_term().await, vec!["uses vim"]);
    }
}
