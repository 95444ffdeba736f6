//! Memory stores for Arka.
//!
//! - [`FileMemoryStore`]: two JSON files under `~/.arka/memory`
//! - [`InMemoryStore`]: process-local, for tests and throwaway sessions

pub mod file_store;
pub mod in_memory;

pub use file_store::FileMemoryStore;
pub use in_memory::InMemoryStore;
