//! # Arka Core
//!
//! Domain types, traits, and error definitions for the Arka terminal agent.
//! This crate has **no I/O of its own** — it defines the domain model
//! that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every subsystem is defined as a trait here. Implementations live in their
//! respective crates. This enables:
//! - Swapping vendor adapters via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod memory;
pub mod message;
pub mod provider;
pub mod schema;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, MemoryError, ProviderError, Result, ToolError};
pub use memory::{MemoryGateway, Turn};
pub use message::{Message, Role, ToolCall, Transcript};
pub use provider::{
    InvokeOptions, Provider, ProviderKind, ProviderResponse, StreamChunk, StreamReceiver,
    ToolChoice,
};
pub use schema::Schema;
pub use tool::{Approval, Tool, ToolContext, ToolRegistry};
