//! Filesystem sandboxing for Arka tools.
//!
//! Every path a tool touches is resolved against the session's working
//! directory and rejected before any filesystem effect if it escapes it.

pub mod path;

pub use path::{PathValidationError, resolve_within};
