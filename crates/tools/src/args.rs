//! Argument helpers shared by the built-in tools.
//!
//! The registry validates arguments against the tool schema before
//! `execute` runs, so these only guard against schema drift.

use std::path::PathBuf;

use arka_core::error::ToolError;
use arka_core::tool::ToolContext;
use serde_json::{Map, Value};

pub(crate) type Args = Map<String, Value>;

/// A required string argument.
pub(crate) fn required_str<'a>(args: &'a Args, tool: &str, key: &str) -> Result<&'a str, ToolError> {
    args.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| ToolError::InvalidArguments {
            tool: tool.into(),
            reason: format!("missing required field '{key}'"),
        })
}

pub(crate) fn optional_str<'a>(args: &'a Args, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str)
}

pub(crate) fn optional_bool(args: &Args, key: &str) -> Option<bool> {
    args.get(key).and_then(Value::as_bool)
}

/// Resolve a path argument inside the session's working directory.
pub(crate) fn resolve(ctx: &ToolContext, path: &str) -> Result<PathBuf, ToolError> {
    arka_security::resolve_within(&ctx.cwd, path)
        .map_err(|e| ToolError::SafetyViolation(e.to_string()))
}
