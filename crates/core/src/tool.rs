//! Tool trait — the abstraction over agent capabilities.
//!
//! Tools are what give the agent the ability to act in the world:
//! read and write files, run shell commands, search the web, etc.

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::ToolError;
use crate::provider::ProviderKind;
use crate::schema::Schema;

/// Whether a tool call needs human confirmation before it runs.
#[derive(Clone, Copy)]
pub enum Approval {
    Never,
    Always,
    /// Decided per call from the arguments.
    When(fn(&Map<String, Value>) -> bool),
}

impl Approval {
    pub fn required(&self, args: &Map<String, Value>) -> bool {
        match self {
            Approval::Never => false,
            Approval::Always => true,
            Approval::When(predicate) => predicate(args),
        }
    }
}

impl std::fmt::Debug for Approval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Approval::Never => f.write_str("Never"),
            Approval::Always => f.write_str("Always"),
            Approval::When(_) => f.write_str("When(..)"),
        }
    }
}

/// Everything a tool may know about the session it runs in.
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Working directory; every path argument is confined to it
    pub cwd: PathBuf,
}

impl ToolContext {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self { cwd: cwd.into() }
    }
}

/// The core Tool trait.
///
/// Each tool (read_file, execute_command, web_search, etc.) implements this
/// trait. Tools are registered in the ToolRegistry and made available to the
/// agent loop.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "read_file").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the LLM).
    fn description(&self) -> &str;

    /// Shape of the arguments this tool accepts.
    fn schema(&self) -> Schema;

    /// Approval policy. Defaults to never asking.
    fn approval(&self) -> Approval {
        Approval::Never
    }

    /// Execute the tool with already-validated arguments.
    async fn execute(
        &self,
        args: Map<String, Value>,
        ctx: &ToolContext,
    ) -> std::result::Result<Value, ToolError>;

    /// Convert this tool into the declaration format of a vendor.
    fn declaration(&self, kind: ProviderKind) -> Value {
        let parameters = self.schema().to_json_schema();
        match kind {
            ProviderKind::OpenAi => json!({
                "type": "function",
                "function": {
                    "name": self.name(),
                    "description": self.description(),
                    "parameters": parameters,
                }
            }),
            ProviderKind::Gemini => json!({
                "name": self.name(),
                "description": self.description(),
                "parameters": parameters,
            }),
            ProviderKind::Claude => json!({
                "name": self.name(),
                "description": self.description(),
                "input_schema": parameters,
            }),
        }
    }
}

/// A registry of available tools.
///
/// The agent loop uses this to:
/// 1. Get tool declarations to send to the LLM
/// 2. Decide whether a call needs approval
/// 3. Look up, validate and execute tools when the LLM requests them
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools.insert(name, tool);
    }

    /// Register several tools at once.
    pub fn register_all(&mut self, tools: impl IntoIterator<Item = Box<dyn Tool>>) {
        for tool in tools {
            self.register(tool);
        }
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// All registered tool names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Tool declarations in the format the given vendor expects.
    ///
    /// Gemini wraps every declaration in a single `function_declarations`
    /// entry; the others list one entry per tool.
    pub fn list_for_provider(&self, kind: ProviderKind) -> Vec<Value> {
        let declarations: Vec<Value> = self
            .names()
            .into_iter()
            .filter_map(|name| self.get(name))
            .map(|tool| tool.declaration(kind))
            .collect();

        match kind {
            ProviderKind::Gemini if declarations.is_empty() => Vec::new(),
            ProviderKind::Gemini => vec![json!({ "function_declarations": declarations })],
            _ => declarations,
        }
    }

    /// Whether a call to `name` must be confirmed first. Unknown tools never
    /// need approval; their execution fails on its own.
    pub fn needs_approval(&self, name: &str, args: &Map<String, Value>) -> bool {
        self.get(name)
            .is_some_and(|tool| tool.approval().required(args))
    }

    /// Validate and execute a tool call, stringifying non-text results.
    pub async fn execute(
        &self,
        name: &str,
        args: Map<String, Value>,
        ctx: &ToolContext,
    ) -> std::result::Result<String, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;

        tool.schema()
            .validate_args(&args)
            .map_err(|reason| ToolError::InvalidArguments {
                tool: name.to_string(),
                reason,
            })?;

        let output = tool.execute(args, ctx).await?;
        Ok(match output {
            Value::String(text) => text,
            other => other.to_string(),
        })
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
