//! Agent modes and the tool set each one exposes.

use std::fmt;
use std::str::FromStr;

use arka_core::tool::{Tool, ToolRegistry};
use serde::{Deserialize, Serialize};

use crate::ToolSettings;
use crate::file_ops::{CopyFileTool, CurrentLocTool, DeleteTool, MakeDirTool, MoveFileTool};
use crate::file_read::ReadFileTool;
use crate::file_write::{AppendFileTool, CreateFileTool, WriteFileTool};
use crate::http_request::HttpRequestTool;
use crate::search::SearchInFilesTool;
use crate::shell::ExecuteCommandTool;
use crate::web_search::WebSearchTool;

/// How much of the tool catalogue the agent may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentMode {
    /// Conversation plus web search.
    Chat,
    /// Read-only exploration of the project.
    Plan,
    /// Every tool, including writes and shell commands.
    #[default]
    Build,
}

impl AgentMode {
    pub const ALL: [AgentMode; 3] = [AgentMode::Chat, AgentMode::Plan, AgentMode::Build];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentMode::Chat => "chat",
            AgentMode::Plan => "plan",
            AgentMode::Build => "build",
        }
    }

    /// Names of the tools available in this mode.
    pub fn tool_names(&self) -> &'static [&'static str] {
        match self {
            AgentMode::Chat => &["web_search"],
            AgentMode::Plan => &["web_search", "read_file", "search_in_files", "current_loc"],
            AgentMode::Build => &[
                "read_file",
                "write_file",
                "create_file",
                "append_file",
                "make_dir",
                "current_loc",
                "delete_file_dir",
                "move_file",
                "copy_file",
                "execute_command",
                "search_in_files",
                "web_search",
                "http_request",
            ],
        }
    }
}

impl fmt::Display for AgentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chat" => Ok(AgentMode::Chat),
            "plan" => Ok(AgentMode::Plan),
            "build" => Ok(AgentMode::Build),
            other => Err(format!("unknown mode '{other}' (expected chat, plan or build)")),
        }
    }
}

/// Every built-in tool, configured from `settings`.
pub fn all_tools(settings: &ToolSettings) -> Vec<Box<dyn Tool>> {
    vec![
        Box::new(ReadFileTool),
        Box::new(WriteFileTool),
        Box::new(CreateFileTool),
        Box::new(AppendFileTool),
        Box::new(MakeDirTool),
        Box::new(CurrentLocTool),
        Box::new(DeleteTool),
        Box::new(MoveFileTool),
        Box::new(CopyFileTool),
        Box::new(ExecuteCommandTool::new(
            settings.command_timeout_secs,
            settings.max_output_bytes,
        )),
        Box::new(SearchInFilesTool),
        Box::new(WebSearchTool::new(settings.search_api_key.clone())),
        Box::new(HttpRequestTool::new()),
    ]
}

/// Build the registry for `mode`.
pub fn registry_for_mode(mode: AgentMode, settings: &ToolSettings) -> ToolRegistry {
    let allowed = mode.tool_names();
    let mut registry = ToolRegistry::new();
    for tool in all_tools(settings) {
        if allowed.iter().any(|name| *name == tool.name()) {
            registry.register(tool);
        }
    }
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_parsing() {
        assert_eq!("Plan".parse::<AgentMode>().unwrap(), AgentMode::Plan);
        assert_eq!(" chat ".parse::<AgentMode>().unwrap(), AgentMode::Chat);
        assert!("yolo".parse::<AgentMode>().is_err());
        assert_eq!(AgentMode::default(), AgentMode::Build);
        assert_eq!(AgentMode::Build.to_string(), "build");
    }

    #[test]
    fn chat_mode_only_searches() {
        let registry = registry_for_mode(AgentMode::Chat, &ToolSettings::default());
        assert_eq!(registry.names(), vec!["web_search"]);
    }

    #[test]
    fn plan_mode_is_read_only() {
        let registry = registry_for_mode(AgentMode::Plan, &ToolSettings::default());
        assert_eq!(
            registry.names(),
            vec!["current_loc", "read_file", "search_in_files", "web_search"]
        );
        assert!(registry.get("write_file").is_none());
        assert!(registry.get("execute_command").is_none());
    }

    #[test]
    fn build_mode_has_everything() {
        let settings = ToolSettings::default();
        let registry = registry_for_mode(AgentMode::Build, &settings);
        assert_eq!(registry.len(), all_tools(&settings).len());
        assert_eq!(registry.len(), AgentMode::Build.tool_names().len());
    }
}
