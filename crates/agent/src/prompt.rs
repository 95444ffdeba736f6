//! System prompt assembly.

use std::fmt::Write;
use std::path::Path;

use arka_core::memory::{Turn, recent};
use arka_tools::AgentMode;
use tracing::warn;

/// Everything the system prompt is built from.
#[derive(Debug, Clone)]
pub struct PromptContext<'a> {
    pub cwd: &'a Path,
    /// Already formatted, e.g. `2026-10-19`
    pub date: String,
    pub mode: AgentMode,
    pub preferences: &'a [String],
    /// The full short-term store; only the recent tail is used.
    pub short_term: &'a [Turn],
}

const PERSONA: &str = "You are Arka, a sharp and friendly software engineering partner working \
inside the user's terminal. Be conversational and direct, and match the user's energy.";

const RULES: &str = "\
## Ground Rules

- Respond only to what the user explicitly asks. Do not invent requirements or add unrequested features.
- If something is ambiguous, ask a short clarifying question instead of guessing.
- Read before you edit: inspect a file with read_file before rewriting it.
- Use non-interactive flags (--yes, -y) for every shell command.
- Check each tool result before taking the next step. If a tool fails, explain what went wrong and offer an alternative.
- Respect the project's existing setup: look at lock files and manifests before choosing a package manager or tool.
- Use at most a handful of web searches per answer, and include the current date for time-sensitive queries.
- Paths are relative to the working directory. You cannot touch files outside it.
- Ask before deleting anything the user did not explicitly name.

## Tool Quick Reference

- Casual chat: no tools
- Current information: web_search
- Inspect code: search_in_files, then read_file
- Change a file: read_file, then write_file
- New project: web_search, execute_command, make_dir, write_file
- External API: http_request";

fn mode_description(mode: AgentMode) -> &'static str {
    match mode {
        AgentMode::Chat => "chat (conversation and web search only; no file or shell access)",
        AgentMode::Plan => "plan (read-only: explore the project and propose changes, do not make them)",
        AgentMode::Build => "build (full access: read, write and run commands)",
    }
}

/// Render the system prompt for one query.
pub fn build_system_prompt(ctx: &PromptContext<'_>) -> String {
    let mut out = String::new();
    out.push_str(PERSONA);
    out.push_str("\n\n## Environment Context\n\n");
    let _ = writeln!(out, "- Working Directory: {}", ctx.cwd.display());
    let _ = writeln!(out, "- Current Date: {}", ctx.date);
    let _ = writeln!(out, "- Mode: {}", mode_description(ctx.mode));

    if !ctx.preferences.is_empty() {
        out.push_str("\n## User Preferences\n\n");
        for preference in ctx.preferences {
            let _ = writeln!(out, "- {preference}");
        }
    }

    let turns = recent(ctx.short_term);
    if !turns.is_empty() {
        match serde_json::to_string_pretty(turns) {
            Ok(json) => {
                out.push_str("\n## Recent Context\n\n");
                out.push_str(&json);
                out.push('\n');
            }
            Err(e) => warn!(error = %e, "Failed to render recent context"),
        }
    }

    out.push('\n');
    out.push_str(RULES);
    out.push('\n');
    out
}
