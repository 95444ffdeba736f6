//! Content search tool — regex over files below the working directory.

use async_trait::async_trait;
use arka_core::error::ToolError;
use arka_core::schema::Schema;
use arka_core::tool::{Tool, ToolContext};
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::args::{self, Args};

/// Matches returned per call.
pub const MAX_MATCHES: usize = 200;

/// Bytes sniffed for NUL to detect binary files.
const BINARY_SNIFF_BYTES: usize = 8192;

const SKIPPED_DIRS: &[&str] = &["node_modules", ".git", "dist", "target"];

#[derive(Debug, Serialize, PartialEq)]
struct SearchMatch {
    file: String,
    line: usize,
    content: String,
}

struct Walker<'a> {
    root: &'a Path,
    base: &'a Path,
    regex: &'a Regex,
    pattern: Option<glob::Pattern>,
    matches: Vec<SearchMatch>,
}

impl Walker<'_> {
    fn walk(&mut self, dir: &Path) {
        if self.matches.len() >= MAX_MATCHES {
            return;
        }
        let Ok(entries) = fs::read_dir(dir) else {
            return;
        };
        let mut entries: Vec<_> = entries.filter_map(|e| e.ok()).collect();
        entries.sort_by_key(|e| e.file_name());

        for entry in entries {
            if self.matches.len() >= MAX_MATCHES {
                return;
            }
            let path = entry.path();
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            if file_type.is_dir() {
                let name = entry.file_name();
                if SKIPPED_DIRS.iter().any(|d| name == *d) {
                    continue;
                }
                self.walk(&path);
            } else if file_type.is_file() && self.included(&path) {
                self.search_file(&path);
            }
        }
    }

    fn included(&self, path: &Path) -> bool {
        let Some(pattern) = &self.pattern else {
            return true;
        };
        let relative = path.strip_prefix(self.base).unwrap_or(path);
        let options = glob::MatchOptions::new();
        pattern.matches_path_with(relative, options)
            || path
                .file_name()
                .is_some_and(|name| pattern.matches_with(&name.to_string_lossy(), options))
    }

    fn search_file(&mut self, path: &Path) {
        let Ok(bytes) = fs::read(path) else {
            return;
        };
        if bytes[..bytes.len().min(BINARY_SNIFF_BYTES)].contains(&0) {
            return;
        }
        let Ok(text) = String::from_utf8(bytes) else {
            return;
        };
        let file = path
            .strip_prefix(self.root)
            .unwrap_or(path)
            .display()
            .to_string();

        for (index, line) in text.lines().enumerate() {
            if self.matches.len() >= MAX_MATCHES {
                return;
            }
            if self.regex.is_match(line) {
                self.matches.push(SearchMatch {
                    file: file.clone(),
                    line: index + 1,
                    content: line.trim().to_string(),
                });
            }
        }
    }
}

fn search(
    root: PathBuf,
    base: PathBuf,
    regex: Regex,
    pattern: Option<glob::Pattern>,
) -> Vec<SearchMatch> {
    let mut walker = Walker {
        root: &root,
        base: &base,
        regex: &regex,
        pattern,
        matches: Vec::new(),
    };
    walker.walk(&base);
    walker.matches
}

pub struct SearchInFilesTool;

#[async_trait]
impl Tool for SearchInFilesTool {
    fn name(&self) -> &str {
        "search_in_files"
    }

    fn description(&self) -> &str {
        "Search file contents with a regular expression. Returns matching lines with \
         file paths and line numbers. Skips node_modules, .git, dist and target."
    }

    fn schema(&self) -> Schema {
        Schema::object()
            .field("query", Schema::string().describe("Regular expression to search for"))
            .optional(
                "path",
                Schema::string().describe("Directory to search in (defaults to '.')"),
            )
            .optional(
                "file_pattern",
                Schema::string().describe("Glob to filter files, e.g. '*.rs' or 'src/**/*.ts'"),
            )
            .optional(
                "case_sensitive",
                Schema::boolean().describe("Match case exactly (default false)"),
            )
    }

    async fn execute(&self, args: Args, ctx: &ToolContext) -> Result<Value, ToolError> {
        let query = args::required_str(&args, self.name(), "query")?;
        let base = args::resolve(ctx, args::optional_str(&args, "path").unwrap_or("."))?;
        let case_sensitive = args::optional_bool(&args, "case_sensitive").unwrap_or(false);

        let regex = RegexBuilder::new(query)
            .case_insensitive(!case_sensitive)
            .build()
            .map_err(|e| ToolError::InvalidArguments {
                tool: self.name().into(),
                reason: format!("invalid regex: {e}"),
            })?;

        let pattern = match args::optional_str(&args, "file_pattern") {
            Some(glob) => Some(glob::Pattern::new(glob).map_err(|e| {
                ToolError::InvalidArguments {
                    tool: self.name().into(),
                    reason: format!("invalid file_pattern: {e}"),
                }
            })?),
            None => None,
        };

        if !base.is_dir() {
            return Err(ToolError::failed(
                self.name(),
                format!("Search path does not exist: {}", base.display()),
            ));
        }

        debug!(query = %query, base = %base.display(), "Searching files");

        let root = ctx.cwd.clone();
        let matches = tokio::task::spawn_blocking(move || search(root, base, regex, pattern))
            .await
            .map_err(|e| ToolError::failed("search_in_files", format!("Search aborted: {e}")))?;

        serde_json::to_value(&matches)
            .map_err(|e| ToolError::failed(self.name(), format!("Failed to encode results: {e}")))
    }
}
