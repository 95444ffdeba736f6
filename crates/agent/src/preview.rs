//! Human-readable status for a tool dispatch.

use serde_json::{Map, Value};

/// Argument keys checked, in order, for the preview text.
const PREVIEW_KEYS: [&str; 5] = ["query", "path", "command", "url", "filename"];
const PREVIEW_CHARS: usize = 40;

/// Verb phrase shown while a tool runs.
pub fn tool_label(name: &str) -> String {
    let label = match name {
        "read_file" => "Reading file",
        "write_file" => "Writing file",
        "create_file" => "Creating file",
        "append_file" => "Appending to file",
        "make_dir" => "Creating directory",
        "current_loc" => "Checking current directory",
        "delete_file_dir" => "Deleting",
        "move_file" => "Moving file",
        "copy_file" => "Copying file",
        "execute_command" => "Running command",
        "search_in_files" => "Searching files",
        "web_search" => "Searching the web",
        "http_request" => "Sending HTTP request",
        other => return format!("Running {other}"),
    };
    label.to_string()
}

/// `": "` plus up to 40 characters of the most telling argument, or empty.
pub fn arg_preview(args: &Map<String, Value>) -> String {
    let Some(value) = PREVIEW_KEYS.iter().find_map(|key| match args.get(*key) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.is_empty() => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
    }) else {
        return String::new();
    };

    if value.chars().count() > PREVIEW_CHARS {
        let head: String = value.chars().take(PREVIEW_CHARS).collect();
        format!(": {head}...")
    } else {
        format!(": {value}")
    }
}
