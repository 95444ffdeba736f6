//! File write tools — overwrite, create and append with path confinement.

use async_trait::async_trait;
use arka_core::error::ToolError;
use arka_core::schema::Schema;
use arka_core::tool::{Approval, Tool, ToolContext};
use serde_json::Value;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::args::{self, Args};

async fn ensure_parent(tool: &str, path: &Path) -> Result<(), ToolError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| ToolError::failed(tool, format!("Failed to create directory: {e}")))?;
    }
    Ok(())
}

/// Overwrite (or create) a file. Requires approval.
pub struct WriteFileTool;

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Write content to a file, replacing it if it exists. Parent directories are created."
    }

    fn schema(&self) -> Schema {
        Schema::object()
            .field("path", Schema::string().describe("Path of the file to write"))
            .field("content", Schema::string().describe("The full new content"))
    }

    fn approval(&self) -> Approval {
        Approval::Always
    }

    async fn execute(&self, args: Args, ctx: &ToolContext) -> Result<Value, ToolError> {
        let path = args::required_str(&args, self.name(), "path")?;
        let content = args::required_str(&args, self.name(), "content")?;
        let resolved = args::resolve(ctx, path)?;

        debug!(path = %resolved.display(), bytes = content.len(), "Writing file");

        ensure_parent(self.name(), &resolved).await?;
        tokio::fs::write(&resolved, content)
            .await
            .map_err(|e| ToolError::failed(self.name(), format!("Failed to write {path}: {e}")))?;

        Ok(Value::String(format!("Successfully wrote to {path}")))
    }
}

/// Create a new file. Fails if the file already exists.
pub struct CreateFileTool;

#[async_trait]
impl Tool for CreateFileTool {
    fn name(&self) -> &str {
        "create_file"
    }

    fn description(&self) -> &str {
        "Create a new file with optional initial content. Fails if the file already exists."
    }

    fn schema(&self) -> Schema {
        Schema::object()
            .field("path", Schema::string().describe("Path of the file to create"))
            .optional("content", Schema::string().describe("Initial content"))
    }

    async fn execute(&self, args: Args, ctx: &ToolContext) -> Result<Value, ToolError> {
        let path = args::required_str(&args, self.name(), "path")?;
        let content = args::optional_str(&args, "content").unwrap_or_default();
        let resolved = args::resolve(ctx, path)?;

        ensure_parent(self.name(), &resolved).await?;
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&resolved)
            .await
            .map_err(|e| ToolError::failed(self.name(), format!("Failed to create {path}: {e}")))?;
        file.write_all(content.as_bytes())
            .await
            .map_err(|e| ToolError::failed(self.name(), format!("Failed to write {path}: {e}")))?;

        Ok(Value::String(format!("Created {path}")))
    }
}

/// Append to a file, creating it if needed.
pub struct AppendFileTool;

#[async_trait]
impl Tool for AppendFileTool {
    fn name(&self) -> &str {
        "append_file"
    }

    fn description(&self) -> &str {
        "Append content to the end of a file, creating it if it does not exist."
    }

    fn schema(&self) -> Schema {
        Schema::object()
            .field("path", Schema::string().describe("Path of the file to append to"))
            .field("content", Schema::string().describe("Content to append"))
    }

    async fn execute(&self, args: Args, ctx: &ToolContext) -> Result<Value, ToolError> {
        let path = args::required_str(&args, self.name(), "path")?;
        let content = args::required_str(&args, self.name(), "content")?;
        let resolved = args::resolve(ctx, path)?;

        ensure_parent(self.name(), &resolved).await?;
        let mut file = tokio::fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(&resolved)
            .await
            .map_err(|e| ToolError::failed(self.name(), format!("Failed to open {path}: {e}")))?;
        file.write_all(content.as_bytes())
            .await
            .map_err(|e| ToolError::failed(self.name(), format!("Failed to append to {path}: {e}")))?;

        Ok(Value::String(format!("Appended {} bytes to {path}", content.len())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: Value) -> Args {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn write_requires_approval() {
        assert!(WriteFileTool.approval().required(&Args::new()));
        assert!(!CreateFileTool.approval().required(&Args::new()));
        assert!(!AppendFileTool.approval().required(&Args::new()));
    }

    #[tokio::test]
    async fn write_creates_parent_dirs_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ToolContext::new(dir.path());
        let target = dir.path().join("nested/dir/file.txt");
        std::fs::create_dir_all(target.parent().unwrap()).unwrap();
        std::fs::write(&target, "old content").unwrap();

        let result = WriteFileTool
            .execute(
                args(json!({"path": "nested/dir/file.txt", "content": "new content"})),
                &ctx,
            )
            .await
            .unwrap();

        assert_eq!(result, "Successfully wrote to nested/dir/file.txt");
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "new content");
    }

    #[tokio::test]
    async fn write_escape_leaves_no_file() {
        let root = tempfile::tempdir().unwrap();
        let project = root.path().join("project");
        std::fs::create_dir(&project).unwrap();
        let ctx = ToolContext::new(&project);

        let err = WriteFileTool
            .execute(args(json!({"path": "../escaped.txt", "content": "x"})), &ctx)
            .await
            .unwrap_err();

        assert!(matches!(err, ToolError::SafetyViolation(_)));
        assert!(!root.path().join("escaped.txt").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn append_through_dangling_link_is_refused() {
        let outside = tempfile::tempdir().unwrap();
        let project = tempfile::tempdir().unwrap();
        let target = outside.path().join("pwned.txt");
        std::os::unix::fs::symlink(&target, project.path().join("link")).unwrap();
        let ctx = ToolContext::new(project.path());

        let err = AppendFileTool
            .execute(args(json!({"path": "link", "content": "x"})), &ctx)
            .await
            .unwrap_err();

        assert!(matches!(err, ToolError::SafetyViolation(_)));
        assert!(!target.exists());
    }

    #[tokio::test]
    async fn create_refuses_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ToolContext::new(dir.path());
        CreateFileTool
            .execute(args(json!({"path": "a.txt", "content": "first"})), &ctx)
            .await
            .unwrap();

        let err = CreateFileTool
            .execute(args(json!({"path": "a.txt"})), &ctx)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to create a.txt"));
        assert_eq!(std::fs::read_to_string(dir.path().join("a.txt")).unwrap(), "first");
    }

    #[tokio::test]
    async fn append_accumulates() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ToolContext::new(dir.path());
        for part in ["one\n", "two\n"] {
            AppendFileTool
                .execute(args(json!({"path": "log.txt", "content": part})), &ctx)
                .await
                .unwrap();
        }
        assert_eq!(
            std::fs::read_to_string(dir.path().join("log.txt")).unwrap(),
            "one\ntwo\n"
        );
    }
}
