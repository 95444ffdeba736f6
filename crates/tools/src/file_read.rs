//! File read tool — read text files inside the working directory.

use async_trait::async_trait;
use arka_core::error::ToolError;
use arka_core::schema::Schema;
use arka_core::tool::{Tool, ToolContext};
use serde_json::Value;
use tracing::debug;

use crate::args::{self, Args};

pub struct ReadFileTool;

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read the full text content of a file. Paths are relative to the working directory."
    }

    fn schema(&self) -> Schema {
        Schema::object().field("path", Schema::string().describe("Path of the file to read"))
    }

    async fn execute(&self, args: Args, ctx: &ToolContext) -> Result<Value, ToolError> {
        let path = args::required_str(&args, self.name(), "path")?;
        let resolved = args::resolve(ctx, path)?;

        debug!(path = %resolved.display(), "Reading file");

        let content = tokio::fs::read_to_string(&resolved)
            .await
            .map_err(|e| ToolError::failed(self.name(), format!("Failed to read {path}: {e}")))?;

        Ok(Value::String(content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: Value) -> Args {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn read_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("test.txt"), "Hello, World!").unwrap();

        let ctx = ToolContext::new(dir.path());
        let result = ReadFileTool
            .execute(args(json!({"path": "test.txt"})), &ctx)
            .await
            .unwrap();
        assert_eq!(result, "Hello, World!");
    }

    #[tokio::test]
    async fn read_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ToolContext::new(dir.path());
        let err = ReadFileTool
            .execute(args(json!({"path": "nope.txt"})), &ctx)
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("Failed to read nope.txt"));
    }

    #[tokio::test]
    async fn read_outside_cwd_is_safety_violation() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ToolContext::new(dir.path().join("project"));
        let err = ReadFileTool
            .execute(args(json!({"path": "../../etc/passwd"})), &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::SafetyViolation(_)));
    }
}
