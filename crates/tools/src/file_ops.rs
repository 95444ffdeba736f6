//! Filesystem housekeeping tools: directories, deletes, moves and copies.

use async_trait::async_trait;
use arka_core::error::ToolError;
use arka_core::schema::Schema;
use arka_core::tool::{Approval, Tool, ToolContext};
use serde_json::Value;
use tracing::debug;

use crate::args::{self, Args};

pub struct MakeDirTool;

#[async_trait]
impl Tool for MakeDirTool {
    fn name(&self) -> &str {
        "make_dir"
    }

    fn description(&self) -> &str {
        "Create a directory, including any missing parent directories."
    }

    fn schema(&self) -> Schema {
        Schema::object().field("path", Schema::string().describe("Directory path to create"))
    }

    async fn execute(&self, args: Args, ctx: &ToolContext) -> Result<Value, ToolError> {
        let path = args::required_str(&args, self.name(), "path")?;
        let resolved = args::resolve(ctx, path)?;

        tokio::fs::create_dir_all(&resolved)
            .await
            .map_err(|e| ToolError::failed(self.name(), format!("Failed to create {path}: {e}")))?;

        Ok(Value::String(format!("Directory created at: {}", resolved.display())))
    }
}

/// Report the session's working directory.
pub struct CurrentLocTool;

#[async_trait]
impl Tool for CurrentLocTool {
    fn name(&self) -> &str {
        "current_loc"
    }

    fn description(&self) -> &str {
        "Get the user's current working directory."
    }

    fn schema(&self) -> Schema {
        Schema::object()
    }

    async fn execute(&self, _args: Args, ctx: &ToolContext) -> Result<Value, ToolError> {
        Ok(Value::String(ctx.cwd.display().to_string()))
    }
}

/// Delete a file, or a directory when `recursive` is set. Requires approval.
pub struct DeleteTool;

#[async_trait]
impl Tool for DeleteTool {
    fn name(&self) -> &str {
        "delete_file_dir"
    }

    fn description(&self) -> &str {
        "Delete a file or directory. Directories require recursive=true."
    }

    fn schema(&self) -> Schema {
        Schema::object()
            .field("path", Schema::string().describe("File or directory to delete"))
            .optional(
                "recursive",
                Schema::boolean().describe("Required to delete a directory and its contents"),
            )
    }

    fn approval(&self) -> Approval {
        Approval::Always
    }

    async fn execute(&self, args: Args, ctx: &ToolContext) -> Result<Value, ToolError> {
        let path = args::required_str(&args, self.name(), "path")?;
        let recursive = args::optional_bool(&args, "recursive").unwrap_or(false);
        let resolved = args::resolve(ctx, path)?;

        if resolved == ctx.cwd {
            return Err(ToolError::SafetyViolation(
                "refusing to delete the working directory".into(),
            ));
        }

        let metadata = tokio::fs::symlink_metadata(&resolved)
            .await
            .map_err(|e| ToolError::failed(self.name(), format!("Failed to stat {path}: {e}")))?;

        if metadata.is_dir() {
            if !recursive {
                return Err(ToolError::failed(
                    self.name(),
                    "Use recursive=true to delete directories",
                ));
            }
            debug!(path = %resolved.display(), "Deleting directory");
            tokio::fs::remove_dir_all(&resolved)
                .await
                .map_err(|e| ToolError::failed(self.name(), format!("Failed to delete {path}: {e}")))?;
            Ok(Value::String(format!("Deleted directory: {path}")))
        } else {
            debug!(path = %resolved.display(), "Deleting file");
            tokio::fs::remove_file(&resolved)
                .await
                .map_err(|e| ToolError::failed(self.name(), format!("Failed to delete {path}: {e}")))?;
            Ok(Value::String(format!("Deleted file: {path}")))
        }
    }
}

fn transfer_schema(verb: &str) -> Schema {
    Schema::object()
        .field("source", Schema::string().describe(format!("Path to {verb} from")))
        .field("destination", Schema::string().describe(format!("Path to {verb} to")))
}

pub struct MoveFileTool;

#[async_trait]
impl Tool for MoveFileTool {
    fn name(&self) -> &str {
        "move_file"
    }

    fn description(&self) -> &str {
        "Move or rename a file within the working directory."
    }

    fn schema(&self) -> Schema {
        transfer_schema("move")
    }

    async fn execute(&self, args: Args, ctx: &ToolContext) -> Result<Value, ToolError> {
        let source = args::required_str(&args, self.name(), "source")?;
        let destination = args::required_str(&args, self.name(), "destination")?;
        let from = args::resolve(ctx, source)?;
        let to = args::resolve(ctx, destination)?;

        tokio::fs::rename(&from, &to).await.map_err(|e| {
            ToolError::failed(self.name(), format!("Failed to move {source}: {e}"))
        })?;

        Ok(Value::String(format!("Moved {source} to {destination}")))
    }
}

pub struct CopyFileTool;

#[async_trait]
impl Tool for CopyFileTool {
    fn name(&self) -> &str {
        "copy_file"
    }

    fn description(&self) -> &str {
        "Copy a file within the working directory."
    }

    fn schema(&self) -> Schema {
        transfer_schema("copy")
    }

    async fn execute(&self, args: Args, ctx: &ToolContext) -> Result<Value, ToolError> {
        let source = args::required_str(&args, self.name(), "source")?;
        let destination = args::required_str(&args, self.name(), "destination")?;
        let from = args::resolve(ctx, source)?;
        let to = args::resolve(ctx, destination)?;

        tokio::fs::copy(&from, &to).await.map_err(|e| {
            ToolError::failed(self.name(), format!("Failed to copy {source}: {e}"))
        })?;

        Ok(Value::String(format!("Copied {source} to {destination}")))
    }
}
