//! Shell tool — execute system commands.
//!
//! Commands run through `sh -c` inside the session working directory, under a
//! wall-clock timeout and an output size cap. Output is read as it arrives and
//! the command is killed once either stream passes the cap. Every call
//! requires approval.

use async_trait::async_trait;
use arka_core::error::ToolError;
use arka_core::schema::Schema;
use arka_core::tool::{Approval, Tool, ToolContext};
use serde_json::{Value, json};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use crate::args::{self, Args};

pub const DEFAULT_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 10 * 1024 * 1024;

pub struct ExecuteCommandTool {
    timeout: Duration,
    max_output_bytes: usize,
}

impl ExecuteCommandTool {
    pub fn new(timeout_secs: u64, max_output_bytes: usize) -> Self {
        Self {
            timeout: Duration::from_secs(timeout_secs),
            max_output_bytes,
        }
    }
}

impl Default for ExecuteCommandTool {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT_SECS, DEFAULT_MAX_OUTPUT_BYTES)
    }
}

/// Truncate at a UTF-8 boundary at or below `limit`, with a trailing notice.
fn cap_output(output: &str, limit: usize) -> String {
    if output.len() <= limit {
        return output.to_string();
    }
    let mut end = limit;
    while end > 0 && !output.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}\n... output truncated at {limit} bytes", &output[..end])
}

/// What a finished (or killed) command left behind.
struct Captured {
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    status: ExitStatus,
}

/// Read one chunk from `pipe`. A closed pipe never becomes ready again.
async fn read_some<R: AsyncRead + Unpin>(
    pipe: &mut Option<R>,
    buf: &mut [u8],
) -> std::io::Result<usize> {
    match pipe {
        Some(reader) => reader.read(buf).await,
        None => std::future::pending().await,
    }
}

/// Drain both pipes until they close, holding at most `limit + 1` bytes of
/// each. Past that the child is killed and what was read so far is kept.
async fn capture(child: &mut Child, limit: usize) -> std::io::Result<Captured> {
    let mut stdout_pipe = child.stdout.take();
    let mut stderr_pipe = child.stderr.take();
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let mut out_buf = [0u8; 8192];
    let mut err_buf = [0u8; 8192];
    let mut overflowed = false;

    while stdout_pipe.is_some() || stderr_pipe.is_some() {
        tokio::select! {
            n = read_some(&mut stdout_pipe, &mut out_buf) => match n? {
                0 => stdout_pipe = None,
                n => stdout.extend_from_slice(&out_buf[..n]),
            },
            n = read_some(&mut stderr_pipe, &mut err_buf) => match n? {
                0 => stderr_pipe = None,
                n => stderr.extend_from_slice(&err_buf[..n]),
            },
        }
        if stdout.len() > limit || stderr.len() > limit {
            overflowed = true;
            break;
        }
    }

    if overflowed {
        stdout.truncate(limit + 1);
        stderr.truncate(limit + 1);
        debug!(limit, "Output cap exceeded, killing command");
        if let Err(e) = child.start_kill() {
            debug!(error = %e, "Command already gone");
        }
    }
    drop(stdout_pipe);
    drop(stderr_pipe);

    let status = child.wait().await?;
    Ok(Captured {
        stdout,
        stderr,
        status,
    })
}

#[async_trait]
impl Tool for ExecuteCommandTool {
    fn name(&self) -> &str {
        "execute_command"
    }

    fn description(&self) -> &str {
        "Execute shell commands like npm install, cargo build or git status. \
         Use this after creating project files to install dependencies or run scripts."
    }

    fn schema(&self) -> Schema {
        Schema::object()
            .field("command", Schema::string().describe("The shell command to execute"))
            .optional(
                "cwd",
                Schema::string().describe("Working directory (relative path). Defaults to the current directory."),
            )
    }

    fn approval(&self) -> Approval {
        Approval::Always
    }

    async fn execute(&self, args: Args, ctx: &ToolContext) -> Result<Value, ToolError> {
        let command = args::required_str(&args, self.name(), "command")?;
        let workdir = match args::optional_str(&args, "cwd") {
            Some(dir) => args::resolve(ctx, dir)?,
            None => ctx.cwd.clone(),
        };

        debug!(command = %command, cwd = %workdir.display(), "Executing shell command");

        let mut child = Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(&workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ToolError::failed(self.name(), format!("Failed to execute command: {e}")))?;

        let output = match tokio::time::timeout(
            self.timeout,
            capture(&mut child, self.max_output_bytes),
        )
        .await
        {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(ToolError::failed(
                    self.name(),
                    format!("Failed to execute command: {e}"),
                ));
            }
            Err(_) => {
                warn!(command = %command, "Command timed out");
                return Err(ToolError::Timeout {
                    tool: self.name().into(),
                    secs: self.timeout.as_secs(),
                });
            }
        };

        let stdout = cap_output(&String::from_utf8_lossy(&output.stdout), self.max_output_bytes);
        let stderr = cap_output(&String::from_utf8_lossy(&output.stderr), self.max_output_bytes);
        let success = output.status.success();
        let exit_code = output.status.code().unwrap_or(-1);

        if !success {
            warn!(command = %command, exit_code, "Command failed");
        }

        Ok(json!({
            "success": success,
            "stdout": stdout.trim(),
            "stderr": stderr.trim(),
            "exit_code": exit_code,
        }))
    }
}
