//! Agent events — what the loop tells the outside world while it works.
//!
//! The loop never prints. It sends `AgentEvent`s over a bounded `mpsc`
//! channel and whoever holds the receiver (the terminal, a test) renders them.
//! Approval questions carry a `oneshot` responder; the loop suspends until it
//! is answered or dropped.

use serde_json::{Map, Value};
use tokio::sync::oneshot;

/// Events emitted by the agent during one query.
#[derive(Debug)]
pub enum AgentEvent {
    /// A fragment of the final answer, in arrival order.
    TextChunk(String),

    /// A tool is about to run.
    ToolStarted { label: String, preview: String },

    /// The loop is blocked on a yes/no decision.
    ApprovalRequest(ApprovalRequest),

    /// Diagnostics: step numbers, tool dispatches.
    Debug(String),
}

impl AgentEvent {
    /// Short name of the event kind, used in logs.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::TextChunk(_) => "text_chunk",
            Self::ToolStarted { .. } => "tool_started",
            Self::ApprovalRequest(_) => "approval_request",
            Self::Debug(_) => "debug",
        }
    }
}

/// What the user is being asked to approve.
#[derive(Debug, Clone, PartialEq)]
pub enum ApprovalPrompt {
    /// Run this tool with these arguments?
    ToolCall {
        tool_name: String,
        args: Map<String, Value>,
    },
    /// The step budget is spent. Keep going?
    StepLimit { steps: u32 },
}

/// A question plus the channel its answer goes back on.
///
/// Dropping the request without answering counts as a denial.
#[derive(Debug)]
pub struct ApprovalRequest {
    pub prompt: ApprovalPrompt,
    pub responder: oneshot::Sender<bool>,
}

impl ApprovalRequest {
    /// Create a request and the receiver the loop waits on.
    pub fn new(prompt: ApprovalPrompt) -> (Self, oneshot::Receiver<bool>) {
        let (responder, rx) = oneshot::channel();
        (Self { prompt, responder }, rx)
    }

    pub fn respond(self, approved: bool) {
        // The loop may already be gone; nothing to do then.
        let _ = self.responder.send(approved);
    }

    pub fn approve(self) {
        self.respond(true);
    }

    pub fn deny(self) {
        self.respond(false);
    }
}
