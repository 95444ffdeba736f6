//! Shared test doubles for the agent loop.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use arka_core::error::{ProviderError, ToolError};
use arka_core::message::{Message, ToolCall};
use arka_core::provider::{InvokeOptions, Provider, ProviderResponse, StreamChunk, StreamReceiver};
use arka_core::schema::Schema;
use arka_core::tool::{Approval, Tool, ToolContext};
use serde_json::{Map, Value};

/// A mock provider that replays scripted responses.
///
/// Each `invoke` returns the next scripted response and each `stream` yields
/// the next scripted list of fragments. Running out of script is a
/// `ProviderError`, so an unexpected extra call fails the test loudly.
pub struct SequentialMockProvider {
    responses: Mutex<VecDeque<ProviderResponse>>,
    streams: Mutex<VecDeque<Vec<String>>>,
    invoke_count: AtomicUsize,
    stream_count: AtomicUsize,
    /// Every transcript passed to `invoke`, in call order.
    invoked_with: Mutex<Vec<Vec<Message>>>,
    /// Transcript length and tool declaration count of every `stream` call.
    streamed_with: Mutex<Vec<(usize, usize)>>,
}

impl SequentialMockProvider {
    pub fn new(responses: Vec<ProviderResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            streams: Mutex::new(VecDeque::new()),
            invoke_count: AtomicUsize::new(0),
            stream_count: AtomicUsize::new(0),
            invoked_with: Mutex::new(Vec::new()),
            streamed_with: Mutex::new(Vec::new()),
        }
    }

    /// Script the fragments of successive `stream` calls.
    pub fn with_streams<S: Into<String>>(self, streams: Vec<Vec<S>>) -> Self {
        *self.streams.lock().unwrap() = streams
            .into_iter()
            .map(|fragments| fragments.into_iter().map(Into::into).collect())
            .collect();
        self
    }

    /// A model that answers `text` straight away, streamed as one fragment.
    pub fn single_text(text: &str) -> Self {
        Self::new(vec![ProviderResponse::text(text)]).with_streams(vec![vec![text]])
    }

    pub fn invoke_count(&self) -> usize {
        self.invoke_count.load(Ordering::SeqCst)
    }

    pub fn stream_count(&self) -> usize {
        self.stream_count.load(Ordering::SeqCst)
    }

    pub fn transcripts(&self) -> Vec<Vec<Message>> {
        self.invoked_with.lock().unwrap().clone()
    }

    /// `(messages, tools)` counts seen by each `stream` call.
    pub fn streamed(&self) -> Vec<(usize, usize)> {
        self.streamed_with.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn invoke(
        &self,
        messages: &[Message],
        _options: &InvokeOptions,
    ) -> Result<ProviderResponse, ProviderError> {
        let call = self.invoke_count.fetch_add(1, Ordering::SeqCst);
        self.invoked_with.lock().unwrap().push(messages.to_vec());
        self.responses.lock().unwrap().pop_front().ok_or_else(|| {
            ProviderError::Network(format!("no scripted response for invoke #{call}"))
        })
    }

    async fn stream(
        &self,
        messages: &[Message],
        options: &InvokeOptions,
    ) -> Result<StreamReceiver, ProviderError> {
        let call = self.stream_count.fetch_add(1, Ordering::SeqCst);
        self.streamed_with
            .lock()
            .unwrap()
            .push((messages.len(), options.tools.len()));
        let fragments = self.streams.lock().unwrap().pop_front().ok_or_else(|| {
            ProviderError::Stream(format!("no scripted stream for call #{call}"))
        })?;
        let (tx, rx) = tokio::sync::mpsc::channel(fragments.len().max(1));
        for fragment in fragments {
            let _ = tx.send(Ok(StreamChunk::text(fragment))).await;
        }
        Ok(rx)
    }
}

/// A response that asks for the given tool calls.
pub fn tool_call_response(calls: Vec<ToolCall>) -> ProviderResponse {
    ProviderResponse {
        content: String::new(),
        tool_calls: calls,
    }
}

/// Helper to create a tool call.
pub fn make_tool_call(id: &str, name: &str, args: Value) -> ToolCall {
    ToolCall::new(id, name, args.as_object().cloned().unwrap_or_default())
}

/// A tool that counts its executions and returns a fixed output.
pub struct CountingTool {
    name: String,
    approval: Approval,
    output: Result<String, String>,
    count: Arc<AtomicUsize>,
}

impl CountingTool {
    pub fn new(name: &str, output: &str) -> Self {
        Self {
            name: name.into(),
            approval: Approval::Never,
            output: Ok(output.into()),
            count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A tool whose every execution fails with `reason`.
    pub fn failing(name: &str, reason: &str) -> Self {
        Self {
            output: Err(reason.into()),
            ..Self::new(name, "")
        }
    }

    pub fn requiring_approval(mut self) -> Self {
        self.approval = Approval::Always;
        self
    }

    /// Shared handle on the execution counter.
    pub fn counter(&self) -> Arc<AtomicUsize> {
        self.count.clone()
    }
}

#[async_trait::async_trait]
impl Tool for CountingTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Counts its calls"
    }

    fn schema(&self) -> Schema {
        Schema::object().optional("path", Schema::string())
    }

    fn approval(&self) -> Approval {
        self.approval
    }

    async fn execute(&self, _args: Map<String, Value>, _ctx: &ToolContext) -> Result<Value, ToolError> {
        self.count.fetch_add(1, Ordering::SeqCst);
        match &self.output {
            Ok(text) => Ok(Value::String(text.clone())),
            Err(reason) => Err(ToolError::failed(&self.name, reason)),
        }
    }
}
