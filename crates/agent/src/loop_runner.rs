//! The agent reasoning loop implementation.

use std::sync::Arc;

use arka_core::error::ProviderError;
use arka_core::memory::{MemoryGateway, Turn};
use arka_core::message::{Message, Transcript};
use arka_core::provider::{InvokeOptions, Provider, ProviderKind};
use arka_core::tool::{ToolContext, ToolRegistry};
use arka_tools::AgentMode;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::analyzer::MemoryAnalyzer;
use crate::event::{AgentEvent, ApprovalPrompt, ApprovalRequest};
use crate::preview::{arg_preview, tool_label};
use crate::prompt::{PromptContext, build_system_prompt};

pub const DEFAULT_MAX_STEPS: u32 = 20;

/// Tool message recorded when the user declines a call.
pub const DENIED_MESSAGE: &str = "User denied this action.";

/// Text emitted when the user declines to continue past the step limit.
pub const STOPPED_MESSAGE: &str = "Stopped after reaching the step limit.";

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Event receiver closed")]
    EventSinkClosed,
}

/// How a query ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The model answered in plain text; `text` is the full streamed answer.
    Done { text: String },
    /// The user declined to continue at the step limit.
    Stopped,
}

/// The core agent loop that orchestrates LLM calls and tool execution.
pub struct AgentLoop {
    /// The LLM provider to use
    provider: Arc<dyn Provider>,

    /// Which declaration format the provider expects
    kind: ProviderKind,

    /// Tool registry for the current mode
    tools: Arc<ToolRegistry>,

    /// Short-term and long-term memory
    memory: Arc<dyn MemoryGateway>,

    /// Working directory and other per-session tool context
    ctx: ToolContext,

    mode: AgentMode,

    /// Steps before the user is asked whether to continue
    max_steps: u32,

    /// Background preference extraction, if enabled
    analyzer: Option<MemoryAnalyzer>,
}

impl AgentLoop {
    /// Create a new agent loop.
    pub fn new(
        provider: Arc<dyn Provider>,
        kind: ProviderKind,
        tools: Arc<ToolRegistry>,
        memory: Arc<dyn MemoryGateway>,
        ctx: ToolContext,
    ) -> Self {
        Self {
            provider,
            kind,
            tools,
            memory,
            ctx,
            mode: AgentMode::default(),
            max_steps: DEFAULT_MAX_STEPS,
            analyzer: None,
        }
    }

    /// State the agent mode in the system prompt.
    pub fn with_mode(mut self, mode: AgentMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the step budget. Zero is treated as one.
    pub fn with_max_steps(mut self, max: u32) -> Self {
        self.max_steps = max.max(1);
        self
    }

    /// Run the memory analyzer alongside every query.
    pub fn with_analyzer(mut self, analyzer: MemoryAnalyzer) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    async fn emit(
        &self,
        events: &mpsc::Sender<AgentEvent>,
        event: AgentEvent,
    ) -> Result<(), AgentError> {
        events
            .send(event)
            .await
            .map_err(|_| AgentError::EventSinkClosed)
    }

    /// Ask a yes/no question. A dropped responder is a "no".
    async fn ask(
        &self,
        events: &mpsc::Sender<AgentEvent>,
        prompt: ApprovalPrompt,
    ) -> Result<bool, AgentError> {
        let (request, answer) = ApprovalRequest::new(prompt);
        self.emit(events, AgentEvent::ApprovalRequest(request)).await?;
        Ok(answer.await.unwrap_or(false))
    }

    async fn initial_transcript(&self, query: &str) -> Transcript {
        let preferences = self.memory.load_long_term().await;
        let short_term = self.memory.load_short_term().await;
        let system = build_system_prompt(&PromptContext {
            cwd: &self.ctx.cwd,
            date: chrono::Local::now().format("%Y-%m-%d").to_string(),
            mode: self.mode,
            preferences: &preferences,
            short_term: &short_term,
        });

        let mut transcript = Transcript::new();
        transcript.push(Message::system(system));
        transcript.push(Message::user(query));
        transcript
    }

    /// Stream the final answer, forwarding each fragment as it arrives.
    ///
    /// Replays the request that produced the tool-free response, tool
    /// declarations included.
    async fn stream_answer(
        &self,
        transcript: &Transcript,
        options: &InvokeOptions,
        events: &mpsc::Sender<AgentEvent>,
    ) -> Result<String, AgentError> {
        let mut rx = self.provider.stream(transcript.messages(), options).await?;
        let mut full = String::new();
        while let Some(chunk) = rx.recv().await {
            let Some(text) = chunk?.text else {
                continue;
            };
            if text.is_empty() {
                continue;
            }
            full.push_str(&text);
            self.emit(events, AgentEvent::TextChunk(text)).await?;
        }
        Ok(full)
    }

    /// Answer one user query.
    ///
    /// This is the main entry point for the agent loop. It:
    /// 1. Builds the transcript (system prompt + query)
    /// 2. Calls the LLM with the tool declarations
    /// 3. If tool calls are returned, approves and executes them in order, then loops
    /// 4. Otherwise streams the final answer and saves the turn to memory
    pub async fn run(
        &self,
        query: &str,
        events: &mpsc::Sender<AgentEvent>,
    ) -> Result<Outcome, AgentError> {
        info!(
            provider = self.provider.name(),
            mode = %self.mode,
            tools = self.tools.len(),
            "Processing query"
        );

        let mut transcript = self.initial_transcript(query).await;

        if let Some(analyzer) = &self.analyzer {
            // Never awaited; the answer does not wait on memory extraction.
            drop(analyzer.spawn(query.to_string()));
        }

        let options = InvokeOptions::with_tools(self.tools.list_for_provider(self.kind));
        let mut steps: u32 = 0;

        loop {
            steps += 1;

            if steps > self.max_steps {
                warn!(max_steps = self.max_steps, "Step limit reached");
                let prompt = ApprovalPrompt::StepLimit {
                    steps: self.max_steps,
                };
                if !self.ask(events, prompt).await? {
                    self.emit(events, AgentEvent::TextChunk(STOPPED_MESSAGE.into()))
                        .await?;
                    return Ok(Outcome::Stopped);
                }
                steps = 0;
            }

            debug!(step = steps, "Agent loop iteration");
            self.emit(events, AgentEvent::Debug(format!("Step {steps}")))
                .await?;

            let response = self.provider.invoke(transcript.messages(), &options).await?;

            if !response.has_tool_calls() {
                let text = self.stream_answer(&transcript, &options, events).await?;

                let turns = vec![Turn::user(query), Turn::assistant(text.clone())];
                if let Err(e) = self.memory.save_short_term(turns).await {
                    warn!(error = %e, "Failed to save short-term memory");
                }

                info!(steps, "Query answered");
                return Ok(Outcome::Done { text });
            }

            debug!(
                tool_count = response.tool_calls.len(),
                "Executing tool calls"
            );

            let calls = response.tool_calls.clone();
            transcript.push(Message::assistant_with_tools(response.content, response.tool_calls));

            for call in calls {
                if self.tools.needs_approval(&call.name, &call.args) {
                    let prompt = ApprovalPrompt::ToolCall {
                        tool_name: call.name.clone(),
                        args: call.args.clone(),
                    };
                    if !self.ask(events, prompt).await? {
                        info!(tool = %call.name, "Tool call denied");
                        transcript.push(Message::tool_result(&call.id, &call.name, DENIED_MESSAGE));
                        continue;
                    }
                }

                self.emit(
                    events,
                    AgentEvent::ToolStarted {
                        label: tool_label(&call.name),
                        preview: arg_preview(&call.args),
                    },
                )
                .await?;
                self.emit(events, AgentEvent::Debug(format!("Calling tool {}", call.name)))
                    .await?;

                let content = match self.tools.execute(&call.name, call.args, &self.ctx).await {
                    Ok(output) => output,
                    Err(e) => {
                        warn!(tool = %call.name, error = %e, "Tool execution failed");
                        // Report error to the LLM so it can recover
                        format!("Error: {e}")
                    }
                };
                transcript.push(Message::tool_result(call.id, call.name, content));
            }

            // Loop back — the LLM will see the tool results and decide what to do next
        }
    }
}
