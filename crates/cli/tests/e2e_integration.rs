//! End-to-end tests for the Arka agent.
//!
//! These drive the real loop with the real built-in tools and the file-backed
//! memory store inside a temporary directory. Only the model is scripted.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use arka_agent::{AgentEvent, AgentLoop, ApprovalPrompt, DENIED_MESSAGE, Outcome};
use arka_core::error::ProviderError;
use arka_core::memory::MemoryGateway;
use arka_core::message::{Message, Role, ToolCall};
use arka_core::provider::{
    InvokeOptions, Provider, ProviderKind, ProviderResponse, StreamChunk, StreamReceiver,
};
use arka_core::tool::ToolContext;
use arka_memory::FileMemoryStore;
use arka_tools::{AgentMode, ToolSettings, registry_for_mode};
use tokio::sync::mpsc;

// ── Scripted model ───────────────────────────────────────────────────────

/// Replays tool-call turns, then streams a fixed answer.
struct ScriptedProvider {
    turns: Mutex<VecDeque<Vec<ToolCall>>>,
    answer: String,
    seen: Mutex<Vec<Vec<Message>>>,
    declared_tools: Mutex<usize>,
}

impl ScriptedProvider {
    fn new(turns: Vec<Vec<ToolCall>>, answer: &str) -> Self {
        Self {
            turns: Mutex::new(turns.into()),
            answer: answer.into(),
            seen: Mutex::new(Vec::new()),
            declared_tools: Mutex::new(0),
        }
    }

    fn last_transcript(&self) -> Vec<Message> {
        self.seen.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn invoke(
        &self,
        messages: &[Message],
        options: &InvokeOptions,
    ) -> Result<ProviderResponse, ProviderError> {
        self.seen.lock().unwrap().push(messages.to_vec());
        *self.declared_tools.lock().unwrap() = options.tools.len();
        let calls = self.turns.lock().unwrap().pop_front().unwrap_or_default();
        Ok(ProviderResponse {
            content: String::new(),
            tool_calls: calls,
        })
    }

    async fn stream(
        &self,
        _messages: &[Message],
        options: &InvokeOptions,
    ) -> Result<StreamReceiver, ProviderError> {
        *self.declared_tools.lock().unwrap() = options.tools.len();
        let (tx, rx) = mpsc::channel(self.answer.split_inclusive(' ').count().max(1));
        for word in self.answer.split_inclusive(' ') {
            let _ = tx.send(Ok(StreamChunk::text(word))).await;
        }
        Ok(rx)
    }
}

fn call(id: &str, name: &str, args: serde_json::Value) -> ToolCall {
    ToolCall::new(id, name, args.as_object().cloned().unwrap_or_default())
}

struct Fixture {
    _dir: tempfile::TempDir,
    workspace: std::path::PathBuf,
    memory: Arc<FileMemoryStore>,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let workspace = dir.path().join("project");
    std::fs::create_dir_all(&workspace).unwrap();
    let memory = Arc::new(FileMemoryStore::new(dir.path().join("memory")));
    Fixture {
        _dir: dir,
        workspace,
        memory,
    }
}

fn agent(fx: &Fixture, provider: Arc<ScriptedProvider>, mode: AgentMode) -> AgentLoop {
    let tools = Arc::new(registry_for_mode(mode, &ToolSettings::default()));
    AgentLoop::new(
        provider,
        ProviderKind::OpenAi,
        tools,
        fx.memory.clone(),
        ToolContext::new(fx.workspace.clone()),
    )
    .with_mode(mode)
}

/// Run a query, answering every approval with `approve`. Returns the
/// outcome, the streamed text and the approval prompts seen.
async fn run(
    agent: &AgentLoop,
    query: &str,
    approve: bool,
) -> (Outcome, String, Vec<ApprovalPrompt>) {
    let (tx, mut rx) = mpsc::channel(16);
    let run = agent.run(query, &tx);
    tokio::pin!(run);

    let mut text = String::new();
    let mut prompts = Vec::new();
    loop {
        tokio::select! {
            result = &mut run => {
                while let Ok(event) = rx.try_recv() {
                    if let AgentEvent::TextChunk(t) = event {
                        text.push_str(&t);
                    }
                }
                return (result.unwrap(), text, prompts);
            }
            Some(event) = rx.recv() => match event {
                AgentEvent::TextChunk(t) => text.push_str(&t),
                AgentEvent::ApprovalRequest(request) => {
                    prompts.push(request.prompt.clone());
                    request.respond(approve);
                }
                _ => {}
            }
        }
    }
}

// ── Scenarios ────────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_approved_write_lands_on_disk_and_is_remembered() {
    let fx = fixture();
    let provider = Arc::new(ScriptedProvider::new(
        vec![vec![call(
            "call_1",
            "write_file",
            serde_json::json!({"path": "notes/todo.md", "content": "- ship it\n"}),
        )]],
        "Wrote your todo list.",
    ));
    let agent = agent(&fx, provider.clone(), AgentMode::Build);

    let (outcome, text, prompts) = run(&agent, "Create notes/todo.md", true).await;

    assert_eq!(
        outcome,
        Outcome::Done {
            text: "Wrote your todo list.".into()
        }
    );
    assert_eq!(text, "Wrote your todo list.");
    assert_eq!(prompts.len(), 1);
    assert_eq!(
        std::fs::read_to_string(fx.workspace.join("notes/todo.md")).unwrap(),
        "- ship it\n"
    );

    let turns = fx.memory.load_short_term().await;
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].content, "Create notes/todo.md");
    assert_eq!(turns[1].content, "Wrote your todo list.");

    let transcript = provider.last_transcript();
    let result = transcript.last().unwrap();
    assert_eq!(result.role, Role::Tool);
    assert_eq!(result.tool_call_id.as_deref(), Some("call_1"));
    assert!(result.content.contains("Successfully wrote to notes/todo.md"));
}

#[tokio::test]
async fn e2e_denied_command_never_runs() {
    let fx = fixture();
    let provider = Arc::new(ScriptedProvider::new(
        vec![vec![call(
            "call_1",
            "execute_command",
            serde_json::json!({"command": "touch created-by-command"}),
        )]],
        "Okay, I won't.",
    ));
    let agent = agent(&fx, provider.clone(), AgentMode::Build);

    let (_, _, prompts) = run(&agent, "touch a file", false).await;

    assert!(matches!(prompts[0], ApprovalPrompt::ToolCall { ref tool_name, .. } if tool_name == "execute_command"));
    assert!(!fx.workspace.join("created-by-command").exists());
    let transcript = provider.last_transcript();
    assert_eq!(transcript.last().unwrap().content, DENIED_MESSAGE);
}

#[tokio::test]
async fn e2e_plan_mode_hides_write_tools() {
    let fx = fixture();
    std::fs::write(fx.workspace.join("main.rs"), "fn main() {}\n").unwrap();
    let provider = Arc::new(ScriptedProvider::new(
        vec![vec![
            call("call_1", "read_file", serde_json::json!({"path": "main.rs"})),
            call(
                "call_2",
                "write_file",
                serde_json::json!({"path": "main.rs", "content": ""}),
            ),
        ]],
        "Here's my plan.",
    ));
    let agent = agent(&fx, provider.clone(), AgentMode::Plan);

    let (_, _, prompts) = run(&agent, "plan a refactor", true).await;

    assert!(prompts.is_empty());
    assert_eq!(*provider.declared_tools.lock().unwrap(), 4);
    assert_eq!(
        std::fs::read_to_string(fx.workspace.join("main.rs")).unwrap(),
        "fn main() {}\n"
    );

    let transcript = provider.last_transcript();
    let n = transcript.len();
    assert_eq!(transcript[n - 2].content, "fn main() {}\n");
    assert_eq!(transcript[n - 1].content, "Error: Unknown tool: write_file");
}

#[tokio::test]
async fn e2e_escaping_path_is_reported_to_the_model() {
    let fx = fixture();
    let provider = Arc::new(ScriptedProvider::new(
        vec![vec![call(
            "call_1",
            "read_file",
            serde_json::json!({"path": "../../etc/passwd"}),
        )]],
        "I can't read outside the project.",
    ));
    let agent = agent(&fx, provider.clone(), AgentMode::Build);

    let (outcome, _, _) = run(&agent, "show me /etc/passwd", true).await;

    assert!(matches!(outcome, Outcome::Done { .. }));
    let transcript = provider.last_transcript();
    assert!(transcript.last().unwrap().content.starts_with("Error: "));
}

#[tokio::test]
async fn e2e_memory_persists_across_sessions_until_cleared() {
    let fx = fixture();
    let first = agent(
        &fx,
        Arc::new(ScriptedProvider::new(vec![], "Hi Sam!")),
        AgentMode::Chat,
    );
    run(&first, "hello", true).await;

    let provider = Arc::new(ScriptedProvider::new(vec![], "Still here."));
    let second = agent(&fx, provider.clone(), AgentMode::Chat);
    run(&second, "again", true).await;

    let system = &provider.last_transcript()[0];
    assert_eq!(system.role, Role::System);
    assert!(system.content.contains("## Recent Context"));
    assert!(system.content.contains("Hi Sam!"));

    fx.memory.clear_short_term().await.unwrap();
    assert!(fx.memory.load_short_term().await.is_empty());
}
