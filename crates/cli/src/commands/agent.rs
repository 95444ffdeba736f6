//! `arka ask` and `arka chat` — run queries through the agent loop.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use arka_agent::{AgentLoop, MemoryAnalyzer, Outcome};
use arka_config::AppConfig;
use arka_core::memory::MemoryGateway;
use arka_core::tool::ToolContext;
use arka_memory::FileMemoryStore;
use arka_providers::{create_cheap_provider, create_provider};
use arka_tools::{AgentMode, ToolSettings, registry_for_mode};
use colored::Colorize;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::terminal::Terminal;

/// Buffered events between the loop task and the terminal.
const EVENT_BUFFER: usize = 64;

/// A ready-to-run agent plus the store it remembers into.
struct Session {
    agent: Arc<AgentLoop>,
    memory: Arc<FileMemoryStore>,
    mode: AgentMode,
    profile: String,
    model: String,
}

impl Session {
    fn build(config_path: &Path, mode: Option<AgentMode>) -> anyhow::Result<Self> {
        let mut config = AppConfig::load_from(config_path).context("Failed to load config")?;
        config.apply_env_overrides();
        config.validate().context("Invalid configuration")?;

        let (name, profile) = config.active()?;
        let kind = profile.kind()?;
        let mode = match mode {
            Some(mode) => mode,
            None => config
                .agent
                .mode
                .parse()
                .map_err(anyhow::Error::msg)
                .context("Invalid agent.mode in config")?,
        };

        let settings = ToolSettings {
            search_api_key: profile.search_api_key.clone(),
            command_timeout_secs: config.agent.command_timeout_secs,
            max_output_bytes: config.agent.max_output_bytes,
        };
        let tools = Arc::new(registry_for_mode(mode, &settings));

        let memory = Arc::new(FileMemoryStore::new(config.memory_dir()?));
        let cwd = std::env::current_dir().context("Failed to read the working directory")?;

        let provider = create_provider(kind, profile.api_key.clone(), profile.model.clone());
        let analyzer = MemoryAnalyzer::new(
            create_cheap_provider(kind, profile.api_key.clone()),
            memory.clone(),
        );

        let agent = AgentLoop::new(provider, kind, tools, memory.clone(), ToolContext::new(cwd))
            .with_mode(mode)
            .with_max_steps(config.agent.max_steps)
            .with_analyzer(analyzer);

        debug!(profile = name, provider = %kind, mode = %mode, "Session ready");
        Ok(Self {
            agent: Arc::new(agent),
            memory,
            mode,
            profile: name.to_string(),
            model: profile.model.clone(),
        })
    }

    /// Run one query, rendering events until the loop finishes.
    async fn turn(&self, terminal: &mut Terminal, query: &str) -> anyhow::Result<Outcome> {
        let (tx, mut rx) = mpsc::channel(EVENT_BUFFER);
        let agent = self.agent.clone();
        let query = query.to_string();
        let task = tokio::spawn(async move { agent.run(&query, &tx).await });

        while let Some(event) = rx.recv().await {
            terminal.handle(event).await?;
        }
        let outcome = task.await.context("Agent task panicked")??;
        println!();
        Ok(outcome)
    }

    /// Forget this session's conversation. Failures are only logged.
    async fn finish(&self) {
        if let Err(e) = self.memory.clear_short_term().await {
            warn!(error = %e, "Failed to clear short-term memory");
        }
    }
}

pub async fn ask(
    config_path: &Path,
    query: &str,
    mode: Option<AgentMode>,
    verbose: bool,
) -> anyhow::Result<()> {
    let session = Session::build(config_path, mode)?;
    let mut terminal = Terminal::new(verbose);

    let result = tokio::select! {
        result = session.turn(&mut terminal, query) => result.map(|_| ()),
        _ = tokio::signal::ctrl_c() => Ok(()),
    };
    session.finish().await;
    result
}

pub async fn chat(config_path: &Path, mode: Option<AgentMode>, verbose: bool) -> anyhow::Result<()> {
    let session = Session::build(config_path, mode)?;
    let mut terminal = Terminal::new(verbose);

    println!();
    println!("  {}", "Arka".bold().cyan());
    println!("  Profile: {} ({})", session.profile, session.model);
    println!("  Mode:    {}", session.mode);
    println!("  Type 'exit' or 'quit' to leave.");
    println!();

    let result = tokio::select! {
        result = repl(&session, &mut terminal) => result,
        _ = tokio::signal::ctrl_c() => Ok(()),
    };
    session.finish().await;
    println!("Goodbye!");
    result
}

async fn repl(session: &Session, terminal: &mut Terminal) -> anyhow::Result<()> {
    let prompt = format!("{} ", "you ›".green().bold());
    loop {
        let Some(line) = terminal.read_line(&prompt).await? else {
            println!();
            return Ok(());
        };
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if matches!(query, "exit" | "quit") {
            return Ok(());
        }

        println!();
        if let Err(e) = session.turn(terminal, query).await {
            eprintln!("{} {e:#}", "Error:".red().bold());
        }
        println!();
    }
}
