//! Terminal rendering of agent events, and stdin line input.

use std::io::Write;

use arka_agent::{AgentEvent, ApprovalPrompt, tool_label};
use colored::Colorize;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

/// Owns stdin so the REPL and approval prompts read from one buffer.
pub struct Terminal {
    verbose: bool,
    input: Lines<BufReader<Stdin>>,
}

impl Terminal {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            input: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// Print `prompt` and read one line. `None` on EOF.
    pub async fn read_line(&mut self, prompt: &str) -> std::io::Result<Option<String>> {
        print!("{prompt}");
        std::io::stdout().flush()?;
        self.input.next_line().await
    }

    /// Render one event. Approval requests block on a `y/N` answer.
    pub async fn handle(&mut self, event: AgentEvent) -> std::io::Result<()> {
        match event {
            AgentEvent::TextChunk(text) => {
                let mut stdout = std::io::stdout();
                stdout.write_all(text.as_bytes())?;
                stdout.flush()?;
            }
            AgentEvent::ToolStarted { label, preview } => {
                println!("{}", status_line(&label, &preview));
            }
            AgentEvent::Debug(message) => {
                if self.verbose {
                    eprintln!("{}", format!("[debug] {message}").dimmed());
                }
            }
            AgentEvent::ApprovalRequest(request) => {
                println!("{}", approval_question(&request.prompt));
                let answer = self.read_line(&format!("{} ", "[y/N]".bold())).await?;
                let approved = answer.as_deref().is_some_and(is_yes);
                if !approved {
                    println!("{}", "Declined.".red());
                }
                request.respond(approved);
            }
        }
        Ok(())
    }
}

pub fn status_line(label: &str, preview: &str) -> String {
    format!("{} {}{}", "●".cyan(), label.cyan().bold(), preview.dimmed())
}

pub fn approval_question(prompt: &ApprovalPrompt) -> String {
    match prompt {
        ApprovalPrompt::ToolCall { tool_name, args } => {
            let rendered = serde_json::to_string_pretty(args).unwrap_or_else(|_| "{}".into());
            format!(
                "{} {} ({tool_name}) wants to run with:\n{}",
                "?".yellow().bold(),
                tool_label(tool_name).bold(),
                rendered.dimmed()
            )
        }
        ApprovalPrompt::StepLimit { steps } => format!(
            "{} Reached the limit of {steps} steps. Keep going?",
            "?".yellow().bold()
        ),
    }
}

/// Only an explicit yes approves.
pub fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
