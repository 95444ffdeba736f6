//! Arka CLI — the main entry point.
//!
//! Commands:
//! - `ask`           — Answer one query and exit
//! - `chat`          — Interactive session over stdin
//! - `configure`     — Create or update a provider profile
//! - `set-api`       — Switch the active profile
//! - `see-api`       — List profiles
//! - `delete-config` — Remove a profile

use std::path::PathBuf;

use arka_config::AppConfig;
use arka_tools::AgentMode;
use clap::{Parser, Subcommand};

mod commands;
mod terminal;

#[derive(Parser)]
#[command(
    name = "arka",
    about = "Arka — a coding agent for your terminal",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Show step-by-step diagnostics and debug logs
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use this config file instead of ~/.arka/config.toml
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a single query
    Ask {
        /// The query; multiple words are joined with spaces
        #[arg(required = true, trailing_var_arg = true)]
        query: Vec<String>,

        /// Tool access: chat, plan or build
        #[arg(short, long)]
        mode: Option<AgentMode>,
    },

    /// Start an interactive session
    Chat {
        /// Tool access: chat, plan or build
        #[arg(short, long)]
        mode: Option<AgentMode>,
    },

    /// Create or update a provider profile and make it active
    Configure {
        /// Profile name
        #[arg(long, default_value = "default")]
        name: String,

        /// openai, claude or gemini
        #[arg(long)]
        provider: String,

        #[arg(long)]
        model: String,

        #[arg(long, env = "ARKA_API_KEY", hide_env_values = true)]
        api_key: String,

        /// Tavily key for web search
        #[arg(long)]
        search_api_key: Option<String>,
    },

    /// Switch the active profile
    SetApi {
        /// Profile name
        name: String,
    },

    /// List configured profiles
    SeeApi,

    /// Remove a profile
    DeleteConfig {
        /// Profile name
        name: String,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_path = match cli.config {
        Some(path) => path,
        None => AppConfig::default_path()?,
    };

    match cli.command {
        Commands::Ask { query, mode } => {
            commands::agent::ask(&config_path, &query.join(" "), mode, cli.verbose).await
        }
        Commands::Chat { mode } => commands::agent::chat(&config_path, mode, cli.verbose).await,
        Commands::Configure {
            name,
            provider,
            model,
            api_key,
            search_api_key,
        } => commands::profile::configure(
            &config_path,
            &name,
            &provider,
            &model,
            &api_key,
            search_api_key,
        ),
        Commands::SetApi { name } => commands::profile::set_active(&config_path, &name),
        Commands::SeeApi => commands::profile::list(&config_path),
        Commands::DeleteConfig { name } => commands::profile::delete(&config_path, &name),
    }
}
