//! tether CLI entry point.
//!
//! Commands:
//! - `chat`:   Interactive chat or single-message mode
//! - `tools`:  List tools available from configured MCP servers
//! - `config`: Show the effective configuration

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "tether",
    about = "Conversational agent over LLM providers and MCP tools",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the agent
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Resume or name a conversation thread
        #[arg(short, long)]
        thread: Option<String>,
    },

    /// List tools available from the configured MCP servers
    Tools,

    /// Show the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Chat { message, thread } => commands::chat::run(message, thread).await?,
        Commands::Tools => commands::tools::run().await?,
        Commands::Config => commands::config_cmd::run().await?,
    }

    Ok(())
}
