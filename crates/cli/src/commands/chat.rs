//! `tether chat` — Interactive or single-message chat mode.

use anyhow::Context;
use std::sync::Arc;
use tether_config::AppConfig;
use tether_graph::{build_graph, AgentState, RunnableConfig};
use tether_providers::OpenAiCompatProvider;
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn run(message: Option<String>, thread: Option<String>) -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load config")?;

    // Check for API key early — give a clear error
    if config.api_key.is_none() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    TETHER_API_KEY='sk-...'");
        eprintln!("    OPENAI_API_KEY='sk-...'");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!(
            "    {}",
            AppConfig::config_dir().join("config.toml").display()
        );
        eprintln!();
        anyhow::bail!("No API key found. See above for setup instructions.");
    }

    let provider = Arc::new(OpenAiCompatProvider::from_config(&config)?);
    let graph = build_graph(provider, &config)?;

    let thread_id = thread.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let run_config = RunnableConfig::for_thread(&thread_id);

    // The config-file server table is a convenience for this host; the
    // node only connects to what the state carries.
    let turn_state = |input: &str| {
        AgentState::from_user_message(input).with_mcp_config(config.mcp_servers.clone())
    };

    if let Some(msg) = message {
        // Single message mode
        eprint!("  Thinking...");
        let result = graph.invoke(turn_state(&msg), &run_config).await?;
        eprint!("\r              \r");
        println!("{}", result.last_assistant_text().unwrap_or_default());
        return Ok(());
    }

    // Interactive mode
    println!();
    println!("  tether — interactive chat");
    println!();
    println!("  Model:    {}", config.model);
    println!("  Servers:  {}", server_summary(&config));
    println!("  Thread:   {thread_id}");
    println!();
    println!("  Type your message and press Enter.");
    println!("  Type 'exit' or Ctrl+C to quit.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    print_prompt()?;
    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        if input.is_empty() {
            print_prompt()?;
            continue;
        }
        if input == "exit" || input == "quit" {
            break;
        }

        eprint!("  ...");
        match graph.invoke(turn_state(input), &run_config).await {
            Ok(result) => {
                eprint!("\r     \r");
                println!();
                for line in result.last_assistant_text().unwrap_or_default().lines() {
                    println!("  Assistant > {line}");
                }
                println!();
            }
            Err(e) => {
                eprint!("\r     \r");
                eprintln!("  [Error] {e}");
                println!();
            }
        }

        print_prompt()?;
    }

    println!();
    println!("  Goodbye!");
    println!();

    Ok(())
}

fn server_summary(config: &AppConfig) -> String {
    if config.mcp_servers.is_empty() {
        return "none".to_string();
    }
    let mut names: Vec<&str> = config.mcp_servers.keys().map(|s| s.as_str()).collect();
    names.sort_unstable();
    names.join(", ")
}

fn print_prompt() -> anyhow::Result<()> {
    use std::io::Write;
    print!("  You > ");
    std::io::stdout().flush()?;
    Ok(())
}
