//! `tether config` — Show the effective configuration.

use anyhow::Context;
use tether_config::AppConfig;

pub async fn run() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load config")?;
    let config_path = AppConfig::config_dir().join("config.toml");

    println!();
    println!("  Config file:     {}", config_path.display());
    println!(
        "  API key:         {}",
        if config.api_key.is_some() {
            "set"
        } else {
            "not set"
        }
    );
    println!("  API URL:         {}", config.api_url);
    println!("  Model:           {}", config.model);
    println!("  Temperature:     {}", config.temperature);
    println!("  Max tokens:      {}", config.max_tokens);
    println!("  Max iterations:  {}", config.max_iterations);
    println!();

    if config.mcp_servers.is_empty() {
        println!("  MCP servers:     none");
    } else {
        println!("  MCP servers:");
        let mut names: Vec<&String> = config.mcp_servers.keys().collect();
        names.sort_unstable();
        for name in names {
            let connection = &config.mcp_servers[name];
            println!("    {:20} {}", name, connection.transport_label());
        }
    }
    println!();

    Ok(())
}
