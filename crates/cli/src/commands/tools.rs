//! `tether tools`: list tools from the configured MCP servers.

use anyhow::Context;
use tether_config::AppConfig;
use tether_core::Tool;
use tether_mcp::McpClient;

pub async fn run() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load config")?;

    if config.mcp_servers.is_empty() {
        println!();
        println!("  No MCP servers configured.");
        println!();
        println!("  Add one to your config file:");
        println!(
            "    {}",
            AppConfig::config_dir().join("config.toml").display()
        );
        println!();
        println!("    [mcp_servers.fetch]");
        println!("    transport = \"stdio\"");
        println!("    command = \"uvx\"");
        println!("    args = [\"mcp-server-fetch\"]");
        println!();
        return Ok(());
    }

    let client = McpClient::connect(&config.mcp_servers)
        .await
        .context("Failed to connect to MCP servers")?;
    let tools = client.list_tools().await?;

    println!();
    println!(
        "  {} tool(s) from {} server(s)",
        tools.len(),
        client.len()
    );
    println!();
    for tool in &tools {
        if tool.description().is_empty() {
            println!("  {}", tool.name());
        } else {
            println!("  {:30} {}", tool.name(), tool.description());
        }
    }
    println!();

    Ok(())
}
