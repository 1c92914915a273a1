//! The chat node: one conversational turn.
//!
//! Connects to the MCP servers named by the state, bridges their tools
//! into a registry, and hands the transcript to the reasoning loop.
//! Everything the turn produces is appended to the state; any failure
//! fails the whole turn.

use crate::node::{Next, Node};
use crate::state::AgentState;
use async_trait::async_trait;
use std::sync::Arc;
use tether_agent::ReactAgent;
use tether_config::AppConfig;
use tether_core::{Error, McpConfig, Provider};
use tether_mcp::McpClient;
use tracing::{info, warn};

pub const CHAT_NODE_ID: &str = "chat";

/// Node driving one LLM turn with MCP-backed tools.
pub struct ChatNode {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: u32,
    max_iterations: u32,
}

impl ChatNode {
    pub fn new(provider: Arc<dyn Provider>, config: &AppConfig) -> Self {
        Self {
            provider,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            max_iterations: config.max_iterations,
        }
    }
}

#[async_trait]
impl Node<AgentState> for ChatNode {
    fn id(&self) -> &str {
        CHAT_NODE_ID
    }

    async fn run(&self, mut state: AgentState) -> Result<(AgentState, Next), Error> {
        // No MCP config in the state means no tool servers this turn. The
        // caller decides what servers a conversation gets; the node itself
        // defaults to none.
        let mcp_config = match &state.mcp_config {
            Some(config) => config.clone(),
            None => {
                warn!("No MCP config in state, running without tool servers");
                McpConfig::new()
            }
        };

        let client = McpClient::connect(&mcp_config).await?;
        let registry = client.tool_registry().await?;

        info!(
            servers = client.len(),
            tools = registry.len(),
            model = %self.model,
            "Chat turn starting"
        );

        let agent = ReactAgent::new(
            Arc::clone(&self.provider),
            self.model.clone(),
            self.temperature,
            Arc::new(registry),
        )
        .with_max_iterations(self.max_iterations)
        .with_max_tokens(self.max_tokens);

        let result = agent.run(&state.messages).await?;
        state.messages.extend(result.messages);

        Ok((state, Next::End))
    }
}
