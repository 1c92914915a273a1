//! Graph state: the conversation transcript plus its MCP configuration.

use serde::{Deserialize, Serialize};
use tether_core::{McpConfig, Message, Role};

/// How a state type combines a checkpointed snapshot with fresh input.
///
/// Invoked by the graph runner when a `thread_id` resumes an existing
/// thread: the prior state comes from the checkpointer, the input from
/// the caller.
pub trait GraphState: Clone + Send + Sync + 'static {
    fn merge(prior: Self, input: Self) -> Self;
}

/// The state flowing through the conversation graph.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentState {
    /// Conversation transcript. Nodes only ever append.
    #[serde(default)]
    pub messages: Vec<Message>,

    /// Per-invocation MCP server config. `None` means the node's default
    /// applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mcp_config: Option<McpConfig>,
}

impl AgentState {
    pub fn new() -> Self {
        Self::default()
    }

    /// State holding a single user message.
    pub fn from_user_message(content: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::user(content)],
            mcp_config: None,
        }
    }

    pub fn with_mcp_config(mut self, config: McpConfig) -> Self {
        self.mcp_config = Some(config);
        self
    }

    /// Content of the last assistant message, if any.
    pub fn last_assistant_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant)
            .map(|m| m.content.as_str())
    }
}

impl GraphState for AgentState {
    /// Messages accumulate; the fresh input's MCP config wins when set.
    fn merge(prior: Self, input: Self) -> Self {
        let mut messages = prior.messages;
        messages.extend(input.messages);
        Self {
            messages,
            mcp_config: input.mcp_config.or(prior.mcp_config),
        }
    }
}
