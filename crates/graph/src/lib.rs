//! Conversation graph: a checkpointed state graph whose single chat
//! node runs the MCP-tooled reasoning loop.

pub mod chat_node;
pub mod checkpoint;
pub mod graph;
pub mod node;
pub mod state;

use std::sync::Arc;
use tether_config::AppConfig;
use tether_core::Provider;

pub use chat_node::{ChatNode, CHAT_NODE_ID};
pub use checkpoint::{Checkpoint, CheckpointError, Checkpointer, MemorySaver, RunnableConfig};
pub use graph::{CompilationError, CompiledStateGraph, StateGraph};
pub use node::{Next, Node};
pub use state::{AgentState, GraphState};

/// Build the standard conversation graph: a single chat node behind an
/// in-memory checkpointer.
pub fn build_graph(
    provider: Arc<dyn Provider>,
    config: &AppConfig,
) -> Result<CompiledStateGraph<AgentState>, CompilationError> {
    let mut graph = StateGraph::new();
    graph.add_node(Box::new(ChatNode::new(provider, config)));
    graph.add_edge(CHAT_NODE_ID);
    graph.compile_with_checkpointer(Arc::new(MemorySaver::new()))
}
