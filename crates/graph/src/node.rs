//! Graph node trait: one step in a state graph.

use crate::state::GraphState;
use async_trait::async_trait;
use tether_core::Error;

/// Next step after running a node.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Next {
    /// Follow the linear edge order; if the current node is last, end.
    Continue,
    /// Jump to the node with the given id.
    Node(String),
    /// Stop and return the current state.
    End,
}

/// One step in a graph: state in, (state out, next step).
#[async_trait]
pub trait Node<S: GraphState>: Send + Sync {
    /// Node id, unique within a graph.
    fn id(&self) -> &str;

    /// Run the step. The returned [`Next`] routes the graph.
    async fn run(&self, state: S) -> Result<(S, Next), Error>;
}
