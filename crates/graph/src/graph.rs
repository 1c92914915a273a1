//! State graph: nodes plus linear edge order, compiled into an
//! executable graph.
//!
//! Build with `add_node` / `add_edge`, then `compile` (optionally with a
//! checkpointer) to get a [`CompiledStateGraph`]. Each node's returned
//! [`Next`] routes execution: continue the chain, jump, or end.

use crate::checkpoint::{Checkpoint, CheckpointError, Checkpointer, RunnableConfig};
use crate::node::{Next, Node};
use crate::state::GraphState;
use std::collections::HashMap;
use std::sync::Arc;
use tether_core::Error;
use tracing::debug;

/// Error from [`StateGraph::compile`].
#[derive(Debug, thiserror::Error)]
pub enum CompilationError {
    #[error("edge references unknown node '{0}'")]
    NodeNotFound(String),
}

fn graph_err(e: CheckpointError) -> Error {
    Error::Graph {
        message: format!("Checkpoint failure: {e}"),
    }
}

/// A graph under construction.
pub struct StateGraph<S> {
    nodes: HashMap<String, Box<dyn Node<S>>>,
    /// Linear chain: [id1, id2, ...] means START -> id1 -> id2 -> ... -> END.
    edge_order: Vec<String>,
}

impl<S: GraphState> Default for StateGraph<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: GraphState> StateGraph<S> {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            edge_order: Vec::new(),
        }
    }

    /// Register a node. Replaces any existing node with the same id.
    pub fn add_node(&mut self, node: Box<dyn Node<S>>) -> &mut Self {
        self.nodes.insert(node.id().to_string(), node);
        self
    }

    /// Append a node id to the linear chain.
    pub fn add_edge(&mut self, to_id: impl Into<String>) -> &mut Self {
        self.edge_order.push(to_id.into());
        self
    }

    /// Build the executable graph without persistence.
    pub fn compile(self) -> Result<CompiledStateGraph<S>, CompilationError> {
        self.compile_inner(None)
    }

    /// Build the executable graph with a checkpointer. State is saved
    /// after each invoke that carries a `thread_id`.
    pub fn compile_with_checkpointer(
        self,
        checkpointer: Arc<dyn Checkpointer<S>>,
    ) -> Result<CompiledStateGraph<S>, CompilationError> {
        self.compile_inner(Some(checkpointer))
    }

    fn compile_inner(
        self,
        checkpointer: Option<Arc<dyn Checkpointer<S>>>,
    ) -> Result<CompiledStateGraph<S>, CompilationError> {
        for id in &self.edge_order {
            if !self.nodes.contains_key(id) {
                return Err(CompilationError::NodeNotFound(id.clone()));
            }
        }
        Ok(CompiledStateGraph {
            nodes: self.nodes,
            edge_order: self.edge_order,
            checkpointer,
        })
    }
}

/// Compiled graph: immutable, supports invoke only.
pub struct CompiledStateGraph<S> {
    nodes: HashMap<String, Box<dyn Node<S>>>,
    edge_order: Vec<String>,
    checkpointer: Option<Arc<dyn Checkpointer<S>>>,
}

impl<S> std::fmt::Debug for CompiledStateGraph<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledStateGraph")
            .field("nodes", &self.nodes.keys().collect::<Vec<_>>())
            .field("edge_order", &self.edge_order)
            .field("has_checkpointer", &self.checkpointer.is_some())
            .finish()
    }
}

impl<S: GraphState> CompiledStateGraph<S> {
    /// Run the graph to completion.
    ///
    /// With a checkpointer and a `thread_id`, the thread's latest
    /// checkpoint is merged with the input before running, and the final
    /// state is saved afterward.
    pub async fn invoke(&self, input: S, config: &RunnableConfig) -> Result<S, Error> {
        let persist = self.checkpointer.is_some() && config.thread_id.is_some();

        let mut step = 0u64;
        let mut state = input;

        if persist {
            if let Some(checkpointer) = &self.checkpointer {
                if let Some(checkpoint) = checkpointer.get(config).await.map_err(graph_err)? {
                    debug!(
                        thread = config.thread_id.as_deref().unwrap_or_default(),
                        step = checkpoint.step,
                        "Resuming thread from checkpoint"
                    );
                    step = checkpoint.step + 1;
                    state = S::merge(checkpoint.state, state);
                }
            }
        }

        let mut current_id = self
            .edge_order
            .first()
            .cloned()
            .ok_or_else(|| Error::Graph {
                message: "empty graph".into(),
            })?;

        loop {
            let node = self.nodes.get(&current_id).ok_or_else(|| Error::Graph {
                message: format!("unknown node '{current_id}'"),
            })?;

            debug!(node = %current_id, "Running graph node");
            let (new_state, next) = node.run(state).await?;
            state = new_state;

            match next {
                Next::End => break,
                Next::Node(id) => current_id = id,
                Next::Continue => {
                    let pos = self
                        .edge_order
                        .iter()
                        .position(|x| x == &current_id)
                        .ok_or_else(|| Error::Graph {
                            message: format!("node '{current_id}' not in edge order"),
                        })?;
                    if pos + 1 >= self.edge_order.len() {
                        break;
                    }
                    current_id = self.edge_order[pos + 1].clone();
                }
            }
        }

        if persist {
            if let Some(checkpointer) = &self.checkpointer {
                checkpointer
                    .put(config, Checkpoint::from_state(state.clone(), step))
                    .await
                    .map_err(graph_err)?;
            }
        }

        Ok(state)
    }
}
