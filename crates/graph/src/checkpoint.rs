//! Checkpointing: thread-scoped state snapshots between invocations.
//!
//! A `Checkpointer` saves the graph state after each invoke and restores
//! it when the same `thread_id` comes back, giving multi-turn threads
//! without the caller carrying state around.

use crate::state::GraphState;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Error type for checkpoint operations.
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    #[error("thread_id required")]
    ThreadIdRequired,
    #[error("storage: {0}")]
    Storage(String),
}

/// Config for a single invoke. Identifies the conversation thread.
#[derive(Debug, Clone, Default)]
pub struct RunnableConfig {
    /// Unique id for this thread. Required when using a checkpointer.
    pub thread_id: Option<String>,
}

impl RunnableConfig {
    pub fn for_thread(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: Some(thread_id.into()),
        }
    }
}

/// One checkpoint: a state snapshot with its position in the thread.
#[derive(Debug, Clone)]
pub struct Checkpoint<S> {
    pub id: String,
    pub ts: DateTime<Utc>,
    /// Zero-based invoke counter within the thread.
    pub step: u64,
    pub state: S,
}

impl<S> Checkpoint<S> {
    pub fn from_state(state: S, step: u64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            ts: Utc::now(),
            step,
            state,
        }
    }
}

/// Saves and loads checkpoints keyed by thread.
#[async_trait]
pub trait Checkpointer<S: GraphState>: Send + Sync {
    /// Persist a checkpoint. Returns the checkpoint id used.
    async fn put(
        &self,
        config: &RunnableConfig,
        checkpoint: Checkpoint<S>,
    ) -> Result<String, CheckpointError>;

    /// Load the latest checkpoint for the thread.
    async fn get(&self, config: &RunnableConfig) -> Result<Option<Checkpoint<S>>, CheckpointError>;

    /// List checkpoint ids for the thread, oldest first.
    async fn list(&self, config: &RunnableConfig) -> Result<Vec<String>, CheckpointError>;
}

fn require_thread(config: &RunnableConfig) -> Result<&str, CheckpointError> {
    config
        .thread_id
        .as_deref()
        .ok_or(CheckpointError::ThreadIdRequired)
}

/// In-memory checkpointer. State lives for the process lifetime only.
pub struct MemorySaver<S> {
    threads: RwLock<HashMap<String, Vec<Checkpoint<S>>>>,
}

impl<S> MemorySaver<S> {
    pub fn new() -> Self {
        Self {
            threads: RwLock::new(HashMap::new()),
        }
    }
}

impl<S> Default for MemorySaver<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<S: GraphState> Checkpointer<S> for MemorySaver<S> {
    async fn put(
        &self,
        config: &RunnableConfig,
        checkpoint: Checkpoint<S>,
    ) -> Result<String, CheckpointError> {
        let thread = require_thread(config)?;
        let id = checkpoint.id.clone();
        self.threads
            .write()
            .await
            .entry(thread.to_string())
            .or_default()
            .push(checkpoint);
        Ok(id)
    }

    async fn get(&self, config: &RunnableConfig) -> Result<Option<Checkpoint<S>>, CheckpointError> {
        let thread = require_thread(config)?;
        Ok(self
            .threads
            .read()
            .await
            .get(thread)
            .and_then(|cps| cps.last())
            .cloned())
    }

    async fn list(&self, config: &RunnableConfig) -> Result<Vec<String>, CheckpointError> {
        let thread = require_thread(config)?;
        Ok(self
            .threads
            .read()
            .await
            .get(thread)
            .map(|cps| cps.iter().map(|c| c.id.clone()).collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AgentState;

    #[tokio::test]
    async fn put_then_get_returns_latest() {
        let saver = MemorySaver::new();
        let config = RunnableConfig::for_thread("t1");

        saver
            .put(&config, Checkpoint::from_state(AgentState::from_user_message("one"), 0))
            .await
            .unwrap();
        saver
            .put(&config, Checkpoint::from_state(AgentState::from_user_message("two"), 1))
            .await
            .unwrap();

        let latest = saver.get(&config).await.unwrap().unwrap();
        assert_eq!(latest.step, 1);
        assert_eq!(latest.state.messages[0].content, "two");
    }

    #[tokio::test]
    async fn threads_are_isolated() {
        let saver = MemorySaver::new();
        let a = RunnableConfig::for_thread("a");
        let b = RunnableConfig::for_thread("b");

        saver
            .put(&a, Checkpoint::from_state(AgentState::from_user_message("hello"), 0))
            .await
            .unwrap();

        assert!(saver.get(&a).await.unwrap().is_some());
        assert!(saver.get(&b).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_returns_ids_oldest_first() {
        let saver = MemorySaver::new();
        let config = RunnableConfig::for_thread("t1");

        let first = saver
            .put(&config, Checkpoint::from_state(AgentState::new(), 0))
            .await
            .unwrap();
        let second = saver
            .put(&config, Checkpoint::from_state(AgentState::new(), 1))
            .await
            .unwrap();

        assert_eq!(saver.list(&config).await.unwrap(), vec![first, second]);
    }

    #[tokio::test]
    async fn missing_thread_id_is_rejected() {
        let saver: MemorySaver<AgentState> = MemorySaver::new();
        let err = saver.get(&RunnableConfig::default()).await.unwrap_err();
        assert!(matches!(err, CheckpointError::ThreadIdRequired));
    }
}
