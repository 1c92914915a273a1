//! # Tether Core
//!
//! Domain types, traits, and error definitions for the tether agent graph.
//! This crate has **zero framework dependencies** — it defines the domain
//! model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every collaborator is defined as a trait here: the LLM provider, the tool
//! abstraction the agent loop executes against, and the connection
//! descriptors other systems hand us. Implementations live in their
//! respective crates, which keeps the dependency graph pointing inward and
//! makes every seam mockable in tests.

pub mod connection;
pub mod error;
pub mod message;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use connection::{McpConfig, ServerConnection};
pub use error::{Error, McpError, ProviderError, Result, ToolError};
pub use message::{Message, MessageToolCall, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, ToolDefinition, Usage};
pub use tool::{Tool, ToolCall, ToolRegistry, ToolResult};
