//! MCP server connection descriptors.
//!
//! This is the one externally visible contract of the system: callers hand
//! the chat node a map from server name to connection descriptor, and each
//! descriptor is exactly one of two shapes, discriminated by the `transport`
//! tag:
//!
//! ```json
//! { "command": "uvx", "args": ["mcp-server-fetch"], "transport": "stdio" }
//! { "url": "http://localhost:8000/sse", "transport": "sse" }
//! ```
//!
//! Entries missing the tag fail deserialization before any connection
//! attempt is made.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Tool-server configuration: server name → connection descriptor.
pub type McpConfig = HashMap<String, ServerConnection>;

/// How to reach one MCP server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "transport", rename_all = "lowercase")]
pub enum ServerConnection {
    /// Local process: spawn `command` with `args` and speak JSON-RPC over
    /// its stdin/stdout.
    Stdio {
        command: String,
        #[serde(default)]
        args: Vec<String>,
        /// Extra environment for the child process. Not part of the minimal
        /// contract; defaults to empty.
        #[serde(default, skip_serializing_if = "HashMap::is_empty")]
        env: HashMap<String, String>,
    },
    /// Network server: JSON-RPC posted to `url`.
    Sse { url: String },
}

impl ServerConnection {
    /// Short label for logs.
    pub fn transport_label(&self) -> &'static str {
        match self {
            ServerConnection::Stdio { .. } => "stdio",
            ServerConnection::Sse { .. } => "sse",
        }
    }
}
