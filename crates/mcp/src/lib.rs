//! Multi-server MCP client: stdio and SSE transports, the JSON-RPC
//! subset they speak, and the bridge from remote tools into the core
//! tool registry.

pub mod client;
pub mod protocol;
pub mod transport;

pub use client::{McpClient, McpToolHandle};
pub use transport::{SseTransport, StdioTransport, Transport};
