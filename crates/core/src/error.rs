//! Error types for the tether domain.
//!
//! Uses `thiserror` for ergonomic error definitions. Each bounded context
//! has its own error enum; the top-level `Error` collects them via `#[from]`
//! so failures bubble out of the graph with their origin intact. There is no
//! retry or translation layer — the caller sees what actually broke.

use thiserror::Error;

/// The top-level error type for all tether operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- MCP client errors ---
    #[error("MCP error: {0}")]
    Mcp(#[from] McpError),

    // --- Graph execution ---
    #[error("Graph error: {message}")]
    Graph { message: String },

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
}

/// Failures from the MCP client: spawning or reaching a server, or the
/// JSON-RPC layer. A tool call the server itself marks failed is not an
/// error here; it comes back as a failed tool result for the model to see.
#[derive(Debug, Error)]
pub enum McpError {
    #[error("Failed to connect to server '{server}': {reason}")]
    ConnectionFailed { server: String, reason: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("JSON-RPC error: {0}")]
    JsonRpc(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_status() {
        let err = Error::Provider(ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn mcp_error_carries_server_name() {
        let err = Error::Mcp(McpError::ConnectionFailed {
            server: "search".into(),
            reason: "spawn failed".into(),
        });
        assert!(err.to_string().contains("search"));
        assert!(err.to_string().contains("spawn failed"));
    }

    #[test]
    fn tool_error_displays_reason() {
        let err = Error::Tool(ToolError::ExecutionFailed {
            tool_name: "search__query".into(),
            reason: "upstream timeout".into(),
        });
        assert!(err.to_string().contains("search__query"));
        assert!(err.to_string().contains("upstream timeout"));
    }
}
