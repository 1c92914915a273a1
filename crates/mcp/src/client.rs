//! Multi-server MCP client.
//!
//! Connects to every server in an [`McpConfig`], runs the initialize
//! handshake, and bridges the servers' tools into the core [`Tool`]
//! trait so the reasoning loop can execute them like any other tool.

use crate::protocol::{
    CallToolParams, CallToolResult, InitializeParams, InitializeResult, McpToolSpec,
    ToolsListResult,
};
use crate::transport::{SseTransport, StdioTransport, Transport};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tether_core::{McpConfig, McpError, ServerConnection, Tool, ToolError, ToolRegistry, ToolResult};
use tracing::{debug, info};

/// Separator between server name and tool name in namespaced tool names.
const NAMESPACE_SEPARATOR: &str = "__";

/// Qualify a tool name with its server so tools from different servers
/// never collide in the registry.
fn namespaced(server: &str, tool: &str) -> String {
    format!("{server}{NAMESPACE_SEPARATOR}{tool}")
}

/// A client holding live connections to zero or more MCP servers.
pub struct McpClient {
    servers: HashMap<String, Arc<dyn Transport>>,
}

impl std::fmt::Debug for McpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpClient")
            .field("servers", &self.servers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl McpClient {
    /// Connect to every server in the config.
    ///
    /// All-or-nothing: any server that fails to connect or complete the
    /// handshake fails the whole call.
    pub async fn connect(config: &McpConfig) -> Result<Self, McpError> {
        let mut servers: HashMap<String, Arc<dyn Transport>> = HashMap::new();
        for (name, connection) in config {
            let transport = connect_server(name, connection).await?;
            servers.insert(name.clone(), transport);
        }
        Ok(Self { servers })
    }

    /// Number of connected servers.
    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    /// Names of connected servers, sorted for stable output.
    pub fn server_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.servers.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Enumerate every tool on every connected server.
    pub async fn list_tools(&self) -> Result<Vec<McpToolHandle>, McpError> {
        let names = self.server_names();

        let mut handles = Vec::new();
        for name in names {
            let transport = Arc::clone(&self.servers[name]);
            let raw = transport.request("tools/list", Some(json!({}))).await?;
            let list: ToolsListResult = serde_json::from_value(raw)?;
            debug!(server = %name, count = list.tools.len(), "Enumerated tools");
            for spec in list.tools {
                handles.push(McpToolHandle::new(name, spec, Arc::clone(&transport)));
            }
        }
        Ok(handles)
    }

    /// Build a tool registry from all connected servers' tools.
    pub async fn tool_registry(&self) -> Result<ToolRegistry, McpError> {
        let mut registry = ToolRegistry::new();
        for handle in self.list_tools().await? {
            registry.register(Box::new(handle));
        }
        Ok(registry)
    }
}

async fn connect_server(
    name: &str,
    connection: &ServerConnection,
) -> Result<Arc<dyn Transport>, McpError> {
    let failed = |reason: String| McpError::ConnectionFailed {
        server: name.to_string(),
        reason,
    };

    let transport: Arc<dyn Transport> = match connection {
        ServerConnection::Stdio { command, args, env } => Arc::new(
            StdioTransport::spawn(command, args, env).map_err(|e| failed(e.to_string()))?,
        ),
        ServerConnection::Sse { url } => {
            Arc::new(SseTransport::new(url.clone()).map_err(|e| failed(e.to_string()))?)
        }
    };

    let params = InitializeParams::new("tether", env!("CARGO_PKG_VERSION"));
    let raw = transport
        .request("initialize", Some(serde_json::to_value(&params)?))
        .await
        .map_err(|e| failed(e.to_string()))?;
    let init: InitializeResult =
        serde_json::from_value(raw).map_err(|e| failed(format!("Bad initialize result: {e}")))?;

    info!(
        server = %name,
        transport = %connection.transport_label(),
        protocol = %init.protocol_version,
        "Connected to MCP server"
    );

    // Best effort; some HTTP servers never acknowledge this.
    let _ = transport.notify("notifications/initialized", None).await;

    Ok(transport)
}

/// A remote MCP tool exposed through the core [`Tool`] trait.
///
/// Registered under `server__tool` so the model's tool choice routes
/// back to the right server.
pub struct McpToolHandle {
    name: String,
    remote_name: String,
    description: String,
    schema: Value,
    transport: Arc<dyn Transport>,
}

impl McpToolHandle {
    fn new(server: &str, spec: McpToolSpec, transport: Arc<dyn Transport>) -> Self {
        Self {
            name: namespaced(server, &spec.name),
            remote_name: spec.name,
            description: spec.description.unwrap_or_default(),
            schema: spec.input_schema,
            transport,
        }
    }
}

#[async_trait]
impl Tool for McpToolHandle {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters_schema(&self) -> Value {
        self.schema.clone()
    }

    async fn execute(&self, arguments: Value) -> Result<ToolResult, ToolError> {
        let params = CallToolParams {
            name: self.remote_name.clone(),
            arguments: Some(arguments),
        };
        let params_value = serde_json::to_value(&params).map_err(|e| {
            ToolError::InvalidArguments(format!("Unserializable arguments: {e}"))
        })?;

        let raw = self
            .transport
            .request("tools/call", Some(params_value))
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: self.name.clone(),
                reason: e.to_string(),
            })?;

        let result: CallToolResult =
            serde_json::from_value(raw).map_err(|e| ToolError::ExecutionFailed {
                tool_name: self.name.clone(),
                reason: format!("Bad tool result: {e}"),
            })?;

        // Server-reported tool failures flow back to the model as failed
        // results rather than aborting the loop.
        if result.is_error == Some(true) {
            return Ok(ToolResult::failure(result.text()));
        }
        Ok(ToolResult::success(result.text()))
    }
}
