//! MCP transports: stdio child processes and SSE endpoints.
//!
//! Both transports expose the same request/notify surface. The stdio
//! transport owns a spawned server process and multiplexes concurrent
//! requests over its pipes; the SSE transport posts JSON-RPC over HTTP
//! and decodes single-object or batch reply bodies.

use crate::protocol::{JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, ServerMessage};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tether_core::McpError;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// A JSON-RPC channel to one MCP server.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request and wait for its response payload.
    async fn request(&self, method: &str, params: Option<Value>) -> Result<Value, McpError>;

    /// Send a notification (no response expected).
    async fn notify(&self, method: &str, params: Option<Value>) -> Result<(), McpError>;
}

type PendingMap = Arc<Mutex<HashMap<i64, oneshot::Sender<Result<Value, McpError>>>>>;

// Poisoned pending maps hold only dead oneshot senders, so recovering the
// guard is always safe.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

fn map_response(response: JsonRpcResponse) -> Result<Value, McpError> {
    if let Some(error) = response.error {
        return Err(McpError::JsonRpc(format!(
            "{} (code {})",
            error.message, error.code
        )));
    }
    response
        .result
        .ok_or_else(|| McpError::Protocol("Response carries neither result nor error".into()))
}

/// Transport over a spawned child process speaking line-delimited
/// JSON-RPC on stdin/stdout.
pub struct StdioTransport {
    write_tx: mpsc::Sender<String>,
    pending: PendingMap,
    next_id: AtomicI64,
    alive: Arc<AtomicBool>,
    timeout: Duration,
    // Held so the process is killed when the transport drops.
    _child: Child,
}

impl std::fmt::Debug for StdioTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StdioTransport")
            .field("alive", &self.alive)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl StdioTransport {
    /// Spawn the server process and start the reader/writer tasks.
    pub fn spawn(
        command: &str,
        args: &[String],
        env: &HashMap<String, String>,
    ) -> Result<Self, McpError> {
        let mut cmd = Command::new(command);
        cmd.args(args)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::null())
            .kill_on_drop(true);
        for (key, value) in env {
            cmd.env(key, value);
        }

        let mut child = cmd.spawn().map_err(|e| {
            McpError::Transport(format!("Failed to spawn '{command}': {e}"))
        })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| McpError::Transport("Child has no stdin".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| McpError::Transport("Child has no stdout".into()))?;

        let alive = Arc::new(AtomicBool::new(true));
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));

        let (write_tx, mut write_rx) = mpsc::channel::<String>(64);
        let alive_writer = Arc::clone(&alive);
        tokio::spawn(async move {
            while let Some(line) = write_rx.recv().await {
                if !alive_writer.load(Ordering::SeqCst) {
                    break;
                }
                if stdin.write_all(line.as_bytes()).await.is_err()
                    || stdin.flush().await.is_err()
                {
                    alive_writer.store(false, Ordering::SeqCst);
                    break;
                }
            }
        });

        let pending_reader = Arc::clone(&pending);
        let alive_reader = Arc::clone(&alive);
        let mut reader = BufReader::new(stdout);
        tokio::spawn(async move {
            let mut line = String::new();
            loop {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) | Err(_) => {
                        alive_reader.store(false, Ordering::SeqCst);
                        break;
                    }
                    Ok(_) => match serde_json::from_str::<ServerMessage>(&line) {
                        Ok(ServerMessage::Response(response)) => {
                            let tx = lock(&pending_reader).remove(&response.id);
                            if let Some(tx) = tx {
                                let _ = tx.send(map_response(response));
                            }
                        }
                        Ok(ServerMessage::Notification(notification)) => {
                            debug!(method = %notification.method, "Ignoring server notification");
                        }
                        Err(e) => {
                            warn!(error = %e, line = %line.trim(), "Unparseable server message");
                        }
                    },
                }
            }
            // Dropping the senders fails any in-flight requests.
            lock(&pending_reader).clear();
        });

        Ok(Self {
            write_tx,
            pending,
            next_id: AtomicI64::new(1),
            alive,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            _child: child,
        })
    }

    /// Override the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl Transport for StdioTransport {
    async fn request(&self, method: &str, params: Option<Value>) -> Result<Value, McpError> {
        if !self.alive.load(Ordering::SeqCst) {
            return Err(McpError::ConnectionClosed);
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let request = JsonRpcRequest::new(id, method, params);
        let line = format!("{}\n", serde_json::to_string(&request)?);

        let (tx, rx) = oneshot::channel();
        lock(&self.pending).insert(id, tx);

        if self.write_tx.send(line).await.is_err() {
            lock(&self.pending).remove(&id);
            return Err(McpError::ConnectionClosed);
        }

        match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(McpError::ConnectionClosed),
            Err(_) => {
                lock(&self.pending).remove(&id);
                Err(McpError::Timeout(self.timeout.as_secs()))
            }
        }
    }

    async fn notify(&self, method: &str, params: Option<Value>) -> Result<(), McpError> {
        if !self.alive.load(Ordering::SeqCst) {
            return Err(McpError::ConnectionClosed);
        }
        let notification = JsonRpcNotification::new(method, params);
        let line = format!("{}\n", serde_json::to_string(&notification)?);
        self.write_tx
            .send(line)
            .await
            .map_err(|_| McpError::ConnectionClosed)
    }
}

/// Transport for SSE-style servers: JSON-RPC posted over HTTP.
///
/// Replies may be a single response object or a batch array that
/// interleaves notifications with the response.
pub struct SseTransport {
    endpoint: String,
    client: reqwest::Client,
    next_id: AtomicI64,
}

impl SseTransport {
    pub fn new(url: impl Into<String>) -> Result<Self, McpError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| McpError::Transport(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            endpoint: url.into(),
            client,
            next_id: AtomicI64::new(1),
        })
    }
}

#[async_trait]
impl Transport for SseTransport {
    async fn request(&self, method: &str, params: Option<Value>) -> Result<Value, McpError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let request = JsonRpcRequest::new(id, method, params);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| McpError::Transport(format!("HTTP request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(McpError::Transport(format!("HTTP error: {status} - {body}")));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| McpError::Transport(format!("Failed to parse JSON response: {e}")))?;

        decode_body(body, id)
    }

    async fn notify(&self, method: &str, params: Option<Value>) -> Result<(), McpError> {
        let notification = JsonRpcNotification::new(method, params);
        let response = self
            .client
            .post(&self.endpoint)
            .json(&notification)
            .send()
            .await
            .map_err(|e| McpError::Transport(format!("HTTP request failed: {e}")))?;

        // Servers typically answer notifications with 202 and an empty
        // body. Anything non-success is worth a log line but not a failure.
        if !response.status().is_success() {
            debug!(status = %response.status(), "Notification not acknowledged");
        }
        Ok(())
    }
}

/// Extract the response matching `request_id` from an HTTP reply body.
fn decode_body(body: Value, request_id: i64) -> Result<Value, McpError> {
    let mut matched: Option<Result<Value, McpError>> = None;

    let mut process = |item: Value| -> Result<(), McpError> {
        let message: ServerMessage = serde_json::from_value(item)
            .map_err(|e| McpError::Protocol(format!("Unparseable server message: {e}")))?;
        match message {
            ServerMessage::Response(response) if response.id == request_id => {
                matched = Some(map_response(response));
            }
            ServerMessage::Response(response) => {
                debug!(id = response.id, "Dropping response for unknown request");
            }
            ServerMessage::Notification(notification) => {
                debug!(method = %notification.method, "Ignoring server notification");
            }
        }
        Ok(())
    };

    match body {
        Value::Array(items) => {
            for item in items {
                process(item)?;
            }
        }
        other => process(other)?,
    }

    matched.unwrap_or_else(|| {
        Err(McpError::Protocol(format!(
            "Missing response for request id {request_id}"
        )))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    // --- decode_body ---

    #[test]
    fn decode_single_response() {
        let body = json!({"jsonrpc": "2.0", "id": 1, "result": {"tools": []}});
        let result = decode_body(body, 1).unwrap();
        assert_eq!(result, json!({"tools": []}));
    }

    #[test]
    fn decode_batch_skips_notifications() {
        let body = json!([
            {"jsonrpc": "2.0", "method": "notifications/progress", "params": {"progress": 1.0}},
            {"jsonrpc": "2.0", "id": 4, "result": {"ok": true}}
        ]);
        let result = decode_body(body, 4).unwrap();
        assert_eq!(result, json!({"ok": true}));
    }

    #[test]
    fn decode_requires_matching_id() {
        let body = json!({"jsonrpc": "2.0", "id": 2, "result": {}});
        let err = decode_body(body, 1).unwrap_err();
        assert!(matches!(err, McpError::Protocol(_)));
    }

    #[test]
    fn decode_surfaces_json_rpc_error() {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {"code": -32601, "message": "Method not found"}
        });
        let err = decode_body(body, 1).unwrap_err();
        assert!(matches!(err, McpError::JsonRpc(_)));
        assert!(err.to_string().contains("Method not found"));
    }

    // --- stdio ---

    #[tokio::test]
    async fn stdio_spawn_failure_is_reported() {
        let err = StdioTransport::spawn("definitely-not-a-real-binary", &[], &HashMap::new())
            .unwrap_err();
        assert!(matches!(err, McpError::Transport(_)));
    }

    #[tokio::test]
    async fn stdio_request_round_trip() {
        // A fixed responder: answers every line with a response for id 1.
        let script = r#"while read line; do echo '{"jsonrpc":"2.0","id":1,"result":{"ok":true}}'; done"#;
        let transport = StdioTransport::spawn("sh", &["-c".into(), script.into()], &HashMap::new())
            .unwrap()
            .with_timeout(Duration::from_secs(5));

        let result = transport.request("ping", None).await.unwrap();
        assert_eq!(result, json!({"ok": true}));
    }

    #[tokio::test]
    async fn stdio_unanswered_request_times_out() {
        // Reads input but never replies.
        let script = "while read line; do :; done";
        let transport = StdioTransport::spawn("sh", &["-c".into(), script.into()], &HashMap::new())
            .unwrap()
            .with_timeout(Duration::from_millis(100));

        let err = transport.request("ping", None).await.unwrap_err();
        assert!(matches!(err, McpError::Timeout(_)));
    }

    // --- SSE (mock HTTP server) ---

    fn header_end(buf: &[u8]) -> Option<usize> {
        buf.windows(4).position(|w| w == b"\r\n\r\n").map(|i| i + 4)
    }

    fn content_length(headers: &str) -> usize {
        headers
            .lines()
            .find_map(|line| {
                let (k, v) = line.split_once(':')?;
                if k.trim().eq_ignore_ascii_case("content-length") {
                    v.trim().parse::<usize>().ok()
                } else {
                    None
                }
            })
            .unwrap_or(0)
    }

    async fn read_json_body(stream: &mut TcpStream) -> Option<Value> {
        let mut buf = Vec::new();
        let mut chunk = [0_u8; 1024];
        let (header_end, body_len) = loop {
            let n = stream.read(&mut chunk).await.ok()?;
            if n == 0 {
                return None;
            }
            buf.extend_from_slice(&chunk[..n]);
            let Some(end) = header_end(&buf) else {
                continue;
            };
            let headers = std::str::from_utf8(&buf[..end]).ok()?;
            break (end, content_length(headers));
        };

        while buf.len() < header_end + body_len {
            let n = stream.read(&mut chunk).await.ok()?;
            if n == 0 {
                return None;
            }
            buf.extend_from_slice(&chunk[..n]);
        }

        serde_json::from_slice(&buf[header_end..header_end + body_len]).ok()
    }

    async fn spawn_http_server(
        handler: Arc<dyn Fn(Value) -> (u16, String) + Send + Sync>,
    ) -> (String, tokio::task::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind listener");
        let addr = listener.local_addr().expect("listener addr");
        let handle = tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    break;
                };
                let handler = Arc::clone(&handler);
                tokio::spawn(async move {
                    let Some(request) = read_json_body(&mut stream).await else {
                        return;
                    };
                    let (status, body) = handler(request);
                    let head = format!(
                        "HTTP/1.1 {} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                        status,
                        body.len()
                    );
                    let _ = stream.write_all(head.as_bytes()).await;
                    let _ = stream.write_all(body.as_bytes()).await;
                    let _ = stream.shutdown().await;
                });
            }
        });
        (format!("http://{}", addr), handle)
    }

    #[tokio::test]
    async fn sse_request_round_trip() {
        let (endpoint, server) = spawn_http_server(Arc::new(|request: Value| {
            let body = json!({
                "jsonrpc": "2.0",
                "id": request["id"].clone(),
                "result": {"tools": [{"name": "fetch"}]}
            });
            (200, body.to_string())
        }))
        .await;

        let transport = SseTransport::new(endpoint).unwrap();
        let result = transport.request("tools/list", None).await.unwrap();
        server.abort();

        assert_eq!(result["tools"][0]["name"], json!("fetch"));
    }

    #[tokio::test]
    async fn sse_http_error_status_is_reported() {
        let (endpoint, server) =
            spawn_http_server(Arc::new(|_| (500, "upstream error".to_string()))).await;

        let transport = SseTransport::new(endpoint).unwrap();
        let err = transport.request("tools/list", None).await.unwrap_err();
        server.abort();

        assert!(matches!(err, McpError::Transport(_)));
        assert!(err.to_string().contains("HTTP error"));
    }

    #[tokio::test]
    async fn sse_json_rpc_error_is_reported() {
        let (endpoint, server) = spawn_http_server(Arc::new(|request: Value| {
            let body = json!({
                "jsonrpc": "2.0",
                "id": request["id"].clone(),
                "error": {"code": -32000, "message": "rpc failed"}
            });
            (200, body.to_string())
        }))
        .await;

        let transport = SseTransport::new(endpoint).unwrap();
        let err = transport.request("tools/list", None).await.unwrap_err();
        server.abort();

        assert!(matches!(err, McpError::JsonRpc(_)));
    }
}
