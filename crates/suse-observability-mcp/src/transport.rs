//! MCP transports
//!
//! - stdio: newline-delimited JSON-RPC on stdin/stdout
//! - HTTP: `POST /mcp` with one JSON-RPC message per request
//!
//! Both decode with [`handle_message`], so parse errors and notifications
//! behave the same on either transport.

use crate::server::McpServer;
use crate::types::{McpError, McpRequest, McpResponse, RequestId};
use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info};

/// HTTP route serving JSON-RPC.
pub const MCP_PATH: &str = "/mcp";

/// Parse error response; the request id is unknown so it is null.
fn parse_error(e: impl std::fmt::Display) -> McpResponse {
    let error = McpError::parse_error().with_data(serde_json::json!(e.to_string()));
    McpResponse::error(RequestId::Null, error)
}

/// Decode one raw JSON-RPC message and dispatch it.
///
/// Returns `None` for notifications. Undecodable input yields a parse error
/// with a null id.
pub async fn handle_message(server: &McpServer, raw: &str) -> Option<McpResponse> {
    let request: McpRequest = match serde_json::from_str(raw) {
        Ok(request) => request,
        Err(e) => {
            error!("Invalid JSON-RPC message: {}", e);
            return Some(parse_error(e));
        }
    };
    server.handle_request(request).await
}

/// Serve newline-delimited JSON-RPC until `reader` hits EOF.
///
/// Lines that are not UTF-8 are answered with a parse error like any other
/// undecodable message.
pub async fn serve_lines<R, W>(server: &McpServer, mut reader: R, mut writer: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .await
            .context("Failed to read request")?;
        if read == 0 {
            break;
        }

        let response = match std::str::from_utf8(&buf) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                debug!("Received request: {}", line);
                handle_message(server, line).await
            }
            Err(e) => {
                error!("Request is not valid UTF-8: {}", e);
                Some(parse_error(e))
            }
        };

        let Some(response) = response else {
            continue;
        };

        let response_str = serde_json::to_string(&response)?;
        debug!("Sending response: {}", response_str);
        writer.write_all(response_str.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }

    info!("EOF on input, shutting down");
    Ok(())
}

/// Serve MCP over the process's stdin/stdout.
pub async fn run_stdio(server: Arc<McpServer>) -> Result<()> {
    info!("Serving MCP over stdio");
    let reader = BufReader::new(tokio::io::stdin());
    serve_lines(&server, reader, tokio::io::stdout()).await
}

/// MCP HTTP handler.
///
/// Answers with the JSON-RPC response, or `202 Accepted` and an empty body
/// for notifications.
pub async fn mcp_handler(State(server): State<Arc<McpServer>>, body: String) -> Response {
    match handle_message(&server, &body).await {
        Some(response) => {
            let status = match &response.error {
                Some(e) if e.code == McpError::PARSE_ERROR => StatusCode::BAD_REQUEST,
                _ => StatusCode::OK,
            };
            (status, Json(response)).into_response()
        }
        None => StatusCode::ACCEPTED.into_response(),
    }
}

/// Router exposing the MCP endpoint.
pub fn router(server: Arc<McpServer>) -> Router {
    Router::new()
        .route(MCP_PATH, post(mcp_handler))
        .with_state(server)
}

/// Serve MCP over HTTP until Ctrl-C.
pub async fn run_http(server: Arc<McpServer>, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Serving MCP over HTTP on http://{}{}", listener.local_addr()?, MCP_PATH);

    axum::serve(listener, router(server))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
            }
            info!("Shutdown signal received");
        })
        .await
        .context("HTTP server error")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::{McpServerResult, Tool, ToolContext};
    use crate::types::{ToolDefinition, ToolResult};
    use async_trait::async_trait;
    use serde_json::{json, Value};

    struct PingTool;

    #[async_trait]
    impl Tool for PingTool {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition::new("pong", "Answer pong").with_category("test")
        }

        async fn execute(
            &self,
            _args: Value,
            _context: &ToolContext,
        ) -> McpServerResult<ToolResult> {
            Ok(ToolResult::text("pong"))
        }
    }

    async fn server() -> Arc<McpServer> {
        let server = McpServer::new("test", "0.0.0");
        server.register_tool(Arc::new(PingTool)).await;
        Arc::new(server)
    }

    async fn run_lines(input: &str) -> Vec<Value> {
        run_bytes(input.as_bytes()).await
    }

    async fn run_bytes(input: &[u8]) -> Vec<Value> {
        let server = server().await;
        let mut output = Vec::new();
        serve_lines(&server, input, &mut output).await.unwrap();
        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_stdio_session() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"pong"}}"#,
            "\n",
        );
        let responses = run_lines(input).await;

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["id"], 1);
        assert_eq!(responses[0]["result"]["serverInfo"]["name"], "test");
        assert_eq!(responses[1]["id"], 2);
        assert_eq!(responses[1]["result"]["content"][0]["text"], "pong");
    }

    #[tokio::test]
    async fn test_stdio_parse_error() {
        let responses = run_lines("{not json\n").await;
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0]["id"], Value::Null);
        assert_eq!(responses[0]["error"]["code"], -32700);
    }

    #[tokio::test]
    async fn test_stdio_invalid_utf8_keeps_serving() {
        let mut input = b"\xff\xfe garbage\n".to_vec();
        input.extend_from_slice(br#"{"jsonrpc":"2.0","id":7,"method":"ping"}"#);
        input.push(b'\n');

        let responses = run_bytes(&input).await;

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["id"], Value::Null);
        assert_eq!(responses[0]["error"]["code"], -32700);
        assert_eq!(responses[1]["id"], 7);
        assert!(responses[1]["result"].is_object());
    }

    #[tokio::test]
    async fn test_stdio_last_line_without_newline() {
        let responses = run_lines(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#).await;
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0]["id"], 1);
    }

    #[tokio::test]
    async fn test_stdio_eof_without_input() {
        assert!(run_lines("").await.is_empty());
    }

    async fn http(body: &str) -> (StatusCode, Vec<u8>) {
        let response = mcp_handler(State(server().await), body.to_string()).await;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes.to_vec())
    }

    #[tokio::test]
    async fn test_http_request() {
        let (status, body) = http(r#"{"jsonrpc":"2.0","id":"a","method":"tools/list"}"#).await;
        assert_eq!(status, StatusCode::OK);
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["id"], "a");
        assert_eq!(value["result"]["tools"][0]["name"], "pong");
    }

    #[tokio::test]
    async fn test_http_notification_accepted() {
        let (status, body) =
            http(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_http_parse_error() {
        let (status, body) = http("nope").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["error"]["code"], -32700);
    }

    #[tokio::test]
    async fn test_http_tool_error_is_ok_status() {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 3,
            "method": "tools/call",
            "params": {"name": "missing"}
        })
        .to_string();
        let (status, body) = http(&body).await;
        assert_eq!(status, StatusCode::OK);
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["error"]["code"], McpError::INVALID_PARAMS);
    }
}
