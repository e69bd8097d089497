//! Transport front-ends.
//!
//! The default transport reads line-delimited JSON-RPC requests from
//! stdin and writes responses to stdout, one line per message. The HTTP
//! variant exposes the same dispatcher behind a POST endpoint and
//! allows concurrent in-flight requests. Both shut down when the
//! cancellation token fires.
//!
//! All business logic lives in the dispatcher; the transports only
//! frame, parse and reply.

use crate::server::McpServer;
use crate::types::{McpError, McpRequest, McpResponse, RequestId};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::Value;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Serve the MCP protocol over stdin/stdout.
///
/// Runs until stdin closes or the token is cancelled. Log output must
/// go to stderr; stdout carries only protocol frames.
pub async fn serve_stdio(
    server: Arc<McpServer>,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                debug!("stdio transport shutting down");
                break;
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                if let Some(response) = handle_frame(&server, line).await {
                    let mut payload = serde_json::to_string(&response)
                        .map_err(std::io::Error::other)?;
                    payload.push('\n');
                    stdout.write_all(payload.as_bytes()).await?;
                    stdout.flush().await?;
                }
            }
        }
    }

    Ok(())
}

/// Parse one frame and dispatch it. Notifications (frames without an
/// `id`) get no response; unparseable frames answer with a protocol
/// error rather than tearing the loop down.
async fn handle_frame(server: &McpServer, frame: &str) -> Option<McpResponse> {
    let value: Value = match serde_json::from_str(frame) {
        Ok(value) => value,
        Err(_) => {
            return Some(McpResponse::error(RequestId::Null, McpError::parse_error()));
        }
    };

    if value.get("id").is_none() {
        debug!(method = value.get("method").and_then(|v| v.as_str()), "ignoring notification");
        return None;
    }

    match serde_json::from_value::<McpRequest>(value) {
        Ok(request) => Some(server.handle_request(request).await),
        Err(e) => Some(McpResponse::error(
            RequestId::Null,
            McpError::new(McpError::INVALID_REQUEST, e.to_string()),
        )),
    }
}

/// Serve the MCP protocol over streamable HTTP.
pub async fn serve_http(
    server: Arc<McpServer>,
    addr: &str,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let app = Router::new()
        .route("/mcp", post(handle_http))
        .with_state(server);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "MCP server ready (streamable HTTP)");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}

async fn handle_http(State(server): State<Arc<McpServer>>, Json(value): Json<Value>) -> Response {
    if value.get("id").is_none() {
        // Notification: acknowledged, never answered.
        return StatusCode::ACCEPTED.into_response();
    }

    match serde_json::from_value::<McpRequest>(value) {
        Ok(request) => Json(server.handle_request(request).await).into_response(),
        Err(e) => Json(McpResponse::error(
            RequestId::Null,
            McpError::new(McpError::INVALID_REQUEST, e.to_string()),
        ))
        .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server() -> McpServer {
        McpServer::cluster()
    }

    #[tokio::test]
    async fn test_handle_frame_parse_error() {
        let response = handle_frame(&server(), "{not json").await.unwrap();
        assert_eq!(response.error.unwrap().code, McpError::PARSE_ERROR);
    }

    #[tokio::test]
    async fn test_handle_frame_ignores_notifications() {
        let response = handle_frame(
            &server(),
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
        )
        .await;
        assert!(response.is_none());
    }

    #[tokio::test]
    async fn test_handle_frame_dispatches_request() {
        let response = handle_frame(
            &server(),
            r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#,
        )
        .await
        .unwrap();
        assert!(response.error.is_none());
        assert!(response.result.unwrap().get("tools").is_some());
    }

    #[tokio::test]
    async fn test_handle_frame_unknown_method() {
        let response = handle_frame(
            &server(),
            r#"{"jsonrpc":"2.0","id":"x","method":"resources/list"}"#,
        )
        .await
        .unwrap();
        assert_eq!(response.error.unwrap().code, McpError::METHOD_NOT_FOUND);
    }
}
