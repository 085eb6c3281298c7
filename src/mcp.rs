//! MCP (Model Context Protocol) JSON-RPC handler.
//!
//! Implements the [MCP specification](https://spec.modelcontextprotocol.io/)
//! over stdio: reads JSON-RPC 2.0 requests from stdin (one per line) and
//! writes responses to stdout. Requests are handled one at a time.
//!
//! ## Supported methods
//!
//! | Method              | Description                      |
//! |---------------------|----------------------------------|
//! | `initialize`        | Handshake, returns capabilities  |
//! | `tools/list`        | List available tool definitions  |
//! | `tools/call`        | Execute a tool and return result |
//! | `ping`              | Liveness check                   |
//!
//! Notifications (`notifications/initialized`, `notifications/cancelled`) are
//! acknowledged silently.

use std::io;

use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, warn};

use crate::tools::{self, Gateway};

const SERVER_NAME: &str = "mcp-proxmox";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
const PROTOCOL_VERSION: &str = "2024-11-05";

const PARSE_ERROR: i64 = -32700;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;

/// Run the MCP server on stdio until EOF.
pub async fn run_stdio(gateway: &Gateway) -> io::Result<()> {
    serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout(), gateway).await
}

/// Process line-delimited JSON-RPC from `reader`, writing responses to `writer`.
///
/// Returns `Ok(())` at EOF. Read or write failures end the loop with an error.
pub async fn serve<R, W>(mut reader: R, mut writer: W, gateway: &Gateway) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut line = String::new();

    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            debug!("stdin closed");
            return Ok(());
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if let Some(response) = handle_message(trimmed, gateway).await {
            write_response(&mut writer, &response).await?;
        }
    }
}

/// Handle one raw JSON-RPC message. Returns `None` for notifications.
pub async fn handle_message(raw: &str, gateway: &Gateway) -> Option<Value> {
    let request: Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            return Some(error_response(
                Value::Null,
                PARSE_ERROR,
                format!("Parse error: {e}"),
            ))
        }
    };

    let method = request.get("method").and_then(Value::as_str).unwrap_or("");

    // Notifications (no id): never answered
    let Some(id) = request.get("id").cloned() else {
        match method {
            "notifications/initialized" | "notifications/cancelled" => {}
            _ => debug!(method, "ignoring unknown notification"),
        }
        return None;
    };

    let response = match method {
        "initialize" => result_response(id, handle_initialize()),
        "tools/list" => result_response(id, json!({ "tools": tools::tool_definitions() })),
        "tools/call" => handle_tools_call(id, &request, gateway).await,
        "ping" => result_response(id, json!({})),
        _ => {
            warn!(method, "unknown method");
            error_response(id, METHOD_NOT_FOUND, format!("Method not found: {method}"))
        }
    };
    Some(response)
}

/// Protocol version, capabilities, and server info.
fn handle_initialize() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {
            "tools": { "listChanged": false }
        },
        "serverInfo": {
            "name": SERVER_NAME,
            "version": SERVER_VERSION
        }
    })
}

/// Dispatch `tools/call` to the gateway. Tool failures are reported in the
/// result with `isError`, not as JSON-RPC errors.
async fn handle_tools_call(id: Value, request: &Value, gateway: &Gateway) -> Value {
    let params = request.get("params").cloned().unwrap_or_else(|| json!({}));
    let Some(name) = params.get("name").and_then(Value::as_str) else {
        return error_response(id, INVALID_PARAMS, "Invalid params: missing tool name".into());
    };
    let args = params.get("arguments").cloned().unwrap_or_else(|| json!({}));

    let result = gateway.call(name, &args).await;

    let mut response_result = json!({ "content": result.content });
    if result.is_error {
        response_result["isError"] = json!(true);
    }
    result_response(id, response_result)
}

fn result_response(id: Value, result: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

fn error_response(id: Value, code: i64, message: String) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": code, "message": message }
    })
}

/// Write a JSON-RPC message (one line, flushed immediately).
async fn write_response<W: AsyncWrite + Unpin>(writer: &mut W, response: &Value) -> io::Result<()> {
    let mut output = serde_json::to_string(response)?;
    output.push('\n');
    writer.write_all(output.as_bytes()).await?;
    writer.flush().await
}
