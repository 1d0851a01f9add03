//! JSON-RPC 2.0 and MCP message types.
//!
//! Frames are newline-delimited JSON on the server's stdio.
//!
//! - **Requests**: client → server (`initialize`, `tools/list`, `tools/call`)
//! - **Responses**: server → client (result or error)
//! - **Notifications**: either direction, no `id`
//! - **Incoming requests**: server → client (`ping`, `roots/list`, ...)

use relay_domain::{RawToolOutput, ToolDescriptor};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::atomic::{AtomicU64, Ordering};

/// MCP revision sent in `initialize`
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// JSON-RPC "method not found"
pub const METHOD_NOT_FOUND: i64 = -32601;

static REQUEST_ID: AtomicU64 = AtomicU64::new(1);

fn next_id() -> u64 {
    REQUEST_ID.fetch_add(1, Ordering::SeqCst)
}

/// JSON-RPC request
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    /// Creates a new request with a process-unique id.
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            id: next_id(),
            method: method.into(),
            params,
        }
    }
}

/// JSON-RPC notification (no response expected)
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcNotification {
    pub jsonrpc: &'static str,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcNotification {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            method: method.into(),
            params: None,
        }
    }
}

/// JSON-RPC response
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub jsonrpc: String,
    pub id: Option<u64>,
    pub result: Option<Value>,
    pub error: Option<RpcError>,
}

/// JSON-RPC error object
#[derive(Debug, Clone, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    pub data: Option<Value>,
}

/// Our reply to a server-initiated request.
pub fn reply_to(id: u64, method: &str) -> Value {
    if method == "ping" {
        json!({ "jsonrpc": "2.0", "id": id, "result": {} })
    } else {
        json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": { "code": METHOD_NOT_FOUND, "message": format!("Method not found: {}", method) },
        })
    }
}

/// Classification of an incoming frame.
#[derive(Debug, PartialEq, Eq)]
pub enum MessageKind {
    /// A response to one of our requests (has `id`, no `method`)
    Response,
    /// A request from the server (has `id` and `method`)
    IncomingRequest { id: u64 },
    /// A notification (has `method`, no `id`)
    Notification,
}

pub fn classify_message(json: &Value) -> MessageKind {
    let has_id = json.get("id").and_then(|v| v.as_u64());
    let has_method = json.get("method").and_then(|v| v.as_str());

    match (has_id, has_method) {
        (Some(id), Some(_)) => MessageKind::IncomingRequest { id },
        (Some(_), None) => MessageKind::Response,
        _ => MessageKind::Notification,
    }
}

// ==================== MCP payloads ====================

pub fn initialize_params() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {},
        "clientInfo": { "name": "tool-relay", "version": env!("CARGO_PKG_VERSION") },
    })
}

/// One page of `tools/list`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolsListResult {
    #[serde(default)]
    pub tools: Vec<ToolDescriptor>,
    pub next_cursor: Option<String>,
}

pub fn tools_list_params(cursor: Option<&str>) -> Option<Value> {
    cursor.map(|c| json!({ "cursor": c }))
}

pub fn tools_call_params(name: &str, arguments: &Value) -> Value {
    let arguments = if arguments.is_null() {
        json!({})
    } else {
        arguments.clone()
    };
    json!({ "name": name, "arguments": arguments })
}

/// `tools/call` result
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToolResult {
    #[serde(default)]
    pub content: Value,
    pub structured_content: Option<Value>,
    #[serde(default)]
    pub is_error: bool,
}

impl From<CallToolResult> for RawToolOutput {
    fn from(result: CallToolResult) -> Self {
        let content = match (result.content, result.structured_content) {
            (Value::Null, Some(structured)) => structured,
            (Value::Array(items), Some(structured)) if items.is_empty() => structured,
            (content, _) => content,
        };
        RawToolOutput {
            content,
            is_error: result.is_error,
        }
    }
}
