/// MCP Protocol Handling
///
/// JSON-RPC 2.0 request/response structures and the MCP methods served by
/// this endpoint: initialize, ping, tools/list and tools/call. Notifications
/// are accepted and never answered.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::core::error::{CallError, HttpError};
use crate::core::registry::ToolRegistry;
use crate::core::transport::Exchange;

pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;
/// Implementation-defined server error, used for transport rejections.
pub const SERVER_ERROR: i32 = -32000;

/// Protocol revisions this server can speak, newest first.
pub static SUPPORTED_PROTOCOL_VERSIONS: [&str; 4] =
    ["2025-06-18", "2025-03-26", "2024-11-05", "2024-10-07"];

/// Application state shared across all worker threads.
///
/// Cloned into every worker; the registry itself is never copied.
#[derive(Clone)]
pub struct AppState {
    /// Server name as reported in MCP initialize responses
    pub server_name: String,
    /// Server version string as reported in MCP initialize responses
    pub server_version: String,
    /// Frozen tool registry
    pub registry: Arc<ToolRegistry>,
}

/// JSON-RPC 2.0 request. A missing id marks a notification.
#[derive(Deserialize, Debug, Clone)]
pub struct MCPRequest {
    /// Protocol marker, must be "2.0"
    jsonrpc: String,
    /// Request identifier echoed in the response. An explicit `null` is
    /// kept as `Some(Value::Null)` so it is not mistaken for a notification.
    #[serde(default, deserialize_with = "present_id")]
    id: Option<Value>,
    /// MCP method name (e.g., "tools/call")
    method: String,
    /// Method parameters, if any
    #[serde(default)]
    params: Option<Value>,
}

impl MCPRequest {
    /// Method name of the request.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// True when the message has no id and must not be answered.
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

fn present_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

/// JSON-RPC 2.0 response. Exactly one of result or error is present.
#[derive(Serialize, Debug, Clone)]
pub struct MCPResponse {
    /// Always "2.0"
    jsonrpc: &'static str,
    /// Id of the request being answered; null for transport rejections
    id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<MCPError>,
}

impl MCPResponse {
    /// Successful response.
    ///
    /// # Arguments
    /// * `id` - Id of the request being answered
    /// * `result` - Method result
    pub fn result(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Error response.
    ///
    /// # Arguments
    /// * `id` - Id of the request being answered, or None if it is unknown
    /// * `error` - Code and message
    pub fn error(id: Option<Value>, error: MCPError) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// JSON-RPC 2.0 error object.
#[derive(Serialize, Debug, Clone)]
pub struct MCPError {
    /// JSON-RPC error code (e.g., -32602 for invalid params)
    code: i32,
    /// Human-readable description
    message: String,
    /// Optional structured detail
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl MCPError {
    /// Error without additional data.
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

/// A POST body: one message or a batch.
#[derive(Debug)]
pub enum Envelope {
    /// A single JSON object
    Single(MCPRequest),
    /// A non-empty JSON array of requests and notifications
    Batch(Vec<MCPRequest>),
}

impl Envelope {
    /// Parse a request body.
    ///
    /// Malformed JSON is a parse error; well-formed JSON that is not a
    /// JSON-RPC 2.0 request (or an empty batch) is an invalid request.
    pub fn parse(body: &[u8]) -> Result<Self, HttpError> {
        let value: Value =
            serde_json::from_slice(body).map_err(|e| HttpError::Parse(e.to_string()))?;

        let envelope = match value {
            Value::Array(items) => {
                if items.is_empty() {
                    return Err(HttpError::InvalidRequest("empty batch".to_string()));
                }
                let requests = items
                    .into_iter()
                    .map(parse_request)
                    .collect::<Result<Vec<_>, _>>()?;
                Self::Batch(requests)
            }
            other => Self::Single(parse_request(other)?),
        };
        Ok(envelope)
    }

    /// Messages in the order they appeared in the body.
    pub fn into_requests(self) -> Vec<MCPRequest> {
        match self {
            Self::Single(req) => vec![req],
            Self::Batch(reqs) => reqs,
        }
    }

    /// True when the body was a JSON array, even with one element.
    pub fn is_batch(&self) -> bool {
        matches!(self, Self::Batch(_))
    }
}

fn parse_request(value: Value) -> Result<MCPRequest, HttpError> {
    let req: MCPRequest =
        serde_json::from_value(value).map_err(|e| HttpError::InvalidRequest(e.to_string()))?;
    if req.jsonrpc != "2.0" {
        return Err(HttpError::InvalidRequest(format!(
            "unsupported jsonrpc version: {}",
            req.jsonrpc
        )));
    }
    match &req.id {
        None | Some(Value::String(_) | Value::Number(_)) => Ok(req),
        Some(other) => Err(HttpError::InvalidRequest(format!(
            "id must be a string or number, got {}",
            other
        ))),
    }
}

/// Route one request to its method handler.
///
/// Returns None for notifications, which never get a reply.
pub fn handle_request(
    state: &AppState,
    exchange: &mut Exchange,
    req: MCPRequest,
) -> Option<MCPResponse> {
    if req.is_notification() {
        tracing::debug!(method = %req.method, "notification received");
        return None;
    }

    let response = match req.method.as_str() {
        "initialize" => handle_initialize(state, req.id, req.params.as_ref()),
        "ping" => MCPResponse::result(req.id, serde_json::json!({})),
        "tools/list" => handle_tools_list(state, req.id),
        "tools/call" => handle_tools_call(state, exchange, req.id, req.params),
        _ => MCPResponse::error(
            req.id,
            MCPError::new(METHOD_NOT_FOUND, format!("Method not found: {}", req.method)),
        ),
    };
    Some(response)
}

/// Pick the protocol version to answer with.
///
/// A supported client version is echoed back; anything else gets the latest.
pub fn negotiate_protocol_version(requested: Option<&str>) -> &'static str {
    requested
        .and_then(|v| SUPPORTED_PROTOCOL_VERSIONS.iter().find(|s| **s == v).copied())
        .unwrap_or(SUPPORTED_PROTOCOL_VERSIONS[0])
}

fn handle_initialize(state: &AppState, id: Option<Value>, params: Option<&Value>) -> MCPResponse {
    let requested = params
        .and_then(|p| p.get("protocolVersion"))
        .and_then(Value::as_str);

    MCPResponse::result(
        id,
        serde_json::json!({
            "protocolVersion": negotiate_protocol_version(requested),
            "capabilities": {
                "tools": {}
            },
            "serverInfo": {
                "name": state.server_name,
                "version": state.server_version
            }
        }),
    )
}

fn handle_tools_list(state: &AppState, id: Option<Value>) -> MCPResponse {
    let tools: Vec<_> = state.registry.tools().collect();
    MCPResponse::result(id, serde_json::json!({ "tools": tools }))
}

fn handle_tools_call(
    state: &AppState,
    exchange: &mut Exchange,
    id: Option<Value>,
    params: Option<Value>,
) -> MCPResponse {
    let Some(tool_name) = params
        .as_ref()
        .and_then(|p| p.get("name"))
        .and_then(Value::as_str)
    else {
        return MCPResponse::error(
            id,
            MCPError::new(INVALID_PARAMS, "Invalid params: missing tool name"),
        );
    };

    // Absent arguments are validated as an empty object
    let arguments = params
        .as_ref()
        .and_then(|p| p.get("arguments"))
        .cloned()
        .unwrap_or(Value::Null);

    match exchange.call_tool(&state.registry, tool_name, &arguments) {
        Ok(result) => match serde_json::to_string(&result) {
            Ok(text) => MCPResponse::result(id, text_content(text, false)),
            Err(e) => MCPResponse::result(id, text_content(format!("Error: {}", e), true)),
        },
        Err(CallError::Failed(e)) => {
            MCPResponse::result(id, text_content(format!("Error: {}", e), true))
        }
        Err(e @ (CallError::NotFound(_) | CallError::Invalid { .. })) => {
            MCPResponse::error(id, MCPError::new(INVALID_PARAMS, e.to_string()))
        }
    }
}

/// Wrap a string in a single-item text content result.
fn text_content(text: String, is_error: bool) -> Value {
    serde_json::json!({
        "content": [
            {
                "type": "text",
                "text": text
            }
        ],
        "isError": is_error
    })
}
