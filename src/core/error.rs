/// Error Types
///
/// Every failure the server can produce, grouped by the layer that raises it:
/// - RegistryError: tool registration and lookup
/// - ValidationError / ToolError: argument checking and tool execution
/// - CallError: a failed tools/call, as seen by the protocol layer
/// - HttpError: rejections on the HTTP surface, rendered through actix
/// - ServerError: fatal startup failures returned from main

use actix_web::{
    HttpResponse, ResponseError,
    http::{StatusCode, header},
};
use serde_json::{Value, json};

use crate::core::protocol;

/// Errors raised while building or querying the tool registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// A tool with this name is already registered. Fatal at startup.
    #[error("tool already registered: {0}")]
    Duplicate(String),

    /// No tool with this name exists.
    #[error("Unknown tool: {0}")]
    NotFound(String),
}

/// Tool arguments do not match the tool's declared input shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("arguments must be a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("missing required field `{0}`")]
    MissingField(String),

    #[error("field `{field}` must be a {expected}, got {found}")]
    WrongType {
        field: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// Failure of a single tool invocation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ToolError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The handler ran but could not produce a result.
    #[error("{0}")]
    Execution(String),
}

/// Outcome of a failed `tools/call`, as seen by the protocol layer.
///
/// NotFound and Invalid become JSON-RPC errors; Failed becomes a tool result
/// flagged with `isError`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CallError {
    #[error(transparent)]
    NotFound(#[from] RegistryError),

    #[error("Invalid arguments for tool {tool}: {source}")]
    Invalid {
        tool: String,
        #[source]
        source: ValidationError,
    },

    #[error(transparent)]
    Failed(ToolError),
}

/// Rejections on the HTTP surface, before any tool is reached.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Unsupported Media Type: Content-Type must be application/json")]
    UnsupportedMediaType,

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid Request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl HttpError {
    /// JSON body sent with the rejection.
    ///
    /// Protocol-level rejections carry a JSON-RPC error with a null id.
    pub fn body(&self) -> Value {
        let code = match self {
            Self::MethodNotAllowed => return json!({ "error": "Method not allowed" }),
            Self::UnsupportedMediaType => protocol::SERVER_ERROR,
            Self::Parse(_) => protocol::PARSE_ERROR,
            Self::InvalidRequest(_) => protocol::INVALID_REQUEST,
            Self::Serialization(_) => protocol::INTERNAL_ERROR,
        };

        json!({
            "jsonrpc": "2.0",
            "id": null,
            "error": {
                "code": code,
                "message": self.to_string()
            }
        })
    }
}

impl ResponseError for HttpError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::Parse(_) | Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        if let Self::MethodNotAllowed = self {
            builder.insert_header((header::ALLOW, "POST"));
        }
        builder.json(self.body())
    }
}

/// Fatal errors that stop the server process.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to build tool registry: {0}")]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
