/// Per-Request Transport
///
/// Every POST to the MCP endpoint gets its own `Exchange`. No session id is
/// issued and nothing outlives the HTTP request. The exchange walks through
///
/// RECEIVED -> VALIDATING -> (INVOKING | REJECTED) -> RESPONDED -> CLOSED
///
/// and is released on drop. Every response to a POST, JSON, SSE or error,
/// carries its exchange inside an `ExchangeBody`. The exchange is marked
/// responded once actix has taken the last chunk, and a client that hangs up
/// early still releases it when actix drops the body.

use actix_web::body::{BodySize, MessageBody};
use bytes::Bytes;
use serde_json::Value;
use std::collections::VecDeque;
use std::convert::Infallible;
use std::pin::Pin;
use std::task::{Context, Poll};
use tracing::{Span, debug, info};

use crate::core::error::CallError;
use crate::core::protocol::MCPResponse;
use crate::core::registry::ToolRegistry;

/// Lifecycle state of an exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeState {
    Received,
    Validating,
    Invoking,
    Rejected,
    Responded,
    Closed,
}

type ReleaseHook = Box<dyn FnOnce(ExchangeState) + Send>;

/// Transport context for a single request/response exchange.
pub struct Exchange {
    span: Span,
    state: ExchangeState,
    on_release: Option<ReleaseHook>,
}

impl Exchange {
    /// Open a new exchange in the RECEIVED state.
    pub fn open() -> Self {
        let span = tracing::debug_span!("exchange");
        debug!(parent: &span, "transport opened");
        Self {
            span,
            state: ExchangeState::Received,
            on_release: None,
        }
    }

    /// Run a callback once the exchange has been released.
    ///
    /// # Arguments
    /// * `hook` - Receives the state the exchange was in just before it
    ///   moved to CLOSED. Anything other than RESPONDED means the response
    ///   was never fully written.
    pub fn on_release(mut self, hook: impl FnOnce(ExchangeState) + Send + 'static) -> Self {
        self.on_release = Some(Box::new(hook));
        self
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ExchangeState {
        self.state
    }

    fn transition(&mut self, next: ExchangeState) {
        debug!(parent: &self.span, from = ?self.state, to = ?next, "exchange state");
        self.state = next;
    }

    /// Mark the exchange as rejected. Its error response is still sent.
    pub fn reject(&mut self) {
        self.transition(ExchangeState::Rejected);
    }

    /// Resolve, validate and invoke a tool.
    ///
    /// The handler only runs once the arguments match the tool's input shape.
    pub fn call_tool(
        &mut self,
        registry: &ToolRegistry,
        name: &str,
        arguments: &Value,
    ) -> Result<Value, CallError> {
        self.transition(ExchangeState::Validating);

        let tool = match registry.resolve(name) {
            Ok(tool) => tool,
            Err(e) => {
                self.reject();
                return Err(e.into());
            }
        };

        let args = match tool.validate(arguments) {
            Ok(args) => args,
            Err(source) => {
                self.reject();
                return Err(CallError::Invalid {
                    tool: name.to_string(),
                    source,
                });
            }
        };

        self.transition(ExchangeState::Invoking);
        tool.invoke(&args).map_err(CallError::Failed)
    }

    /// The full response has been handed to the connection.
    pub fn finish(&mut self) {
        self.transition(ExchangeState::Responded);
        info!(parent: &self.span, "response sent");
    }
}

impl Drop for Exchange {
    fn drop(&mut self) {
        let released_from = self.state;
        if released_from == ExchangeState::Closed {
            return;
        }
        if released_from != ExchangeState::Responded {
            debug!(parent: &self.span, state = ?released_from, "connection closed before response completed");
        }
        self.transition(ExchangeState::Closed);
        debug!(parent: &self.span, "transport released");

        if let Some(hook) = self.on_release.take() {
            hook(released_from);
        }
    }
}

/// Format one JSON-RPC response as an SSE `message` event.
pub fn sse_event(response: &MCPResponse) -> Result<Bytes, serde_json::Error> {
    let data = serde_json::to_string(response)?;
    Ok(Bytes::from(format!("event: message\ndata: {}\n\n", data)))
}

/// Response body that owns the exchange it belongs to.
///
/// Yielding the last chunk finishes the exchange. Dropping the body with
/// chunks still pending releases it unfinished.
pub struct ExchangeBody {
    chunks: VecDeque<Bytes>,
    size: BodySize,
    exchange: Option<Exchange>,
}

impl ExchangeBody {
    /// A complete document of known length, such as a JSON reply.
    ///
    /// # Arguments
    /// * `exchange` - The exchange this body answers
    /// * `bytes` - The whole body; may be empty
    pub fn full(exchange: Exchange, bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        let size = BodySize::Sized(bytes.len() as u64);
        let chunks = if bytes.is_empty() {
            VecDeque::new()
        } else {
            VecDeque::from([bytes])
        };
        Self {
            chunks,
            size,
            exchange: Some(exchange),
        }
    }

    /// An empty body, as sent with 202 Accepted.
    pub fn empty(exchange: Exchange) -> Self {
        Self::full(exchange, Bytes::new())
    }

    /// Server-Sent Events, streamed without a content length.
    pub fn events(exchange: Exchange, events: Vec<Bytes>) -> Self {
        Self {
            chunks: events.into(),
            size: BodySize::Stream,
            exchange: Some(exchange),
        }
    }

    fn complete(&mut self) {
        if let Some(mut exchange) = self.exchange.take() {
            exchange.finish();
        }
    }
}

impl MessageBody for ExchangeBody {
    type Error = Infallible;

    fn size(&self) -> BodySize {
        self.size
    }

    fn poll_next(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Bytes, Self::Error>>> {
        let this = self.get_mut();
        match this.chunks.pop_front() {
            Some(chunk) => Poll::Ready(Some(Ok(chunk))),
            None => {
                this.complete();
                Poll::Ready(None)
            }
        }
    }
}

impl Drop for ExchangeBody {
    fn drop(&mut self) {
        // actix skips polling zero-length bodies, so nothing left means sent
        if self.chunks.is_empty() {
            self.complete();
        }
    }
}
