/// Core Server Framework Module
///
/// - config.rs: environment-driven server configuration
/// - error.rs: error taxonomy
/// - registry.rs: tool registry and input shapes
/// - protocol.rs: JSON-RPC 2.0 types and MCP method handling
/// - transport.rs: per-request exchange lifecycle and SSE bodies
/// - server.rs: HTTP routes and server bootstrap

pub mod config;
pub mod error;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod transport;
