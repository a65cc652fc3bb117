//! Minimal MCP server exposing `add`, `subtract` and `generateSampleRecords`
//! over the streamable HTTP transport.

pub mod core;
pub mod tools;

pub use crate::core::config::ServerConfig;
pub use crate::core::error::ServerError;
pub use crate::core::server::{initialize_tools, routes, run_server_http};
