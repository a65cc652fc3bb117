/// MCP Server Entry Point
///
/// Installs logging, reads configuration from the environment, builds the
/// tool registry and serves HTTP until shutdown. See `core::config` for the
/// recognised environment variables; `RUST_LOG` controls log filtering.

use minimal_mcp_server::{ServerConfig, ServerError, initialize_tools, run_server_http};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    // Logs go to stderr; actix's own `log` records are bridged in by the subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = ServerConfig::from_env();

    // A duplicate tool name is a configuration error and stops startup
    let registry = initialize_tools()?;

    run_server_http(config, registry).await?;
    Ok(())
}
