/// Tools Module
///
/// Built-in MCP tools. Each tool module exports a `register` function that
/// adds its tools to the registry during server initialization.

pub mod calc;
pub mod sample_records;

use crate::core::error::RegistryError;
use crate::core::registry::ToolRegistry;

/// Register every built-in tool, in listing order.
pub fn register_all(registry: &mut ToolRegistry) -> Result<(), RegistryError> {
    calc::register(registry)?;
    sample_records::register(registry)?;
    Ok(())
}
