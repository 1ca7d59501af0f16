//! MCP Tools Handler
//!
//! Implements `tools/list` and `tools/call` on top of the command registry.
//! Every registered command with a descriptor is a tool; a descriptor alias
//! becomes the public tool name while the registry keeps the action name.
//!
//! Tool execution failures are not JSON-RPC errors: they come back as a
//! successful response whose result has `isError: true`, so the calling agent
//! can read the message and recover.

use crate::commands::{CommandRegistry, CommandRequest};
use crate::mcp::response::format_response;
use crate::mcp::types::MCPError;
use serde_json::{json, Value};
use tracing::debug;

/// Handle tools/list MCP request
///
/// # Response
///
/// ```json
/// {
///   "tools": [
///     { "name": "create_checkpoint", "description": "...", "inputSchema": { ... } }
///   ]
/// }
/// ```
pub fn handle_tools_list(registry: &CommandRegistry) -> Value {
    let tools: Vec<Value> = registry
        .tools()
        .into_iter()
        .map(|tool| {
            json!({
                "name": tool.name,
                "description": tool.descriptor.description,
                "inputSchema": tool.descriptor.input_schema,
            })
        })
        .collect();

    json!({ "tools": tools })
}

/// Handle tools/call MCP request
///
/// Request format:
/// ```json
/// { "name": "tool_name", "arguments": { ... } }
/// ```
///
/// Response format:
/// ```json
/// { "content": [{ "type": "text", "text": "..." }], "isError": false }
/// ```
///
/// # Errors
///
/// Only a missing or non-string `name` is a protocol error (invalid params).
/// Unknown tools and handler failures are reported in-band with `isError`.
pub async fn handle_tools_call(
    registry: &CommandRegistry,
    params: &Value,
) -> Result<Value, MCPError> {
    let tool_name = params["name"]
        .as_str()
        .ok_or_else(|| MCPError::invalid_params("Missing 'name' parameter".to_string()))?;

    // Arguments default to an empty object when missing or malformed
    let arguments = params.get("arguments").cloned().unwrap_or(json!({}));

    let action = registry.resolve_tool(tool_name).unwrap_or(tool_name);
    debug!("tools/call '{}' -> action '{}'", tool_name, action);

    let response = registry
        .dispatch(&CommandRequest::from_value(action, arguments))
        .await;

    Ok(format_response(&response).to_value())
}

#[cfg(test)]
#[path = "tools_test.rs"]
mod tools_test;
