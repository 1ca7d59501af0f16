//! MCP Initialize Handler
//!
//! Handles the MCP initialization handshake and capability discovery.
//! This is the first method a client calls on a new connection.

use serde_json::{json, Value};

/// Supported MCP protocol versions, newest first
pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &[
    "2025-06-18", // Latest
    "2025-03-26", // Streamable HTTP
    "2024-11-05", // HTTP+SSE (deprecated but supported)
];

/// Newest protocol version the server speaks
pub const LATEST_PROTOCOL_VERSION: &str = SUPPORTED_PROTOCOL_VERSIONS[0];

/// Pick the protocol version for a session
///
/// A supported client version is echoed back. Anything else (unknown or
/// missing) is answered with the newest version we support; the client
/// decides whether it can continue.
pub fn negotiate_protocol_version(params: &Value) -> &'static str {
    params["protocolVersion"]
        .as_str()
        .and_then(|requested| {
            SUPPORTED_PROTOCOL_VERSIONS
                .iter()
                .copied()
                .find(|supported| *supported == requested)
        })
        .unwrap_or(LATEST_PROTOCOL_VERSION)
}

/// Build the `initialize` result for a negotiated version
///
/// # Protocol Flow
///
/// 1. Client sends initialize request with their protocol version
/// 2. Server answers with the negotiated version + capabilities
/// 3. Client sends `notifications/initialized`
/// 4. Normal operations begin
pub fn initialize_result(protocol_version: &str) -> Value {
    json!({
        "protocolVersion": protocol_version,
        "serverInfo": {
            "name": "scenelink-mcp-server",
            "version": env!("CARGO_PKG_VERSION")
        },
        "capabilities": {
            "tools": {
                "listChanged": false  // Registry is fixed once serving starts
            }
        },
        "instructions": "Scene editing tools. Call create_checkpoint before destructive edits so they can be undone with undo_checkpoint or restore_checkpoint. Use batch to run several commands in one call."
    })
}

#[cfg(test)]
#[path = "initialize_test.rs"]
mod initialize_test;
