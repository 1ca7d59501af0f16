//! Services
//!
//! Long-running services assembled from the core components.
//!
//! - `McpServerService` - MCP server lifecycle (start, stop with grace period)

pub mod mcp_server_service;

pub use mcp_server_service::{
    default_mcp_port, McpServerConfig, McpServerHandle, McpServerService, McpTransport,
};
