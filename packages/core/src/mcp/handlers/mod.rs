//! MCP Request Handlers
//!
//! Handler modules for the protocol methods that carry logic of their own.
//! Routing lives in [`crate::mcp::dispatcher`].

pub mod initialize;
pub mod tools;
