//! Model Context Protocol (MCP) Integration
//!
//! JSON-RPC 2.0 server exposing the command registry to tool-calling clients.
//!
//! # Architecture
//!
//! - [`types`] - Wire envelope and error codes
//! - [`session`] - Session table with idle expiry
//! - [`dispatcher`] - Transport-independent method routing
//! - [`response`] - Command responses to MCP content blocks
//! - [`http`] - axum transport (`POST`/`GET`/`DELETE` on one endpoint)
//! - [`server`] - Newline-delimited stream transport (stdio)
//!
//! # Usage
//!
//! Clients open a session with `initialize`, then call tools:
//!
//! ```json
//! {
//!   "jsonrpc": "2.0",
//!   "id": 2,
//!   "method": "tools/call",
//!   "params": {
//!     "name": "batch",
//!     "arguments": { "commands": [{ "action": "list_checkpoints" }] }
//!   }
//! }
//! ```

pub mod dispatcher;
pub mod handlers;
pub mod http;
pub mod response;
pub mod server;
pub mod session;
pub mod types;

pub use dispatcher::{DispatchOutcome, McpDispatcher};
pub use http::{is_allowed_origin, router, SESSION_HEADER};
pub use response::{format_response, ContentBlock, ImagePayload, ToolCallResult};
pub use server::serve_stream;
pub use session::{Session, SessionManager};
pub use types::{MCPError, MCPRequest, MCPResponse};
