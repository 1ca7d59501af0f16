//! SceneLink Core
//!
//! Exposes a scene-editing application's commands to external tool-calling
//! clients over MCP, with a checkpoint timeline as the safety net for
//! destructive edits.
//!
//! # Architecture
//!
//! - **Commands**: one registry maps action names to handlers and contains
//!   their failures, so a misbehaving command never takes the server down
//! - **Checkpoints**: branching undo/redo timeline with memory-aware eviction
//! - **Protocol**: JSON-RPC 2.0 sessions over HTTP or a byte stream
//!
//! # Modules
//!
//! - [`commands`] - Registry, batch handler, checkpoint commands
//! - [`checkpoint`] - Checkpoint manager and memory probes
//! - [`document`] - Lock-guarded access to live application state
//! - [`mcp`] - Wire types, sessions, transports, response formatting
//! - [`services`] - MCP server lifecycle and configuration

pub mod checkpoint;
pub mod commands;
pub mod document;
pub mod mcp;
pub mod services;

// Re-export commonly used types
pub use checkpoint::{CheckpointConfig, CheckpointError, CheckpointManager};
pub use commands::{
    CommandError, CommandHandler, CommandRegistry, CommandRequest, CommandResponse,
    ToolDescriptor,
};
pub use document::{Document, DocumentError};
pub use services::{McpServerConfig, McpServerService, McpTransport};
