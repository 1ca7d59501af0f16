//! MCP Method Dispatcher
//!
//! Transport-independent routing of parsed JSON-RPC requests. The HTTP and
//! stream transports both funnel into [`McpDispatcher::handle_request`]; they
//! differ only in how a session id reaches it and how the reply is written.
//!
//! Session validation for session-scoped methods (`tools/list`,
//! `tools/call`) is the transport's job, because the HTTP transport has to
//! answer with specific status codes before any JSON-RPC processing happens.

use crate::commands::CommandRegistry;
use crate::mcp::handlers::{initialize, tools};
use crate::mcp::session::{Session, SessionManager};
use crate::mcp::types::{MCPError, MCPRequest, MCPResponse};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error, instrument, warn};

pub const METHOD_INITIALIZE: &str = "initialize";
pub const METHOD_INITIALIZED: &str = "notifications/initialized";
pub const METHOD_TOOLS_LIST: &str = "tools/list";
pub const METHOD_TOOLS_CALL: &str = "tools/call";
pub const METHOD_PING: &str = "ping";

/// Whether a method needs an established session
pub fn requires_session(method: &str) -> bool {
    matches!(method, METHOD_TOOLS_LIST | METHOD_TOOLS_CALL)
}

/// Result of handling one request
#[derive(Debug, Default)]
pub struct DispatchOutcome {
    /// Reply body; `None` for notifications
    pub response: Option<MCPResponse>,
    /// Session created by an `initialize` request
    pub created_session: Option<Session>,
}

/// Routes protocol methods to handlers
#[derive(Clone)]
pub struct McpDispatcher {
    registry: Arc<CommandRegistry>,
    sessions: Arc<SessionManager>,
}

impl McpDispatcher {
    pub fn new(registry: Arc<CommandRegistry>, sessions: Arc<SessionManager>) -> Self {
        Self { registry, sessions }
    }

    pub fn registry(&self) -> &Arc<CommandRegistry> {
        &self.registry
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    /// Handle a parsed request
    ///
    /// `session_id` is the session the transport associated with the
    /// request, if any. Notifications never produce a response body.
    #[instrument(skip(self, request), fields(method = %request.method))]
    pub async fn handle_request(
        &self,
        request: MCPRequest,
        session_id: Option<&str>,
    ) -> DispatchOutcome {
        let mut created_session = None;

        let result: Result<Value, MCPError> = match request.method.as_str() {
            METHOD_INITIALIZE => {
                let version = initialize::negotiate_protocol_version(&request.params);
                let session = self.sessions.create(version);
                created_session = Some(session);
                Ok(initialize::initialize_result(version))
            }
            METHOD_INITIALIZED => {
                if let Some(id) = session_id {
                    if !self.sessions.mark_initialized(id) {
                        debug!("initialized notification for unknown session {}", id);
                    }
                }
                Ok(json!({}))
            }
            METHOD_TOOLS_LIST => Ok(tools::handle_tools_list(&self.registry)),
            METHOD_TOOLS_CALL => tools::handle_tools_call(&self.registry, &request.params).await,
            METHOD_PING => Ok(json!({})),
            other => {
                warn!("⚠️  Unknown MCP method: {}", other);
                Err(MCPError::method_not_found(other))
            }
        };

        if request.is_notification() {
            return DispatchOutcome {
                response: None,
                created_session,
            };
        }

        let response = match result {
            Ok(result) => {
                debug!("✅ MCP request {:?} succeeded", request.id);
                MCPResponse::success(request.id, result)
            }
            Err(error) => {
                error!(
                    "❌ MCP request {:?} failed: {} (code: {})",
                    request.id, error.message, error.code
                );
                MCPResponse::error(request.id, error)
            }
        };

        DispatchOutcome {
            response: Some(response),
            created_session,
        }
    }
}

#[cfg(test)]
#[path = "dispatcher_test.rs"]
mod dispatcher_test;
