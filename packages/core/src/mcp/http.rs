//! MCP HTTP Transport
//!
//! Serves the protocol on a single endpoint:
//!
//! - `POST` carries one JSON-RPC request or notification per body
//! - `GET` is reserved for server push and answers 405
//! - `DELETE` tears down the session named by the `Mcp-Session-Id` header
//!
//! Browser-originated requests are only accepted from loopback origins, and
//! request bodies are capped before parsing.

use crate::mcp::dispatcher::{requires_session, McpDispatcher};
use crate::mcp::handlers::initialize::LATEST_PROTOCOL_VERSION;
use crate::mcp::types::{MCPError, MCPRequest, MCPResponse};
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::post,
    Router,
};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, instrument, warn};

/// Header carrying the session token in both directions
pub const SESSION_HEADER: &str = "mcp-session-id";

/// Default endpoint path
pub const DEFAULT_ENDPOINT_PATH: &str = "/mcp";

/// Default request body ceiling (10 MiB)
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

const ALLOWED_ORIGIN_PREFIXES: &[&str] = &[
    "http://localhost",
    "https://localhost",
    "http://127.0.0.1",
    "https://127.0.0.1",
    "http://[::1]",
    "https://[::1]",
];

/// Whether a declared `Origin` is a loopback origin
///
/// The prefix must be followed by a port, a path, or nothing, so
/// `http://localhost.evil.example` does not pass as `http://localhost`.
pub fn is_allowed_origin(origin: &str) -> bool {
    ALLOWED_ORIGIN_PREFIXES.iter().any(|prefix| {
        origin
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with(':') || rest.starts_with('/'))
    })
}

/// Build the MCP router
///
/// # Arguments
///
/// * `dispatcher` - Shared protocol dispatcher
/// * `path` - Endpoint path, usually [`DEFAULT_ENDPOINT_PATH`]
/// * `max_body_bytes` - Largest accepted request body
pub fn router(dispatcher: McpDispatcher, path: &str, max_body_bytes: usize) -> Router {
    Router::new()
        .route(
            path,
            post(handle_post).get(handle_get).delete(handle_delete),
        )
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(middleware::from_fn(check_origin))
        .layer(TraceLayer::new_for_http())
        .with_state(dispatcher)
}

async fn check_origin(request: Request, next: Next) -> Response {
    if let Some(origin) = request.headers().get(header::ORIGIN) {
        let allowed = origin.to_str().map(is_allowed_origin).unwrap_or(false);
        if !allowed {
            warn!("❌ Rejected request from origin {:?}", origin);
            return (StatusCode::FORBIDDEN, "Origin not allowed").into_response();
        }
    }
    next.run(request).await
}

fn session_header(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
}

fn rpc_error(status: StatusCode, id: Option<serde_json::Value>, error: MCPError) -> Response {
    (status, Json(MCPResponse::error(id, error))).into_response()
}

#[instrument(skip_all)]
async fn handle_post(
    State(dispatcher): State<McpDispatcher>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    debug!("📥 MCP HTTP request ({} bytes)", body.len());

    let request = match MCPRequest::parse(&body) {
        Ok(request) => request,
        Err((id, error)) => {
            warn!("❌ Failed to parse JSON-RPC request: {}", error.message);
            return rpc_error(StatusCode::BAD_REQUEST, id, error);
        }
    };

    let session_id = session_header(&headers).map(str::to_string);

    if requires_session(&request.method) {
        let Some(id) = session_id.as_deref() else {
            warn!("⚠️  {} without {} header", request.method, SESSION_HEADER);
            return rpc_error(
                StatusCode::BAD_REQUEST,
                request.id,
                MCPError::invalid_request(format!("Missing {} header", SESSION_HEADER)),
            );
        };

        let sessions = dispatcher.sessions();
        if sessions.get(id).is_none() {
            if !sessions.is_recently_expired(id) {
                warn!("⚠️  Unknown session {}", id);
                return rpc_error(
                    StatusCode::NOT_FOUND,
                    request.id,
                    MCPError::invalid_request(format!("Session not found: {}", id)),
                );
            }
            info!("Reviving recently expired session {}", id);
            let version = request
                .protocol_version
                .clone()
                .unwrap_or_else(|| LATEST_PROTOCOL_VERSION.to_string());
            sessions.create_with_id(id, version);
            sessions.mark_initialized(id);
        }
    }

    let outcome = dispatcher
        .handle_request(request, session_id.as_deref())
        .await;

    let mut response = match outcome.response {
        Some(body) => (StatusCode::OK, Json(body)).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    };

    if let Some(session) = outcome.created_session {
        match HeaderValue::from_str(&session.id) {
            Ok(value) => {
                response.headers_mut().insert(SESSION_HEADER, value);
            }
            Err(e) => warn!("Session id {} is not a valid header: {}", session.id, e),
        }
    }

    response
}

async fn handle_get() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, "POST, DELETE")],
        "Method not supported",
    )
        .into_response()
}

async fn handle_delete(State(dispatcher): State<McpDispatcher>, headers: HeaderMap) -> StatusCode {
    if let Some(id) = session_header(&headers) {
        if !dispatcher.sessions().remove(id) {
            debug!("DELETE for unknown session {}", id);
        }
    }
    StatusCode::OK
}
