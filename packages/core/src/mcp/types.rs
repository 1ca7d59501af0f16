//! MCP JSON-RPC 2.0 Types
//!
//! Wire envelopes shared by the HTTP and stream transports.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// JSON-RPC 2.0 request or notification
///
/// `id` absent means notification: the server processes it but sends no
/// result body. `params` defaults to an empty object when absent or not an
/// object.
///
/// # Example
///
/// ```json
/// {
///     "jsonrpc": "2.0",
///     "id": 7,
///     "method": "tools/call",
///     "params": { "name": "create_checkpoint", "arguments": {} }
/// }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct MCPRequest {
    /// Request identifier (string or number); `None` for notifications
    pub id: Option<Value>,

    /// Method name to invoke
    pub method: String,

    /// Method parameters, always an object
    pub params: Value,

    /// Protocol version declared on the envelope, if any
    pub protocol_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRequest {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    method: Option<Value>,
    #[serde(default)]
    params: Option<Value>,
    #[serde(default)]
    protocol_version: Option<Value>,
}

impl MCPRequest {
    /// Parse a request body
    ///
    /// Malformed JSON yields a parse error; a body without a string `method`
    /// yields an invalid-request error carrying whatever id could be read.
    pub fn parse(body: &[u8]) -> Result<Self, (Option<Value>, MCPError)> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| (None, MCPError::parse_error(format!("Invalid JSON: {}", e))))?;
        Self::from_value(value)
    }

    /// Build a request from an already-decoded JSON value
    pub fn from_value(value: Value) -> Result<Self, (Option<Value>, MCPError)> {
        if !value.is_object() {
            return Err((
                None,
                MCPError::invalid_request("Request must be a JSON object".to_string()),
            ));
        }
        let raw: RawRequest = serde_json::from_value(value).map_err(|e| {
            (
                None,
                MCPError::invalid_request(format!("Invalid request: {}", e)),
            )
        })?;

        let id = raw.id.filter(|id| !id.is_null());
        let method = match raw.method {
            Some(Value::String(method)) if !method.is_empty() => method,
            _ => {
                return Err((
                    id,
                    MCPError::invalid_request("Missing 'method' field".to_string()),
                ))
            }
        };
        let params = match raw.params {
            Some(params @ Value::Object(_)) => params,
            _ => Value::Object(Map::new()),
        };
        let protocol_version = match raw.protocol_version {
            Some(Value::String(version)) => Some(version),
            _ => None,
        };

        Ok(Self {
            id,
            method,
            params,
            protocol_version,
        })
    }

    /// Whether this is a notification (no id, no response body)
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// JSON-RPC 2.0 response structure
///
/// # Success Example
///
/// ```json
/// { "jsonrpc": "2.0", "id": 7, "result": { "tools": [] } }
/// ```
///
/// # Error Example
///
/// ```json
/// { "jsonrpc": "2.0", "id": 7, "error": { "code": -32601, "message": "Method not found: foo" } }
/// ```
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MCPResponse {
    /// JSON-RPC version (always "2.0")
    pub jsonrpc: String,

    /// Request identifier (matches request; null when it could not be read)
    pub id: Value,

    /// Success result (mutually exclusive with error)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    /// Error information (mutually exclusive with result)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<MCPError>,
}

/// JSON-RPC 2.0 error structure
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct MCPError {
    /// Error code (standard JSON-RPC)
    pub code: i32,

    /// Human-readable error message
    pub message: String,
}

// JSON-RPC 2.0 standard error codes
pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;

impl MCPError {
    /// Create a parse error
    pub fn parse_error(message: String) -> Self {
        Self {
            code: PARSE_ERROR,
            message,
        }
    }

    /// Create an invalid request error
    pub fn invalid_request(message: String) -> Self {
        Self {
            code: INVALID_REQUEST,
            message,
        }
    }

    /// Create a method not found error
    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: METHOD_NOT_FOUND,
            message: format!("Method not found: {}", method),
        }
    }

    /// Create an invalid params error
    pub fn invalid_params(message: String) -> Self {
        Self {
            code: INVALID_PARAMS,
            message,
        }
    }

    /// Create an internal error
    pub fn internal_error(message: String) -> Self {
        Self {
            code: INTERNAL_ERROR,
            message,
        }
    }
}

impl MCPResponse {
    /// Create a success response
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: id.unwrap_or(Value::Null),
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response
    pub fn error(id: Option<Value>, error: MCPError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: id.unwrap_or(Value::Null),
            result: None,
            error: Some(error),
        }
    }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;
