//! Command Request/Response Types
//!
//! The uniform contract every registered command speaks. A request carries an
//! action name plus a JSON object of parameters; a response is either an `Ok`
//! payload object or an `Error` message, never both.

use serde::Serialize;
use serde_json::{Map, Value};

/// Named parameters for a command (string keys, dynamically-typed values)
pub type CommandParams = Map<String, Value>;

/// An immutable request to run a named command
#[derive(Debug, Clone, PartialEq)]
pub struct CommandRequest {
    name: String,
    params: CommandParams,
}

impl CommandRequest {
    /// Create a request from an action name and parameter map
    pub fn new(name: impl Into<String>, params: CommandParams) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }

    /// Create a request from an arbitrary JSON value
    ///
    /// Anything other than a JSON object is treated as "no parameters".
    pub fn from_value(name: impl Into<String>, params: Value) -> Self {
        let params = match params {
            Value::Object(map) => map,
            _ => CommandParams::new(),
        };
        Self::new(name, params)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &CommandParams {
        &self.params
    }

    /// Look up a single parameter
    pub fn param(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }

    /// Read an optional string parameter
    pub fn str_param(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(Value::as_str)
    }
}

/// Result of dispatching a command
#[derive(Debug, Clone, PartialEq)]
pub enum CommandResponse {
    /// Command succeeded with a payload object
    Ok(CommandParams),
    /// Command failed with a human-readable message
    Error(String),
}

impl CommandResponse {
    /// Build a success response from any JSON value
    ///
    /// Non-object values are wrapped as `{ "result": value }`.
    pub fn ok(data: Value) -> Self {
        match data {
            Value::Object(map) => Self::Ok(map),
            other => {
                let mut map = CommandParams::new();
                map.insert("result".to_string(), other);
                Self::Ok(map)
            }
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(message.into())
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// Error message, if this is an error response
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error(message) => Some(message),
            Self::Ok(_) => None,
        }
    }

    /// Success payload, if this is a success response
    pub fn data(&self) -> Option<&CommandParams> {
        match self {
            Self::Ok(data) => Some(data),
            Self::Error(_) => None,
        }
    }
}

/// Human-facing description of a command exposed as an MCP tool
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDescriptor {
    /// Public tool name when it differs from the action name
    #[serde(skip)]
    pub alias: Option<String>,

    /// What the tool does, written for the calling agent
    pub description: String,

    /// JSON Schema for the tool arguments (`type: object`)
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

impl ToolDescriptor {
    pub fn new(description: impl Into<String>, input_schema: Value) -> Self {
        Self {
            alias: None,
            description: description.into(),
            input_schema,
        }
    }

    /// Expose the command under a different public tool name
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }
}
