//! Batch Command Handler
//!
//! Expands one request into many sub-requests and runs each through the
//! registry. Policy is collect-all: every entry is dispatched in order
//! regardless of earlier failures, and every entry gets a result record.
//!
//! Params: `{ "commands": [ { "action": "...", "params": { ... } }, ... ] }`

use crate::commands::error::CommandError;
use crate::commands::registry::{CommandContext, CommandHandler};
use crate::commands::types::{CommandRequest, CommandResponse, ToolDescriptor};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

/// Default action name the batch handler is registered under
pub const BATCH_ACTION: &str = "batch";

/// Maximum number of sub-requests in one batch
pub const MAX_BATCH_SIZE: usize = 50;

/// Outcome of one batch entry
#[derive(Debug, Clone, Serialize)]
pub struct BatchItemResult {
    pub index: usize,
    pub action: String,
    pub status: BatchItemStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchItemStatus {
    Ok,
    Error,
}

impl BatchItemResult {
    fn from_response(index: usize, action: String, response: CommandResponse) -> Self {
        match response {
            CommandResponse::Ok(data) => Self {
                index,
                action,
                status: BatchItemStatus::Ok,
                data: Some(Value::Object(data)),
                error: None,
            },
            CommandResponse::Error(message) => Self::failed(index, action, message),
        }
    }

    fn failed(index: usize, action: String, message: impl Into<String>) -> Self {
        Self {
            index,
            action,
            status: BatchItemStatus::Error,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Aggregate batch result
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<BatchItemResult>,
}

/// Runs a list of commands through the registry that dispatched it
#[derive(Debug, Clone)]
pub struct BatchCommandHandler {
    max_size: usize,
}

impl Default for BatchCommandHandler {
    fn default() -> Self {
        Self {
            max_size: MAX_BATCH_SIZE,
        }
    }
}

impl BatchCommandHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the maximum batch length
    pub fn with_max_size(max_size: usize) -> Self {
        Self { max_size }
    }

    fn commands<'r>(&self, request: &'r CommandRequest) -> Result<&'r Vec<Value>, CommandError> {
        let commands = request
            .param("commands")
            .ok_or_else(|| CommandError::missing_param("commands"))?
            .as_array()
            .ok_or_else(|| CommandError::validation("'commands' must be an array"))?;

        if commands.is_empty() {
            return Err(CommandError::validation("'commands' must not be empty"));
        }
        if commands.len() > self.max_size {
            return Err(CommandError::validation(format!(
                "Too many commands in batch: {} (maximum {})",
                commands.len(),
                self.max_size
            )));
        }
        Ok(commands)
    }
}

#[async_trait]
impl CommandHandler for BatchCommandHandler {
    async fn execute(
        &self,
        ctx: CommandContext<'_>,
        request: &CommandRequest,
    ) -> Result<Value, CommandError> {
        let commands = self.commands(request)?;
        let mut results = Vec::with_capacity(commands.len());

        for (index, entry) in commands.iter().enumerate() {
            let Some(entry) = entry.as_object() else {
                results.push(BatchItemResult::failed(
                    index,
                    String::new(),
                    "Batch entry must be an object",
                ));
                continue;
            };

            let action = entry
                .get("action")
                .and_then(Value::as_str)
                .map(str::trim)
                .unwrap_or_default();
            if action.is_empty() {
                results.push(BatchItemResult::failed(
                    index,
                    String::new(),
                    "Missing 'action' in batch entry",
                ));
                continue;
            }

            if action == ctx.action() {
                results.push(BatchItemResult::failed(
                    index,
                    action.to_string(),
                    format!("Recursive '{}' is not allowed inside a batch", action),
                ));
                continue;
            }

            let params = entry.get("params").cloned().unwrap_or_else(|| json!({}));
            let sub_request = CommandRequest::from_value(action, params);
            let response = ctx.registry().dispatch(&sub_request).await;
            results.push(BatchItemResult::from_response(
                index,
                action.to_string(),
                response,
            ));
        }

        let succeeded = results
            .iter()
            .filter(|r| r.status == BatchItemStatus::Ok)
            .count();
        let summary = BatchSummary {
            total: results.len(),
            succeeded,
            failed: results.len() - succeeded,
            results,
        };
        debug!(
            "Batch finished: {}/{} succeeded",
            summary.succeeded, summary.total
        );

        serde_json::to_value(summary).map_err(|e| CommandError::Unexpected(e.into()))
    }

    fn descriptor(&self) -> Option<ToolDescriptor> {
        Some(ToolDescriptor::new(
            format!(
                "Run up to {} commands in order. Every command runs even if an earlier one fails; \
                 the result lists each command's status.",
                self.max_size
            ),
            json!({
                "type": "object",
                "properties": {
                    "commands": {
                        "type": "array",
                        "maxItems": self.max_size,
                        "items": {
                            "type": "object",
                            "properties": {
                                "action": { "type": "string", "description": "Command name" },
                                "params": { "type": "object", "description": "Command parameters" }
                            },
                            "required": ["action"]
                        }
                    }
                },
                "required": ["commands"]
            }),
        ))
    }
}

#[cfg(test)]
#[path = "batch_test.rs"]
mod batch_test;
