//! Tests for MCP Tools Handler
//!
//! Tests tools/list and tools/call against a small registry.

use super::*;
use crate::commands::{
    BatchCommandHandler, CommandContext, CommandError, CommandHandler, ToolDescriptor,
    BATCH_ACTION,
};
use async_trait::async_trait;
use std::sync::Arc;

struct AddObject;

#[async_trait]
impl CommandHandler for AddObject {
    async fn execute(
        &self,
        _ctx: CommandContext<'_>,
        request: &CommandRequest,
    ) -> Result<Value, CommandError> {
        let name = request
            .str_param("name")
            .ok_or_else(|| CommandError::missing_param("name"))?;
        Ok(json!({ "added": name }))
    }

    fn descriptor(&self) -> Option<ToolDescriptor> {
        Some(
            ToolDescriptor::new(
                "Add an object to the scene",
                json!({
                    "type": "object",
                    "properties": { "name": { "type": "string" } },
                    "required": ["name"]
                }),
            )
            .with_alias("add"),
        )
    }
}

struct Hidden;

#[async_trait]
impl CommandHandler for Hidden {
    async fn execute(
        &self,
        _ctx: CommandContext<'_>,
        _request: &CommandRequest,
    ) -> Result<Value, CommandError> {
        Ok(json!({ "hidden": true }))
    }
}

fn registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    registry.register("add_object", Arc::new(AddObject)).unwrap();
    registry.register("internal_sync", Arc::new(Hidden)).unwrap();
    registry
        .register(BATCH_ACTION, Arc::new(BatchCommandHandler::new()))
        .unwrap();
    registry
}

fn text_of(result: &Value) -> &str {
    result["content"][0]["text"].as_str().unwrap()
}

#[test]
fn test_tools_list_uses_aliases_and_skips_undescribed() {
    let result = handle_tools_list(&registry());
    let tools = result["tools"].as_array().unwrap();

    let names: Vec<&str> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["add", "batch"]);

    for tool in tools {
        assert!(tool["description"].is_string(), "Tool missing description");
        assert_eq!(
            tool["inputSchema"]["type"].as_str(),
            Some("object"),
            "inputSchema type must be object"
        );
    }
}

#[tokio::test]
async fn test_tools_call_by_alias() {
    let result = handle_tools_call(
        &registry(),
        &json!({ "name": "add", "arguments": { "name": "cube" } }),
    )
    .await
    .unwrap();

    assert_eq!(result["isError"], false);
    let payload: Value = serde_json::from_str(text_of(&result)).unwrap();
    assert_eq!(payload["added"], "cube");
}

#[tokio::test]
async fn test_tools_call_by_action_name() {
    let result = handle_tools_call(
        &registry(),
        &json!({ "name": "add_object", "arguments": { "name": "cone" } }),
    )
    .await
    .unwrap();
    assert_eq!(result["isError"], false);
}

#[tokio::test]
async fn test_tools_call_unknown_tool_is_in_band_error() {
    let result = handle_tools_call(&registry(), &json!({ "name": "unknown_tool" }))
        .await
        .unwrap();

    assert_eq!(result["isError"], true);
    assert_eq!(text_of(&result), "Unknown action: unknown_tool");
}

#[tokio::test]
async fn test_tools_call_missing_name() {
    let err = handle_tools_call(&registry(), &json!({ "arguments": {} }))
        .await
        .unwrap_err();
    assert_eq!(err.code, crate::mcp::types::INVALID_PARAMS);
}

#[tokio::test]
async fn test_tools_call_missing_arguments() {
    let result = handle_tools_call(&registry(), &json!({ "name": "add" }))
        .await
        .unwrap();
    assert_eq!(result["isError"], true);
    assert_eq!(text_of(&result), "Missing 'name' parameter");
}

#[tokio::test]
async fn test_batch_resolves_action_names() {
    let result = handle_tools_call(
        &registry(),
        &json!({
            "name": "batch",
            "arguments": { "commands": [
                { "action": "add_object", "params": { "name": "a" } },
                { "action": "add_object" }
            ] }
        }),
    )
    .await
    .unwrap();

    let summary: Value = serde_json::from_str(text_of(&result)).unwrap();
    assert_eq!(summary["total"], 2);
    assert_eq!(summary["succeeded"], 1);
    assert_eq!(summary["failed"], 1);
}
