//! Tests for the Batch Command Handler

use super::*;
use crate::commands::registry::CommandRegistry;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct CountingCommand {
    calls: AtomicUsize,
}

#[async_trait]
impl CommandHandler for CountingCommand {
    async fn execute(
        &self,
        _ctx: CommandContext<'_>,
        request: &CommandRequest,
    ) -> Result<Value, CommandError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if request.param("fail").and_then(Value::as_bool) == Some(true) {
            return Err(CommandError::validation("asked to fail"));
        }
        Ok(json!({ "call": n }))
    }
}

fn registry_with_counter() -> (CommandRegistry, Arc<CountingCommand>) {
    let counter = Arc::new(CountingCommand::default());
    let mut registry = CommandRegistry::new();
    registry.register("count", counter.clone()).unwrap();
    registry
        .register(BATCH_ACTION, Arc::new(BatchCommandHandler::new()))
        .unwrap();
    (registry, counter)
}

async fn run_batch(registry: &CommandRegistry, params: Value) -> CommandResponse {
    registry
        .dispatch(&CommandRequest::from_value(BATCH_ACTION, params))
        .await
}

#[tokio::test]
async fn test_batch_valid_and_malformed_entry() {
    let (registry, _) = registry_with_counter();

    let response = run_batch(
        &registry,
        json!({ "commands": [ { "action": "count" }, { "params": {} } ] }),
    )
    .await;

    let data = response.data().expect("batch itself succeeds");
    assert_eq!(data["total"], 2);
    assert_eq!(data["succeeded"], 1);
    assert_eq!(data["failed"], 1);

    let results = data["results"].as_array().unwrap();
    assert_eq!(results[0]["index"], 0);
    assert_eq!(results[0]["status"], "ok");
    assert_eq!(results[0]["data"]["call"], 1);
    assert_eq!(results[1]["index"], 1);
    assert_eq!(results[1]["status"], "error");
    assert!(results[1]["error"].as_str().unwrap().contains("action"));
}

#[tokio::test]
async fn test_batch_collects_all_after_failure() {
    let (registry, counter) = registry_with_counter();

    let response = run_batch(
        &registry,
        json!({ "commands": [
            { "action": "count", "params": { "fail": true } },
            { "action": "missing_command" },
            { "action": "count" }
        ] }),
    )
    .await;

    let data = response.data().unwrap();
    assert_eq!(data["total"], 3);
    assert_eq!(data["succeeded"], 1);
    assert_eq!(data["failed"], 2);
    assert_eq!(counter.calls.load(Ordering::SeqCst), 2);

    let results = data["results"].as_array().unwrap();
    assert_eq!(results[0]["error"], "asked to fail");
    assert_eq!(results[1]["error"], "Unknown action: missing_command");
    assert_eq!(results[2]["status"], "ok");
}

#[tokio::test]
async fn test_batch_rejects_recursive_entry_only() {
    let (registry, counter) = registry_with_counter();

    let response = run_batch(
        &registry,
        json!({ "commands": [
            { "action": BATCH_ACTION, "params": { "commands": [ { "action": "count" } ] } },
            { "action": "count" }
        ] }),
    )
    .await;

    let data = response.data().unwrap();
    assert_eq!(data["total"], 2);
    assert_eq!(data["succeeded"], 1);
    assert_eq!(data["failed"], 1);
    assert_eq!(data["results"][0]["action"], BATCH_ACTION);
    assert!(data["results"][0]["error"]
        .as_str()
        .unwrap()
        .contains("Recursive"));
    // Only the top-level "count" ran
    assert_eq!(counter.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_batch_recursion_detected_under_custom_name() {
    let mut registry = CommandRegistry::new();
    registry
        .register("run_many", Arc::new(BatchCommandHandler::new()))
        .unwrap();

    let response = registry
        .dispatch(&CommandRequest::from_value(
            "run_many",
            json!({ "commands": [ { "action": "run_many" } ] }),
        ))
        .await;

    assert_eq!(response.data().unwrap()["failed"], 1);
}

#[tokio::test]
async fn test_batch_missing_commands() {
    let (registry, _) = registry_with_counter();
    let response = run_batch(&registry, json!({})).await;
    assert_eq!(response.error_message(), Some("Missing 'commands' parameter"));
}

#[tokio::test]
async fn test_batch_empty_commands() {
    let (registry, _) = registry_with_counter();
    let response = run_batch(&registry, json!({ "commands": [] })).await;
    assert!(response.error_message().unwrap().contains("must not be empty"));
}

#[tokio::test]
async fn test_batch_too_many_commands() {
    let (registry, counter) = registry_with_counter();
    let commands: Vec<Value> = (0..MAX_BATCH_SIZE + 1)
        .map(|_| json!({ "action": "count" }))
        .collect();

    let response = run_batch(&registry, json!({ "commands": commands })).await;

    assert!(response.error_message().unwrap().contains("Too many commands"));
    assert_eq!(counter.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_batch_non_object_entry() {
    let (registry, _) = registry_with_counter();
    let response = run_batch(&registry, json!({ "commands": [ "count", { "action": "count" } ] })).await;

    let data = response.data().unwrap();
    assert_eq!(data["failed"], 1);
    assert_eq!(data["results"][0]["error"], "Batch entry must be an object");
}

#[test]
fn test_batch_descriptor_advertises_limit() {
    let descriptor = BatchCommandHandler::with_max_size(5).descriptor().unwrap();
    assert_eq!(
        descriptor.input_schema["properties"]["commands"]["maxItems"],
        5
    );
}
