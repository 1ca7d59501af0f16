//! Tests for MCP types module
//!
//! Verifies JSON-RPC 2.0 envelope parsing and response serialization.

use super::*;
use serde_json::json;

#[test]
fn test_parse_valid_request() {
    let body = br#"{
        "jsonrpc": "2.0",
        "id": 123,
        "method": "tools/call",
        "params": { "name": "list_checkpoints" }
    }"#;

    let request = MCPRequest::parse(body).unwrap();

    assert_eq!(request.id, Some(json!(123)));
    assert_eq!(request.method, "tools/call");
    assert_eq!(request.params["name"], "list_checkpoints");
    assert!(!request.is_notification());
}

#[test]
fn test_parse_string_id_and_protocol_version() {
    let body = br#"{"id": "abc", "method": "ping", "protocolVersion": "2025-03-26"}"#;
    let request = MCPRequest::parse(body).unwrap();
    assert_eq!(request.id, Some(json!("abc")));
    assert_eq!(request.protocol_version.as_deref(), Some("2025-03-26"));
}

#[test]
fn test_parse_notification() {
    let body = br#"{"jsonrpc": "2.0", "method": "notifications/initialized"}"#;
    let request = MCPRequest::parse(body).unwrap();
    assert!(request.is_notification());
    assert_eq!(request.params, json!({}));
}

#[test]
fn test_null_id_is_notification() {
    let request = MCPRequest::from_value(json!({"id": null, "method": "ping"})).unwrap();
    assert!(request.is_notification());
}

#[test]
fn test_malformed_params_default_to_empty_object() {
    let request = MCPRequest::from_value(json!({"id": 1, "method": "ping", "params": [1, 2]}))
        .unwrap();
    assert_eq!(request.params, json!({}));
}

#[test]
fn test_parse_invalid_json() {
    let (id, err) = MCPRequest::parse(b"{not json").unwrap_err();
    assert_eq!(id, None);
    assert_eq!(err.code, PARSE_ERROR);
    assert!(err.message.starts_with("Invalid JSON"));
}

#[test]
fn test_parse_missing_method_keeps_id() {
    let (id, err) = MCPRequest::from_value(json!({"id": 9, "params": {}})).unwrap_err();
    assert_eq!(id, Some(json!(9)));
    assert_eq!(err.code, INVALID_REQUEST);
}

#[test]
fn test_parse_non_object_body() {
    let (_, err) = MCPRequest::parse(b"[1,2,3]").unwrap_err();
    assert_eq!(err.code, INVALID_REQUEST);
}

#[test]
fn test_serialize_success_response() {
    let response = MCPResponse::success(Some(json!(42)), json!({"ok": true}));
    let json = serde_json::to_value(&response).unwrap();

    assert_eq!(json["jsonrpc"], "2.0");
    assert_eq!(json["id"], 42);
    assert_eq!(json["result"]["ok"], true);
    assert!(json.get("error").is_none());
}

#[test]
fn test_serialize_error_response_without_id() {
    let response = MCPResponse::error(None, MCPError::parse_error("bad".to_string()));
    let json = serde_json::to_value(&response).unwrap();

    assert!(json["id"].is_null());
    assert_eq!(json["error"]["code"], -32700);
    assert_eq!(json["error"]["message"], "bad");
    assert!(json.get("result").is_none());
}

#[test]
fn test_error_codes() {
    assert_eq!(MCPError::invalid_request(String::new()).code, INVALID_REQUEST);
    assert_eq!(MCPError::method_not_found("x").code, METHOD_NOT_FOUND);
    assert_eq!(MCPError::invalid_params(String::new()).code, INVALID_PARAMS);
    assert_eq!(MCPError::internal_error(String::new()).code, INTERNAL_ERROR);
    assert_eq!(MCPError::method_not_found("x").message, "Method not found: x");
}
