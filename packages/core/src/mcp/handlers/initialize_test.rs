//! Tests for MCP Initialize Handler

use super::*;
use serde_json::json;

#[test]
fn test_supported_version_is_echoed() {
    for version in SUPPORTED_PROTOCOL_VERSIONS {
        let params = json!({ "protocolVersion": version });
        assert_eq!(negotiate_protocol_version(&params), *version);
    }
}

#[test]
fn test_unsupported_version_gets_latest() {
    let params = json!({
        "protocolVersion": "1999-01-01",
        "clientInfo": { "name": "test-client" }
    });
    assert_eq!(negotiate_protocol_version(&params), LATEST_PROTOCOL_VERSION);
}

#[test]
fn test_missing_version_gets_latest() {
    assert_eq!(negotiate_protocol_version(&json!({})), LATEST_PROTOCOL_VERSION);
    assert_eq!(
        negotiate_protocol_version(&json!({ "protocolVersion": 7 })),
        LATEST_PROTOCOL_VERSION
    );
}

#[test]
fn test_initialize_result_structure() {
    let result = initialize_result("2024-11-05");

    assert_eq!(result["protocolVersion"], "2024-11-05");
    assert_eq!(result["serverInfo"]["name"], "scenelink-mcp-server");
    assert!(result["serverInfo"]["version"].is_string());
    assert!(result["capabilities"]["tools"].is_object());
    assert_eq!(result["capabilities"]["tools"]["listChanged"], false);
    assert!(result["instructions"].is_string());
}
