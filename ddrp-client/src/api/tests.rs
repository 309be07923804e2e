//! Tests for the backend client helpers

use super::*;

#[test]
fn test_api_client_config_creation() {
    let config = ApiClientConfig::new("http://localhost:8000");
    assert_eq!(config.base_url, "http://localhost:8000");
    assert_eq!(config.timeout_seconds, 30);
    assert!(config.user_agent.starts_with("ddrp/"));

    let config = config
        .with_timeout(5)
        .with_header("X-Client".to_string(), "cli".to_string());
    assert_eq!(config.timeout_seconds, 5);
    assert_eq!(config.headers.get("X-Client").map(String::as_str), Some("cli"));

    let core = ddrp_core::ApiConfig::default();
    let config = ApiClientConfig::from(&core);
    assert_eq!(config.base_url, ddrp_core::DEFAULT_API_URL);
}

#[test]
fn test_invalid_header_is_rejected() {
    let config = ApiClientConfig::new("http://localhost:8000")
        .with_header("bad header".to_string(), "x".to_string());
    assert!(BackendClient::new(config).is_err());
}

#[test]
fn test_endpoint_url_joining() {
    let client = BackendClient::new(ApiClientConfig::new("http://localhost:8000/")).unwrap();
    assert_eq!(
        client.endpoint_url("/orders/check-delays"),
        "http://localhost:8000/orders/check-delays"
    );
    assert_eq!(client.endpoint_url("invoices"), "http://localhost:8000/invoices");
}

#[test]
fn test_path_segments_are_encoded() {
    assert_eq!(segment("abc-123"), "abc-123");
    assert_eq!(segment("a/b c"), "a%2Fb%20c");
}

#[test]
fn test_extract_detail() {
    assert_eq!(
        extract_detail(r#"{"detail":"Order not found"}"#).as_deref(),
        Some("Order not found")
    );
    assert_eq!(
        extract_detail(
            r#"{"detail":[{"loc":["body","quantity"],"msg":"field required"},{"msg":"value is not a valid float"}]}"#
        )
        .as_deref(),
        Some("field required; value is not a valid float")
    );
    assert_eq!(extract_detail(r#"{"detail":null}"#), None);
    assert_eq!(extract_detail("Internal Server Error"), None);
    assert_eq!(extract_detail(r#"{"message":"nope"}"#), None);
}

#[test]
fn test_parse_loose_json() {
    assert_eq!(parse_loose_json(""), serde_json::Value::Null);
    assert_eq!(
        parse_loose_json(r#"{"delayed":2}"#),
        serde_json::json!({ "delayed": 2 })
    );
    assert_eq!(
        parse_loose_json("done"),
        serde_json::Value::String("done".to_string())
    );
}
