//! Integration tests for configuration loader
//!
//! Tests loading settings from files and driving a client with them.

#![allow(dead_code)]

#[path = "support.rs"]
mod support;

use std::io::Write;
use std::sync::Arc;

use apsis_infra::config;
use apsis_infra::integrations::apsis::ApsisClient;
use serde_json::json;
use support::envelope;
use tempfile::NamedTempFile;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn write_config(suffix: &str, contents: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::with_suffix(suffix).expect("Failed to create temp file");
    temp_file.write_all(contents.as_bytes()).expect("Failed to write to temp file");
    temp_file
}

#[test]
fn test_load_config_from_json_file() {
    let temp_file = write_config(
        ".json",
        r#"{
            "ssl": true,
            "host": "se.api.anpdm.com",
            "port": 8443,
            "api_key": "integration-key",
            "allowed_mailing_lists": ["100", "200"],
            "demographics": [
                {"key": "City", "available": true},
                {"key": "Size", "available": false, "required": true}
            ],
            "request_timeout_secs": 12
        }"#,
    );

    let settings = config::load_from_file(Some(temp_file.path().to_path_buf())).expect("config should load");

    assert_eq!(settings.base_url(), "https://se.api.anpdm.com:8443");
    assert_eq!(settings.allowed_mailing_lists, vec!["100", "200"]);
    assert_eq!(settings.request_timeout_secs, 12);
    let available: Vec<_> = settings.available_demographics().map(|d| d.key.as_str()).collect();
    assert_eq!(available, vec!["City"]);
    assert!(!format!("{settings:?}").contains("integration-key"));
}

#[test]
fn test_load_config_missing_fields_use_defaults() {
    let temp_file = write_config(".toml", "host = \"se.api.anpdm.com\"\n");

    let settings = config::load_from_file(Some(temp_file.path().to_path_buf())).expect("config should load");

    assert!(!settings.ssl);
    assert!(!settings.is_configured(), "no API key means not configured");
    assert!(settings.allowed_mailing_lists.is_empty());
}

#[test]
fn test_load_config_invalid_json() {
    let temp_file = write_config(".json", "{ not json");

    let result = config::load_from_file(Some(temp_file.path().to_path_buf()));
    assert!(matches!(result, Err(apsis_domain::ApsisError::Config(_))));
}

#[tokio::test]
async fn test_file_settings_drive_client() {
    let server = MockServer::start().await;
    let host = server.uri().trim_start_matches("http://").to_string();

    Mock::given(method("POST"))
        .and(path("/mailinglists/v2/all"))
        .and(header("authorization", "Basic ZmlsZS1rZXk6"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!([
            {"Id": 5, "Name": "Weekly"},
            {"Id": 6, "Name": "Monthly"}
        ]))))
        .expect(1)
        .mount(&server)
        .await;

    let temp_file = write_config(
        ".toml",
        &format!("host = \"{host}\"\napi_key = \"file-key\"\nallowed_mailing_lists = [\"6\"]\n"),
    );
    let settings = config::load_from_file(Some(temp_file.path().to_path_buf())).expect("config should load");
    let client = ApsisClient::from_settings(Arc::new(settings)).expect("client should build");

    let lists = client.allowed_mailing_lists().await.expect("lists should load");
    assert_eq!(lists.len(), 1);
    assert_eq!(lists[0].name, "Monthly");
}
