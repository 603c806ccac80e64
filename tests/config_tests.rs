// Configuration system integration tests

use analytics_tracker::config::{load_config, load_config_with_env, AppConfig};
use std::fs;

fn write_config(dir: &tempfile::TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join("config.yaml");
    fs::write(&path, content).expect("Failed to write temp config");
    path
}

#[test]
fn test_load_batch_backend_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        r#"
tracker:
  stringent: true
  strict: true
  auto_uuid: true
  zone_offset: true

sink:
  backend: batch
  batch:
    server_url: http://receiver:8991
    app_id: app-1
    max_buffer_length: 50
    compress: false
    timeout_seconds: 30

logging:
  level: debug
  format: text
"#,
    );

    let config = load_config(&path).expect("Failed to load batch config");

    assert!(config.tracker.stringent);
    assert!(config.tracker.strict);
    assert!(config.tracker.auto_uuid);
    assert!(config.tracker.zone_offset);

    assert_eq!(config.sink.backend, "batch");
    let batch = config
        .sink
        .backend_config
        .as_batch()
        .expect("Expected batch config");
    assert_eq!(batch.server_url, "http://receiver:8991");
    assert_eq!(batch.app_id, "app-1");
    assert_eq!(batch.max_buffer_length, 50);
    assert!(!batch.compress);
    assert_eq!(batch.timeout_seconds, 30);
    assert!(!batch.retain_on_failure); // default

    assert_eq!(config.logging.level, "debug");
}

#[test]
fn test_env_var_substitution() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        r#"
sink:
  backend: batch
  batch:
    server_url: ${CONFIG_TEST_URL:-http://default:8991}
    app_id: ${CONFIG_TEST_APP_ID:-fallback-app}
"#,
    );

    std::env::set_var("CONFIG_TEST_URL", "http://substituted:9000");

    let config = load_config(&path).expect("Failed to load config with env vars");
    let batch = config.sink.backend_config.as_batch().unwrap();
    assert_eq!(batch.server_url, "http://substituted:9000");
    assert_eq!(batch.app_id, "fallback-app"); // Uses default

    std::env::remove_var("CONFIG_TEST_URL");
}

#[test]
fn test_env_override_hook() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        r#"
sink:
  backend: batch
  batch:
    server_url: http://from-file:8991
    app_id: file-app
"#,
    );

    std::env::set_var("TRACKER_SERVER_URL", "http://from-env:7000");
    std::env::set_var("TRACKER_APP_ID", "env-app");

    let config = load_config_with_env(&path).expect("Failed to load config");
    let batch = config.sink.backend_config.as_batch().unwrap();
    assert_eq!(batch.server_url, "http://from-env:7000");
    assert_eq!(batch.app_id, "env-app");

    std::env::remove_var("TRACKER_SERVER_URL");
    std::env::remove_var("TRACKER_APP_ID");
}

#[test]
fn test_debug_backend_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        r#"
sink:
  backend: debug
  debug:
    server_url: http://receiver:8991
    app_id: app-1
    write_data: false
    device_id: dev-42
"#,
    );

    let config = load_config(&path).expect("Failed to load debug config");
    let debug = config
        .sink
        .backend_config
        .as_debug()
        .expect("Expected debug config");
    assert_eq!(debug.app_id, "app-1");
    assert!(!debug.write_data);
    assert_eq!(debug.device_id.as_deref(), Some("dev-42"));
}

#[test]
fn test_file_backend_config_with_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        r#"
sink:
  backend: file
  file:
    path: /var/log/events
"#,
    );

    let config = load_config(&path).expect("Failed to load file config");
    let file = config
        .sink
        .backend_config
        .as_file()
        .expect("Expected file config");
    assert_eq!(file.path, "/var/log/events");
    assert_eq!(file.prefix, "events.log");
}

#[test]
fn test_defaults_from_empty_sections() {
    let config: AppConfig = Default::default();

    assert!(!config.tracker.stringent);
    assert!(!config.tracker.strict);
    assert!(!config.tracker.auto_uuid);
    assert!(!config.tracker.zone_offset);
    assert_eq!(config.sink.backend, "file");
    assert_eq!(config.logging.level, "info");
    assert_eq!(config.logging.format, "text");
}

#[test]
fn test_rejects_empty_app_id() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        r#"
sink:
  backend: batch
  batch:
    server_url: http://receiver:8991
    app_id: ""
"#,
    );

    let err = load_config(&path).unwrap_err();
    assert!(err.to_string().to_lowercase().contains("config"));
}

#[test]
fn test_rejects_unknown_backend() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        r#"
sink:
  backend: kafka
  file:
    path: .
"#,
    );

    assert!(load_config(&path).is_err());
}

#[test]
fn test_missing_file_is_an_error() {
    assert!(load_config("/nonexistent/path/config.yaml").is_err());
}
