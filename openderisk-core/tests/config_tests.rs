//! Integration tests for configuration loading, saving and validation

use openderisk_core::config::{
    get_config, load, load_from_yaml, save_config, ConfigError, OpenDeriskConfig, OutputFormat,
};
use serde_json::json;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Helper to create a test config file
fn create_test_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_load_valid_yaml_config() {
    std::env::set_var("ODR_CONFIG_TEST_HOST", "derisk.internal");

    let yaml = r#"
version: "1.0"
api:
  base_url: http://${ODR_CONFIG_TEST_HOST}:7777
  timeout: 45
  retry_max_attempts: 5
defaults:
  output_format: json
logging:
  level: debug
"#;

    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "config.yaml", yaml);

    let config = load_from_yaml(path).unwrap();
    assert_eq!(config.api.base_url, "http://derisk.internal:7777");
    assert_eq!(config.api.timeout, 45);
    assert_eq!(config.api.retry_max_attempts, 5);
    assert_eq!(config.api.retry_backoff_factor, 0.5);
    assert_eq!(config.defaults.output_format, OutputFormat::Json);
    assert_eq!(config.logging.level, "debug");

    std::env::remove_var("ODR_CONFIG_TEST_HOST");
}

#[test]
fn test_missing_explicit_path_gives_defaults() {
    let dir = TempDir::new().unwrap();
    let config = load(Some(&dir.path().join("absent.yaml"))).unwrap();
    assert_eq!(config, OpenDeriskConfig::default());
}

#[test]
fn test_empty_file_gives_defaults() {
    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "config.yaml", "");
    assert_eq!(load_from_yaml(path).unwrap(), OpenDeriskConfig::default());
}

#[test]
fn test_invalid_yaml_reports_location() {
    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "config.yaml", "api:\n  timeout: [unclosed\n");

    match load_from_yaml(path) {
        Err(ConfigError::Parse { line, .. }) => assert!(line.is_some()),
        other => panic!("Expected Parse error, got {:?}", other),
    }
}

#[test]
fn test_missing_placeholder_variable() {
    let dir = TempDir::new().unwrap();
    let path = create_test_file(
        &dir,
        "config.yaml",
        "api:\n  base_url: ${ODR_CONFIG_TEST_UNSET}\n",
    );

    assert!(matches!(
        load_from_yaml(path),
        Err(ConfigError::MissingEnvVar { .. })
    ));
}

#[test]
fn test_get_config_validates() {
    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "config.yaml", "api:\n  timeout: 0\n");

    match get_config(Some(&path)) {
        Err(ConfigError::Validation(err)) => assert_eq!(err.field_path, "api.timeout"),
        other => panic!("Expected ValidationError, got {:?}", other),
    }
}

#[test]
fn test_get_config_rejects_non_http_url() {
    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "config.yaml", "api:\n  base_url: ftp://derisk\n");

    assert!(matches!(
        get_config(Some(&path)),
        Err(ConfigError::Validation(_))
    ));
}

#[test]
fn test_save_then_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join(".openderisk").join("config.yaml");

    let mut config = OpenDeriskConfig::default();
    config.set("api.base_url", json!("https://derisk.example.com")).unwrap();
    config.set_from_str("api.timeout", "120").unwrap();
    config.set_from_str("defaults.output_format", "json").unwrap();

    save_config(&config, &path).unwrap();
    assert!(path.exists());

    let loaded = load_from_yaml(&path).unwrap();
    assert_eq!(loaded, config);
    assert_eq!(loaded.get("api.timeout"), Some(json!(120)));
}
