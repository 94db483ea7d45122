//! Configuration loading and credential resolution tests
//!
//! Tests that manipulate GEMINI_API_KEY / API_KEY are marked with #[serial]
//! so they never run in parallel with each other.

use serial_test::serial;
use std::io::Write;
use tunesmith_common::config::{
    load_toml_config, resolve_api_key, TomlConfig, API_KEY_ENV_VARS, MAX_RETRIES_LIMIT,
};
use tunesmith_common::Error;

fn clear_env() {
    for name in API_KEY_ENV_VARS {
        std::env::remove_var(name);
    }
}

fn toml_with_key(key: Option<&str>) -> TomlConfig {
    TomlConfig {
        gemini_api_key: key.map(str::to_string),
        ..TomlConfig::default()
    }
}

// ============================================================================
// Resolution
// ============================================================================

#[test]
#[serial]
fn test_gemini_env_overrides_api_key_env_and_toml() {
    clear_env();
    std::env::set_var("GEMINI_API_KEY", "gemini-env-key");
    std::env::set_var("API_KEY", "generic-env-key");

    let result = resolve_api_key(&toml_with_key(Some("toml-key")));
    assert_eq!(result.as_deref(), Some("gemini-env-key"));

    clear_env();
}

#[test]
#[serial]
fn test_api_key_env_fallback() {
    clear_env();
    std::env::set_var("API_KEY", "generic-env-key");

    let result = resolve_api_key(&toml_with_key(Some("toml-key")));
    assert_eq!(result.as_deref(), Some("generic-env-key"));

    clear_env();
}

#[test]
#[serial]
fn test_toml_fallback_when_env_empty() {
    clear_env();

    let result = resolve_api_key(&toml_with_key(Some("toml-key")));
    assert_eq!(result.as_deref(), Some("toml-key"));
}

#[test]
#[serial]
fn test_whitespace_env_key_is_ignored() {
    clear_env();
    std::env::set_var("GEMINI_API_KEY", "   ");

    let result = resolve_api_key(&toml_with_key(Some("toml-key")));
    assert_eq!(result.as_deref(), Some("toml-key"));

    clear_env();
}

#[test]
#[serial]
fn test_no_key_means_mock_mode() {
    clear_env();

    assert_eq!(resolve_api_key(&toml_with_key(None)), None);
    assert_eq!(resolve_api_key(&toml_with_key(Some(""))), None);
}

// ============================================================================
// TOML loading
// ============================================================================

#[test]
fn test_missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = load_toml_config(&dir.path().join("absent.toml")).unwrap();

    assert_eq!(config.port, 5740);
    assert_eq!(config.request_timeout_secs, 30);
}

#[test]
fn test_load_full_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
port = 6100
gemini_api_key = "from-file"
default_model = "gemini-2.5-flash"
request_timeout_secs = 45
max_retries = 4

[logging]
level = "debug"
"#
    )
    .unwrap();

    let config = load_toml_config(file.path()).unwrap();
    assert_eq!(config.port, 6100);
    assert_eq!(config.gemini_api_key.as_deref(), Some("from-file"));
    assert_eq!(config.default_model.as_deref(), Some("gemini-2.5-flash"));
    assert_eq!(config.request_timeout_secs, 45);
    assert_eq!(config.max_retries, 4);
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.retry_base_delay_ms, 1000);
}

#[test]
fn test_malformed_file_is_config_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "port = \"not a number").unwrap();

    let err = load_toml_config(file.path()).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn test_zero_timeout_rejected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "request_timeout_secs = 0").unwrap();

    let err = load_toml_config(file.path()).unwrap_err();
    assert!(err.to_string().contains("request_timeout_secs"));
}

#[test]
fn test_max_retries_above_limit_rejected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "max_retries = {}", MAX_RETRIES_LIMIT + 1).unwrap();

    let err = load_toml_config(file.path()).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
    assert!(err.to_string().contains("max_retries"));
}

#[test]
fn test_max_retries_at_limit_accepted() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "max_retries = {}", MAX_RETRIES_LIMIT).unwrap();

    let config = load_toml_config(file.path()).unwrap();
    assert_eq!(config.max_retries, MAX_RETRIES_LIMIT);
}

#[test]
fn test_unreadable_path_is_io_error() {
    let dir = tempfile::tempdir().unwrap();

    let err = load_toml_config(dir.path()).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}
