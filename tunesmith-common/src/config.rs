//! Bootstrap configuration and credential resolution
//!
//! Configuration is resolved in two tiers:
//! 1. Environment variables (credential, log filter)
//! 2. TOML configuration file
//!
//! Every setting has a built-in default, so a missing TOML file is not an error.
//! The generation endpoint credential is optional: when none is configured the
//! service runs in mock mode.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variables checked for the Gemini credential, in priority order
pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

/// Default Gemini REST base URL
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Upper bound on retries after the first attempt, for both the TOML default
/// and a per-request override
pub const MAX_RETRIES_LIMIT: u32 = 5;

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Gemini API key (lowest priority, environment wins)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemini_api_key: Option<String>,

    /// Base URL of the generateContent REST API
    #[serde(default = "default_base_url")]
    pub gemini_base_url: String,

    /// Model used when a request does not name one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,

    /// Upper bound on a single generation call
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Simulated latency of a mock generation
    #[serde(default = "default_mock_delay_ms")]
    pub mock_delay_ms: u64,

    /// Simulated latency of a mock enhancement
    #[serde(default = "default_enhance_mock_delay_ms")]
    pub enhance_mock_delay_ms: u64,

    /// Retries after the first attempt in generate-with-retry
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff before the first retry; doubles on each further retry
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            logging: LoggingConfig::default(),
            gemini_api_key: None,
            gemini_base_url: default_base_url(),
            default_model: None,
            request_timeout_secs: default_request_timeout_secs(),
            mock_delay_ms: default_mock_delay_ms(),
            enhance_mock_delay_ms: default_enhance_mock_delay_ms(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
        }
    }
}

fn default_port() -> u16 {
    5740
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_base_url() -> String {
    DEFAULT_GEMINI_BASE_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_mock_delay_ms() -> u64 {
    1500
}

fn default_enhance_mock_delay_ms() -> u64 {
    2000
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_base_delay_ms() -> u64 {
    1000
}

/// Default location of the TOML file: `<config dir>/tunesmith/tunesmith-ai.toml`
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("tunesmith").join("tunesmith-ai.toml"))
        .unwrap_or_else(|| PathBuf::from("tunesmith-ai.toml"))
}

/// Load TOML configuration
///
/// A missing file yields the built-in defaults. A file that exists but cannot
/// be read is an I/O error; one that cannot be parsed or holds out-of-range
/// values is a configuration error.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        info!("No config file at {}, using defaults", path.display());
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;

    if config.request_timeout_secs == 0 {
        return Err(Error::Config(
            "request_timeout_secs must be greater than zero".to_string(),
        ));
    }
    if config.max_retries > MAX_RETRIES_LIMIT {
        return Err(Error::Config(format!(
            "max_retries must be at most {}, got {}",
            MAX_RETRIES_LIMIT, config.max_retries
        )));
    }

    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Resolve the Gemini API key
///
/// **Priority:** `GEMINI_API_KEY` → `API_KEY` → TOML `gemini_api_key`
///
/// Returns `None` when no usable key exists; callers run in mock mode then.
pub fn resolve_api_key(toml_config: &TomlConfig) -> Option<String> {
    let mut candidates: Vec<(&str, String)> = API_KEY_ENV_VARS
        .iter()
        .filter_map(|name| std::env::var(name).ok().map(|key| (*name, key)))
        .collect();
    if let Some(key) = &toml_config.gemini_api_key {
        candidates.push(("TOML", key.clone()));
    }
    candidates.retain(|(_, key)| is_valid_key(key));

    if candidates.len() > 1 {
        let sources: Vec<&str> = candidates.iter().map(|(source, _)| *source).collect();
        warn!(
            "Gemini API key found in multiple sources: {}. Using {}.",
            sources.join(", "),
            sources[0]
        );
    }

    match candidates.into_iter().next() {
        Some((source, key)) => {
            info!("Gemini API key loaded from {}", source);
            Some(key.trim().to_string())
        }
        None => {
            warn!(
                "Gemini API key not configured (set {} or gemini_api_key in TOML). \
                 Running in mock mode.",
                API_KEY_ENV_VARS.join(" or ")
            );
            None
        }
    }
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TomlConfig::default();
        assert_eq!(config.port, 5740);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.retry_base_delay_ms, 1000);
        assert_eq!(config.gemini_base_url, DEFAULT_GEMINI_BASE_URL);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: TomlConfig = toml::from_str("port = 6000\n").unwrap();
        assert_eq!(config.port, 6000);
        assert_eq!(config.mock_delay_ms, 1500);
        assert_eq!(config.enhance_mock_delay_ms, 2000);
        assert!(config.gemini_api_key.is_none());
    }

    #[test]
    fn test_is_valid_key() {
        assert!(is_valid_key("abc"));
        assert!(!is_valid_key(""));
        assert!(!is_valid_key("   \t"));
    }
}
