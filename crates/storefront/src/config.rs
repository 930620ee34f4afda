//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `FLASH_FIESTA_API_URL` - Backend base URL (default: `http://localhost:8000/`)
//! - `FLASH_FIESTA_DATA_DIR` - Local storage directory (default: `.flash-fiesta`)
//! - `FLASH_FIESTA_SYNC_DEBOUNCE_MS` - Cart sync quiet period in ms (default: 1000)
//! - `FLASH_FIESTA_REQUEST_TIMEOUT_SECS` - HTTP request timeout (default: 10)
//! - `FLASH_FIESTA_ACCESS_TOKEN` - Bearer token to start the session with

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "http://localhost:8000/";
const DEFAULT_DATA_DIR: &str = ".flash-fiesta";
const DEFAULT_SYNC_DEBOUNCE_MS: u64 = 1000;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

const MIN_SYNC_DEBOUNCE_MS: u64 = 100;
const MAX_SYNC_DEBOUNCE_MS: u64 = 10_000;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
///
/// Implements `Debug` manually to redact the access token.
#[derive(Clone)]
pub struct ClientConfig {
    /// Backend base URL; always ends with `/` so endpoint paths join onto it
    pub api_url: Url,
    /// Directory holding the persisted cart and session token
    pub data_dir: PathBuf,
    /// Quiet period before a cart change is pushed to the server
    pub sync_debounce: Duration,
    /// Per-request HTTP timeout
    pub request_timeout: Duration,
    /// Bearer token supplied from outside, if any
    pub access_token: Option<SecretString>,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_url", &self.api_url.as_str())
            .field("data_dir", &self.data_dir)
            .field("sync_debounce", &self.sync_debounce)
            .field("request_timeout", &self.request_timeout)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl ClientConfig {
    /// Configuration with defaults for everything except the backend URL.
    #[must_use]
    pub fn new(api_url: Url) -> Self {
        Self {
            api_url: with_trailing_slash(api_url),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            sync_debounce: Duration::from_millis(DEFAULT_SYNC_DEBOUNCE_MS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            access_token: None,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_url = parse_api_url(
            "FLASH_FIESTA_API_URL",
            &get_env_or_default("FLASH_FIESTA_API_URL", DEFAULT_API_URL),
        )?;
        let data_dir = PathBuf::from(get_env_or_default("FLASH_FIESTA_DATA_DIR", DEFAULT_DATA_DIR));

        let debounce_ms = parse_u64(
            "FLASH_FIESTA_SYNC_DEBOUNCE_MS",
            &get_env_or_default(
                "FLASH_FIESTA_SYNC_DEBOUNCE_MS",
                &DEFAULT_SYNC_DEBOUNCE_MS.to_string(),
            ),
        )?;
        validate_debounce(debounce_ms, "FLASH_FIESTA_SYNC_DEBOUNCE_MS")?;

        let timeout_secs = parse_u64(
            "FLASH_FIESTA_REQUEST_TIMEOUT_SECS",
            &get_env_or_default(
                "FLASH_FIESTA_REQUEST_TIMEOUT_SECS",
                &DEFAULT_REQUEST_TIMEOUT_SECS.to_string(),
            ),
        )?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "FLASH_FIESTA_REQUEST_TIMEOUT_SECS".to_string(),
                "must be greater than 0".to_string(),
            ));
        }

        let access_token = get_optional_env("FLASH_FIESTA_ACCESS_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .map(SecretString::from);

        Ok(Self {
            api_url,
            data_dir,
            sync_debounce: Duration::from_millis(debounce_ms),
            request_timeout: Duration::from_secs(timeout_secs),
            access_token,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_u64(var_name: &str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar(var_name.to_string(), e.to_string()))
}

/// Parse the backend URL, requiring an absolute http(s) URL.
fn parse_api_url(var_name: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(var_name.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(with_trailing_slash(url))
}

fn validate_debounce(ms: u64, var_name: &str) -> Result<(), ConfigError> {
    if !(MIN_SYNC_DEBOUNCE_MS..=MAX_SYNC_DEBOUNCE_MS).contains(&ms) {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            format!("must be between {MIN_SYNC_DEBOUNCE_MS} and {MAX_SYNC_DEBOUNCE_MS} (got {ms})"),
        ));
    }
    Ok(())
}

/// `Url::join` drops the last path segment unless the base ends with `/`.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_names_the_variable() {
        let err = parse_u64("FLASH_FIESTA_SYNC_DEBOUNCE_MS", "soon").unwrap_err();
        let ConfigError::InvalidEnvVar(var, _) = &err;
        assert_eq!(var, "FLASH_FIESTA_SYNC_DEBOUNCE_MS");
        assert!(
            err.to_string()
                .starts_with("Invalid environment variable FLASH_FIESTA_SYNC_DEBOUNCE_MS")
        );
    }

    #[test]
    fn test_parse_api_url_adds_trailing_slash() {
        let url = parse_api_url("TEST_URL", "https://shop.example.com/backend").unwrap();
        assert_eq!(url.as_str(), "https://shop.example.com/backend/");
        assert_eq!(
            url.join("api/product/Cart/").unwrap().as_str(),
            "https://shop.example.com/backend/api/product/Cart/"
        );
    }

    #[test]
    fn test_parse_api_url_rejects_other_schemes() {
        let err = parse_api_url("TEST_URL", "ftp://example.com").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_parse_api_url_rejects_relative() {
        assert!(parse_api_url("TEST_URL", "/api").is_err());
    }

    #[test]
    fn test_validate_debounce_bounds() {
        assert!(validate_debounce(100, "X").is_ok());
        assert!(validate_debounce(10_000, "X").is_ok());
        assert!(validate_debounce(99, "X").is_err());
        assert!(validate_debounce(10_001, "X").is_err());
    }

    #[test]
    fn test_parse_u64_invalid() {
        let err = parse_u64("TEST_NUM", "soon").unwrap_err();
        assert!(err.to_string().contains("TEST_NUM"));
    }

    #[test]
    fn test_new_uses_defaults() {
        let config = ClientConfig::new(Url::parse("http://127.0.0.1:9000").unwrap());
        assert_eq!(config.api_url.as_str(), "http://127.0.0.1:9000/");
        assert_eq!(config.sync_debounce, Duration::from_millis(1000));
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert!(config.access_token.is_none());
    }

    #[test]
    fn test_config_debug_redacts_token() {
        let mut config = ClientConfig::new(Url::parse("http://localhost:8000").unwrap());
        config.access_token = Some(SecretString::from("eyJhbGciOiJIUzI1NiJ9.secret"));

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("localhost:8000"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("eyJhbGciOiJIUzI1NiJ9"));
    }
}
