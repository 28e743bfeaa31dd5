//! Runtime configuration for the Celium client.

use std::fmt;
use std::time::Duration;

use crate::error::{ApiError, Result};

/// Production Celium API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://celiumcompute.ai/api";

/// Default timeout for upstream requests.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Validated settings, built once at startup and handed to [`crate::api::CeliumClient`].
#[derive(Clone)]
pub struct Config {
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl Config {
    /// Build a config, rejecting a missing or blank API key.
    pub fn new(api_key: Option<String>, base_url: &str, timeout: Duration) -> Result<Self> {
        let api_key = api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ApiError::Config("CELIUM_API_KEY is not set".to_string()))?;

        let url = reqwest::Url::parse(base_url)
            .map_err(|e| ApiError::Config(format!("invalid base URL {base_url:?}: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ApiError::Config(format!("base URL {base_url:?} must use http or https")));
        }

        if timeout.is_zero() {
            return Err(ApiError::Config("timeout must be greater than zero".to_string()));
        }

        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    /// Config pointing at the production endpoint with the default timeout.
    pub fn with_api_key(api_key: impl Into<String>) -> Result<Self> {
        Self::new(
            Some(api_key.into()),
            DEFAULT_BASE_URL,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_api_key_is_rejected() {
        let err = Config::new(None, DEFAULT_BASE_URL, Duration::from_secs(30)).unwrap_err();
        assert!(matches!(err, ApiError::Config(_)));
    }

    #[test]
    fn blank_api_key_is_rejected() {
        let err = Config::new(Some("   ".into()), DEFAULT_BASE_URL, Duration::from_secs(30))
            .unwrap_err();
        assert!(matches!(err, ApiError::Config(_)));
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = Config::new(Some("key".into()), "not a url", Duration::from_secs(30))
            .unwrap_err();
        assert!(matches!(err, ApiError::Config(_)));
    }

    #[test]
    fn non_http_base_url_is_rejected() {
        let err = Config::new(
            Some("key".into()),
            "mailto:ops@example.com",
            Duration::from_secs(30),
        )
        .unwrap_err();
        assert!(matches!(err, ApiError::Config(_)));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = Config::new(Some("key".into()), DEFAULT_BASE_URL, Duration::ZERO).unwrap_err();
        assert!(matches!(err, ApiError::Config(_)));
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let config = Config::new(
            Some("key".into()),
            "http://localhost:9000/api/",
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(config.base_url(), "http://localhost:9000/api");
    }

    #[test]
    fn debug_output_hides_api_key() {
        let config = Config::with_api_key("super-secret").unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret"));
        assert_eq!(config.api_key(), "super-secret");
        assert_eq!(config.timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }
}
