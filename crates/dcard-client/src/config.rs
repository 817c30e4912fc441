//! Collaborator service configuration.
//!
//! Base URLs for the template renderer and the document-signing service.
//! Defaults point at a local deployment. Override via environment variables
//! or explicit construction for staging/testing.

use url::Url;

/// Path of the PDF signing endpoint on the key manager.
pub const PDF_SIGN_PATH: &str = "v1/keymanager/pdf/sign";

/// Configuration for reaching the collaborator services.
///
/// Custom `Debug` implementation redacts the `api_token` field.
#[derive(Clone)]
pub struct ServiceConfig {
    /// Base URL of the template renderer.
    pub render_url: Url,
    /// Full URL of the PDF signing endpoint.
    pub sign_url: Url,
    /// Optional bearer token sent to both services.
    pub api_token: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl std::fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("render_url", &self.render_url)
            .field("sign_url", &self.sign_url)
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `DCARD_RENDER_URL` (default: `http://localhost:8086/`)
    /// - `DCARD_SIGN_URL` (default: `http://localhost:8088/v1/keymanager/pdf/sign`)
    /// - `DCARD_API_TOKEN` (optional)
    /// - `DCARD_TIMEOUT_SECS` (default: 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            render_url: env_url("DCARD_RENDER_URL", "http://localhost:8086/")?,
            sign_url: env_url(
                "DCARD_SIGN_URL",
                &format!("http://localhost:8088/{PDF_SIGN_PATH}"),
            )?,
            api_token: std::env::var("DCARD_API_TOKEN").ok().filter(|t| !t.is_empty()),
            timeout_secs: match std::env::var("DCARD_TIMEOUT_SECS") {
                Ok(raw) => raw
                    .parse()
                    .map_err(|_| ConfigError::InvalidTimeout(raw))?,
                Err(_) => 30,
            },
        })
    }

    /// Point both services at one local mock server (for testing).
    pub fn local_mock(port: u16, token: Option<&str>) -> Result<Self, ConfigError> {
        let base = Url::parse(&format!("http://127.0.0.1:{port}/"))
            .map_err(|e| ConfigError::InvalidUrl("localhost".to_string(), e.to_string()))?;
        let sign_url = base
            .join(PDF_SIGN_PATH)
            .map_err(|e| ConfigError::InvalidUrl("localhost".to_string(), e.to_string()))?;
        Ok(Self {
            render_url: base,
            sign_url,
            api_token: token.map(str::to_string),
            timeout_secs: 5,
        })
    }
}

fn env_url(var: &str, default: &str) -> Result<Url, ConfigError> {
    let raw = std::env::var(var).unwrap_or_else(|_| default.to_string());
    Url::parse(&raw).map_err(|e| ConfigError::InvalidUrl(var.to_string(), e.to_string()))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("DCARD_TIMEOUT_SECS must be a whole number of seconds, got {0:?}")]
    InvalidTimeout(String),
    #[error("API token contains characters not allowed in a header")]
    InvalidToken,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_mock_builds_valid_config() {
        let cfg = ServiceConfig::local_mock(9000, Some("test-token")).unwrap();
        assert_eq!(cfg.render_url.as_str(), "http://127.0.0.1:9000/");
        assert_eq!(
            cfg.sign_url.as_str(),
            "http://127.0.0.1:9000/v1/keymanager/pdf/sign"
        );
        assert_eq!(cfg.timeout_secs, 5);
    }

    #[test]
    fn debug_redacts_token() {
        let cfg = ServiceConfig::local_mock(9000, Some("super-secret")).unwrap();
        let debug = format!("{cfg:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn env_url_uses_default_when_var_absent() {
        let url = env_url("DCARD_NONEXISTENT_VAR_12345", "https://example.com").unwrap();
        assert_eq!(url.as_str(), "https://example.com/");
    }

    #[test]
    fn env_url_rejects_invalid_url() {
        std::env::set_var("DCARD_TEST_BAD_URL", "not a url");
        let result = env_url("DCARD_TEST_BAD_URL", "https://example.com");
        std::env::remove_var("DCARD_TEST_BAD_URL");
        assert!(matches!(result, Err(ConfigError::InvalidUrl(var, _)) if var == "DCARD_TEST_BAD_URL"));
    }
}
