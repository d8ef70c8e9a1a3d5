//! Client configuration for the SUSE Observability API.
//!
//! Provides the endpoint, token and transport settings used to build an
//! [`ObservabilityClient`](super::ObservabilityClient). Configuration is
//! loaded from environment variables with defaults for local development,
//! and the CLI overrides individual values.

use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Missing required value.
    #[error("Missing required configuration value: {0}")]
    MissingValue(String),

    /// Invalid configuration value.
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue {
        /// Configuration key.
        key: String,
        /// Error message.
        message: String,
    },
}

/// Which header carries the token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Service token, sent as `X-API-Key`.
    #[default]
    Service,
    /// Personal API token, sent as `X-API-Token`.
    Api,
}

impl TokenKind {
    /// Request header name for this token kind.
    pub fn header(&self) -> &'static str {
        match self {
            TokenKind::Service => "X-API-Key",
            TokenKind::Api => "X-API-Token",
        }
    }
}

/// Configuration of the SUSE Observability API client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// API endpoint.
    pub endpoint: ServiceEndpoint,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Whether to verify TLS certificates (self-signed installs may need false).
    pub verify_tls: bool,
}

impl Default for ServiceConfig {
    /// Returns default configuration suitable for local development.
    fn default() -> Self {
        Self {
            endpoint: ServiceEndpoint {
                base_url: "http://localhost:8080".to_string(),
                token: None,
                token_kind: TokenKind::Service,
            },
            timeout_secs: 30,
            verify_tls: true,
        }
    }
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `SUSE_OBSERVABILITY_URL`: API URL (default: http://localhost:8080)
    /// - `SUSE_OBSERVABILITY_TOKEN`: service or API token
    /// - `SUSE_OBSERVABILITY_API_TOKEN`: `true` when the token is an API token (default: false)
    /// - `SUSE_OBSERVABILITY_TIMEOUT_SECS`: request timeout in seconds (default: 30)
    /// - `SUSE_OBSERVABILITY_VERIFY_TLS`: whether to verify TLS (default: true)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let default = Self::default();
        let flag = |key: &str, fallback: bool| {
            lookup(key)
                .map(|s| {
                    let s = s.trim().to_ascii_lowercase();
                    s != "false" && s != "0" && !s.is_empty()
                })
                .unwrap_or(fallback)
        };

        Self {
            endpoint: ServiceEndpoint {
                base_url: lookup("SUSE_OBSERVABILITY_URL").unwrap_or(default.endpoint.base_url),
                token: lookup("SUSE_OBSERVABILITY_TOKEN").filter(|t| !t.is_empty()),
                token_kind: if flag("SUSE_OBSERVABILITY_API_TOKEN", false) {
                    TokenKind::Api
                } else {
                    TokenKind::Service
                },
            },
            timeout_secs: lookup("SUSE_OBSERVABILITY_TIMEOUT_SECS")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(default.timeout_secs),
            verify_tls: flag("SUSE_OBSERVABILITY_VERIFY_TLS", default.verify_tls),
        }
    }

    /// Get the request timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check that the configuration can reach an installation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.endpoint.parsed_url()?;
        if !self.endpoint.has_auth() {
            return Err(ConfigError::MissingValue("token".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "timeout_secs".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

/// Address and credentials of a SUSE Observability installation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceEndpoint {
    /// Base URL (e.g., "https://observability.example.com").
    pub base_url: String,

    /// Static token.
    pub token: Option<String>,

    /// How the token is presented.
    pub token_kind: TokenKind,
}

impl ServiceEndpoint {
    /// Build a full API URL: `<base>/api/<path>`.
    pub fn url(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{}/api/{}", base, path)
    }

    /// Check if token authentication is available.
    pub fn has_auth(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Parse and validate the base URL.
    pub fn parsed_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(self.base_url.trim()).map_err(|e| ConfigError::InvalidValue {
            key: "url".to_string(),
            message: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidValue {
                key: "url".to_string(),
                message: format!("unsupported scheme '{}'", url.scheme()),
            });
        }
        Ok(url)
    }
}
