//! Client configuration.
//!
//! # Environment Variables
//!
//! | Variable | Required | Description |
//! |---|---|---|
//! | `BLIP_API_KEY` | Yes | API key (Basic auth user) |
//! | `BLIP_SECRET_KEY` | Yes | Secret key (Basic auth password) |
//! | `BLIP_ENDPOINT` | No | Platform base URL, default [`DEFAULT_ENDPOINT`] |
//! | `BLIP_OBJECT_STORE_ENDPOINT` | No | Object store base URL, default [`DEFAULT_OBJECT_STORE_ENDPOINT`] |
//! | `BLIP_TIMEOUT_SECS` | No | Per-request timeout, default 60 |

use std::time::Duration;

use crate::ConfigError;

/// Production platform endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://blip.balihoo-cloud.com";

/// Object store that pre-signed uploads are posted to when the
/// authorization does not name an explicit URL.
pub const DEFAULT_OBJECT_STORE_ENDPOINT: &str = "https://s3.amazonaws.com";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Credentials and endpoints for one client.
///
/// Passed explicitly to each transport; nothing is read from process state
/// after construction.
#[derive(Clone)]
pub struct ClientConfig {
    /// API key, sent as the Basic auth user name.
    pub api_key: String,
    /// Secret key, sent as the Basic auth password.
    pub secret_key: String,
    /// Platform base URL, without a trailing slash.
    pub endpoint: String,
    /// Object store base URL, without a trailing slash.
    pub object_store_endpoint: String,
    /// Per-request timeout applied by the HTTP transport.
    pub timeout: Duration,
}

impl ClientConfig {
    /// Creates a configuration for the production endpoints.
    #[must_use]
    pub fn new(api_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            secret_key: secret_key.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            object_store_endpoint: DEFAULT_OBJECT_STORE_ENDPOINT.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_object_store_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.object_store_endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Reads the configuration from `BLIP_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnv`] if a key is unset and
    /// [`ConfigError::InvalidEnv`] if `BLIP_TIMEOUT_SECS` is not a number.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// See [`Self::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |name: &str| {
            lookup(name)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ConfigError::MissingEnv {
                    name: name.to_string(),
                })
        };

        let mut config = Self::new(require("BLIP_API_KEY")?, require("BLIP_SECRET_KEY")?);

        if let Some(endpoint) = lookup("BLIP_ENDPOINT").filter(|v| !v.is_empty()) {
            config = config.with_endpoint(endpoint);
        }
        if let Some(endpoint) = lookup("BLIP_OBJECT_STORE_ENDPOINT").filter(|v| !v.is_empty()) {
            config = config.with_object_store_endpoint(endpoint);
        }
        if let Some(secs) = lookup("BLIP_TIMEOUT_SECS").filter(|v| !v.is_empty()) {
            let parsed = secs.parse::<u64>().map_err(|_| ConfigError::InvalidEnv {
                name: "BLIP_TIMEOUT_SECS".to_string(),
                value: secs.clone(),
            })?;
            config = config.with_timeout(Duration::from_secs(parsed));
        }

        Ok(config)
    }
}

// Keeps the secret out of logs.
impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &self.api_key)
            .field("secret_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("object_store_endpoint", &self.object_store_endpoint)
            .field("timeout", &self.timeout)
            .finish()
    }
}
