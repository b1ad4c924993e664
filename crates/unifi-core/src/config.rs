//! Configuration for Site Manager clients.
//!
//! [`SiteManagerConfig`] is the immutable client configuration: API key, API
//! host and version, request timeout and session time-to-live. It is validated
//! on construction and again whenever a client is built from it.

use crate::client::{DEFAULT_SESSION_TTL_MINUTES, DEFAULT_TIMEOUT_SECS};
use crate::Error;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;
use url::Url;
use validator::Validate;

/// Default Site Manager API host.
pub const DEFAULT_BASE_URL: &str = "https://api.ui.com";

/// Default API version path segment.
pub const DEFAULT_API_VERSION: &str = "v1";

/// Configuration for a Site Manager client instance.
///
/// The API key is kept in a [`SecretString`] and is only exposed when the
/// authentication header of a new session is built.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SiteManagerConfig {
    /// API key sent as the `X-API-Key` header
    pub api_key: SecretString,

    /// API host, without the version segment
    #[validate(url)]
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API version path segment (e.g. `v1`)
    #[validate(length(min = 1, max = 16))]
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Request timeout in seconds
    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Session time-to-live in minutes
    #[validate(range(min = 1, max = 1440))]
    #[serde(default = "default_session_ttl_minutes")]
    pub session_ttl_minutes: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

const fn default_request_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

const fn default_session_ttl_minutes() -> u64 {
    DEFAULT_SESSION_TTL_MINUTES
}

impl SiteManagerConfig {
    /// Create a new configuration with default settings.
    ///
    /// # Arguments
    ///
    /// * `api_key` - The Site Manager API key
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the API key is empty.
    pub fn new(api_key: impl Into<String>) -> Result<Self, Error> {
        let config = Self {
            api_key: SecretString::from(api_key.into()),
            base_url: default_base_url(),
            api_version: default_api_version(),
            request_timeout_secs: default_request_timeout_secs(),
            session_ttl_minutes: default_session_ttl_minutes(),
        };

        config.validated()
    }

    /// Set the API host (useful for proxies and tests).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the API version segment.
    #[must_use]
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Set request timeout in seconds.
    #[must_use]
    pub const fn with_timeout(mut self, seconds: u64) -> Self {
        self.request_timeout_secs = seconds;
        self
    }

    /// Set session time-to-live in minutes.
    #[must_use]
    pub const fn with_session_ttl_minutes(mut self, minutes: u64) -> Self {
        self.session_ttl_minutes = minutes;
        self
    }

    /// Validate the configuration and return it unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for an empty API key, a malformed base
    /// URL or API version, or an out-of-range timeout or TTL.
    pub fn validated(self) -> Result<Self, Error> {
        if self.api_key.expose_secret().trim().is_empty() {
            return Err(Error::Validation("API key cannot be empty".to_string()));
        }

        if self.api_version.contains('/') {
            return Err(Error::Validation(format!(
                "Invalid API version `{}`: must be a single path segment",
                self.api_version
            )));
        }

        self.validate()?;

        Ok(self)
    }

    /// Get the request timeout as a Duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Get the session time-to-live as a Duration.
    #[must_use]
    pub const fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_minutes * 60)
    }

    /// Root URL that endpoint paths are joined onto, e.g. `https://api.ui.com/v1/`.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL cannot be parsed.
    pub fn api_url(&self) -> Result<Url, Error> {
        let root = format!(
            "{}/{}/",
            self.base_url.trim_end_matches('/'),
            self.api_version
        );
        Ok(Url::parse(&root)?)
    }
}
