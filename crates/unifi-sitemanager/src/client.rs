//! Asynchronous Site Manager client implementation.

use crate::models::{DeviceListParams, IspMetricsQuery, MetricInterval, MetricsWindow, PageParams};
use crate::Result;
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use unifi_core::client::{HttpConfig, RetryPolicy};
use unifi_core::session::DEFAULT_USER_AGENT;
use unifi_core::{Error, RequestExecutor, SessionManager, SiteManagerConfig};
use url::Url;

/// Path prefix of the early-access endpoints.
const EARLY_ACCESS: &str = "ea";

/// Builder for [`SiteManagerClient`].
#[derive(Debug, Clone)]
pub struct SiteManagerClientBuilder {
    config: SiteManagerConfig,
    http_config: HttpConfig,
    user_agent: String,
}

impl SiteManagerClientBuilder {
    /// Create a builder from a configuration.
    #[must_use]
    pub fn new(config: SiteManagerConfig) -> Self {
        Self {
            config,
            http_config: HttpConfig::default(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    /// Override the transport configuration used for new sessions.
    #[must_use]
    pub fn with_http_config(mut self, http_config: HttpConfig) -> Self {
        self.http_config = http_config;
        self
    }

    /// Override the retry policy for connection failures.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.http_config = self.http_config.with_retry_policy(retry);
        self
    }

    /// Override the `User-Agent` header.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Validate the configuration and build the client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the configuration is invalid.
    pub fn build(self) -> Result<SiteManagerClient> {
        let config = self.config.validated()?;
        let retry_policy = self.http_config.retry_policy;

        let sessions = SessionManager::new(&config.api_key, config.session_ttl(), self.http_config)?
            .with_user_agent(&self.user_agent)?;
        let executor =
            RequestExecutor::from_parts(config.api_url()?, config.timeout(), retry_policy, sessions);

        debug!(base_url = %executor.base_url(), "Site Manager client created");
        Ok(SiteManagerClient { config, executor })
    }
}

/// Asynchronous Site Manager client.
///
/// The client owns one session at a time and rotates it transparently. Share
/// it between tasks behind an [`Arc`](std::sync::Arc); all methods take
/// `&self`. Dropping the client releases its session, and [`close`](Self::close)
/// does the same explicitly.
#[derive(Debug)]
pub struct SiteManagerClient {
    config: SiteManagerConfig,
    executor: RequestExecutor,
}

impl SiteManagerClient {
    /// Construct a client with default settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the API key is empty.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        SiteManagerClientBuilder::new(SiteManagerConfig::new(api_key)?).build()
    }

    /// Construct a client directly from the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the configuration is invalid.
    pub fn from_config(config: &SiteManagerConfig) -> Result<Self> {
        SiteManagerClientBuilder::new(config.clone()).build()
    }

    /// Start a builder pre-populated with the provided configuration.
    #[must_use]
    pub fn builder(config: SiteManagerConfig) -> SiteManagerClientBuilder {
        SiteManagerClientBuilder::new(config)
    }

    /// The configuration this client was built from.
    #[must_use]
    pub const fn config(&self) -> &SiteManagerConfig {
        &self.config
    }

    /// Root URL of the versioned API, e.g. `https://api.ui.com/v1/`.
    #[must_use]
    pub fn api_url(&self) -> &Url {
        self.executor.base_url()
    }

    /// Identifier of the current session, if one is open.
    #[must_use]
    pub fn session_id(&self) -> Option<u64> {
        self.executor.sessions().current().map(|session| session.id())
    }

    /// Drop the current session; the next call opens a fresh one.
    pub fn refresh_session(&self) {
        self.executor.sessions().force_refresh();
    }

    /// Release the current session. Safe to call more than once.
    pub fn close(&self) {
        self.executor.close();
    }

    /// List hosts.
    pub async fn list_hosts(&self, page: &PageParams) -> Result<Value> {
        page.validate()?;
        self.send::<()>(Method::GET, "hosts", &page.to_pairs(), None)
            .await
    }

    /// Fetch a single host by identifier.
    pub async fn get_host(&self, host_id: &str) -> Result<Value> {
        let host_id = require_id("host_id", host_id)?;
        let path = format!("hosts/{host_id}");
        self.send::<()>(Method::GET, &path, &[], None).await
    }

    /// List sites.
    pub async fn list_sites(&self, page: &PageParams) -> Result<Value> {
        page.validate()?;
        self.send::<()>(Method::GET, "sites", &page.to_pairs(), None)
            .await
    }

    /// List devices, optionally filtered by host and last-seen time.
    pub async fn list_devices(&self, params: &DeviceListParams) -> Result<Value> {
        params.validate()?;
        self.send::<()>(Method::GET, "devices", &params.to_pairs(), None)
            .await
    }

    /// Fetch ISP metrics for all sites.
    pub async fn get_isp_metrics(
        &self,
        interval: MetricInterval,
        window: &MetricsWindow,
    ) -> Result<Value> {
        window.validate()?;
        let path = format!("{EARLY_ACCESS}/isp-metrics/{interval}");
        self.send::<()>(Method::GET, &path, &window.to_pairs(), None)
            .await
    }

    /// Query ISP metrics for selected sites and hosts.
    pub async fn query_isp_metrics(
        &self,
        interval: MetricInterval,
        query: &IspMetricsQuery,
    ) -> Result<Value> {
        query.validate()?;
        let path = format!("{EARLY_ACCESS}/isp-metrics/{interval}/query");
        self.send(Method::POST, &path, &[], Some(query)).await
    }

    /// List SD-WAN configurations.
    pub async fn list_sd_wan_configs(&self) -> Result<Value> {
        let path = format!("{EARLY_ACCESS}/sd-wan-configs");
        self.send::<()>(Method::GET, &path, &[], None).await
    }

    /// Fetch a single SD-WAN configuration by identifier.
    pub async fn get_sd_wan_config(&self, config_id: &str) -> Result<Value> {
        let config_id = require_id("config_id", config_id)?;
        let path = format!("{EARLY_ACCESS}/sd-wan-configs/{config_id}");
        self.send::<()>(Method::GET, &path, &[], None).await
    }

    /// Fetch the deployment status of an SD-WAN configuration.
    pub async fn get_sd_wan_config_status(&self, config_id: &str) -> Result<Value> {
        let config_id = require_id("config_id", config_id)?;
        let path = format!("{EARLY_ACCESS}/sd-wan-configs/{config_id}/status");
        self.send::<()>(Method::GET, &path, &[], None).await
    }

    async fn send<B>(
        &self,
        method: Method,
        path: &str,
        params: &[(&'static str, String)],
        body: Option<&B>,
    ) -> Result<Value>
    where
        B: Serialize + ?Sized,
    {
        self.executor.execute(method, path, params, body).await
    }
}

/// Characters that would change the meaning of the request path.
const PATH_DELIMITERS: [char; 3] = ['/', '?', '#'];

fn require_id<'a>(name: &str, value: &'a str) -> Result<&'a str> {
    if value.trim().is_empty() {
        return Err(Error::Validation(format!("{name} cannot be empty")));
    }
    if value.contains(PATH_DELIMITERS) || value == "." || value == ".." {
        return Err(Error::Validation(format!(
            "{name} cannot contain '/', '?' or '#': `{value}`"
        )));
    }
    Ok(value)
}
