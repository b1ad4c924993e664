//! Single request path for every endpoint call.
//!
//! [`RequestExecutor::execute`] acquires a session, issues the request with the
//! configured timeout and decodes the JSON body. A 401 or 403 response forces a
//! session refresh and the request is retried exactly once; whatever the retry
//! returns is final. Every failure is normalized into an [`ApiError`].

use crate::client::{HttpConfig, RetryPolicy};
use crate::config::SiteManagerConfig;
use crate::error::{ApiError, Error, Result};
use crate::session::{Session, SessionManager};
use reqwest::{Method, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, warn};
use url::Url;

/// Longest slice of an error body included in log events.
const LOGGED_BODY_LIMIT: usize = 512;

/// Executes requests against the Site Manager API.
#[derive(Debug)]
pub struct RequestExecutor {
    base_url: Url,
    timeout: Duration,
    retry_policy: RetryPolicy,
    sessions: SessionManager,
}

impl RequestExecutor {
    /// Create an executor from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the base URL or API key is unusable.
    pub fn new(config: &SiteManagerConfig, http_config: HttpConfig) -> Result<Self> {
        let retry_policy = http_config.retry_policy;
        let sessions = SessionManager::new(&config.api_key, config.session_ttl(), http_config)?;
        Ok(Self::from_parts(
            config.api_url()?,
            config.timeout(),
            retry_policy,
            sessions,
        ))
    }

    /// Assemble an executor from an existing session manager.
    #[must_use]
    pub fn from_parts(
        base_url: Url,
        timeout: Duration,
        retry_policy: RetryPolicy,
        sessions: SessionManager,
    ) -> Self {
        Self {
            base_url,
            timeout,
            retry_policy,
            sessions,
        }
    }

    /// Root URL endpoint paths are joined onto.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Per-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The session manager backing this executor.
    #[must_use]
    pub const fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Release the current session. Idempotent.
    pub fn close(&self) {
        self.sessions.close();
    }

    /// Issue a request and decode the JSON response.
    ///
    /// `path` is relative to [`base_url`](Self::base_url). `params` become the
    /// query string and `body`, when present, is sent as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] for HTTP, timeout, transport and decode failures,
    /// after at most one authentication retry.
    pub async fn execute<B, R>(
        &self,
        method: Method,
        path: &str,
        params: &[(&'static str, String)],
        body: Option<&B>,
    ) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.build_url(path)?;

        let result = match self.attempt(&method, &url, params, body).await {
            Err(Error::Api(api)) if api.is_auth_failure() => {
                warn!(
                    %method,
                    path,
                    error = %api,
                    "Authentication error, attempting session refresh"
                );
                self.sessions.force_refresh();
                self.attempt(&method, &url, params, body).await
            }
            other => other,
        };

        if let Err(Error::Api(api)) = &result {
            log_failure(&method, path, api);
        }

        result
    }

    fn build_url(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    async fn attempt<B, R>(
        &self,
        method: &Method,
        url: &Url,
        params: &[(&'static str, String)],
        body: Option<&B>,
    ) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let session = self.sessions.acquire()?;
        let response = self.send(&session, method, url, params, body).await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ApiError::Http {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let bytes = response.bytes().await.map_err(|err| self.normalize(&err))?;
        serde_json::from_slice(&bytes).map_err(|err| ApiError::Decode(err.to_string()).into())
    }

    async fn send<B>(
        &self,
        session: &Session,
        method: &Method,
        url: &Url,
        params: &[(&'static str, String)],
        body: Option<&B>,
    ) -> std::result::Result<Response, ApiError>
    where
        B: Serialize + ?Sized,
    {
        let mut attempt = 0;

        loop {
            let mut request = session
                .http()
                .request(method.clone(), url.clone())
                .timeout(self.timeout);
            if !params.is_empty() {
                request = request.query(params);
            }
            if let Some(payload) = body {
                request = request.json(payload);
            }

            debug!(%method, url = %url, session_id = session.id(), attempt, "Sending request");

            match request.send().await {
                Ok(response) => return Ok(response),
                Err(err) if is_retryable(&err) && attempt < self.retry_policy.max_retries => {
                    attempt += 1;
                    let delay = self.retry_policy.delay_for_attempt(attempt);
                    warn!(
                        %method,
                        url = %url,
                        attempt,
                        error = %describe(&err),
                        "Connection failed, retrying after {:?}",
                        delay
                    );
                    if delay > Duration::from_millis(0) {
                        sleep(delay).await;
                    }
                }
                Err(err) => return Err(self.normalize(&err)),
            }
        }
    }

    fn normalize(&self, err: &reqwest::Error) -> ApiError {
        if err.is_timeout() {
            ApiError::Timeout(self.timeout)
        } else {
            ApiError::Transport(describe(err))
        }
    }
}

/// Connection failures are worth another attempt; a connect timeout has
/// already spent its budget and is reported as a timeout.
fn is_retryable(err: &reqwest::Error) -> bool {
    err.is_connect() && !err.is_timeout()
}

/// Render an error together with its source chain.
fn describe(err: &(dyn std::error::Error + 'static)) -> String {
    let mut description = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        description.push_str(": ");
        description.push_str(&cause.to_string());
        source = cause.source();
    }
    description
}

fn log_failure(method: &Method, path: &str, err: &ApiError) {
    match err {
        ApiError::Http { status, body } => {
            let excerpt: String = body.chars().take(LOGGED_BODY_LIMIT).collect();
            error!(%method, path, status, body = %excerpt, "HTTP error");
        }
        ApiError::Timeout(timeout) => {
            error!(%method, path, "Request timed out after {} seconds", timeout.as_secs());
        }
        ApiError::Transport(description) => {
            error!(%method, path, error = %description, "Request failed");
        }
        ApiError::Decode(detail) => {
            error!(%method, path, error = %detail, "Invalid JSON response");
        }
    }
}
