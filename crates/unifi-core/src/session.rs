//! Session lifecycle management.
//!
//! A [`Session`] is a pooled HTTP transport carrying the default headers every
//! request needs. The [`SessionManager`] owns at most one current session,
//! creates it lazily, replaces it once it is older than the configured
//! time-to-live and drops it on refresh or close.
//!
//! All reads and writes of the current session happen under one mutex. The
//! lock is only held while deciding whether to create, rotate or clear the
//! session; requests run against a cloned [`Arc<Session>`] outside of it, so
//! concurrent calls are never serialized behind the lock.

use crate::client::HttpConfig;
use crate::error::{ApiError, Error, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, USER_AGENT};
use secrecy::{ExposeSecret, SecretString};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Fixed client identifier sent as `User-Agent`.
pub const DEFAULT_USER_AGENT: &str = concat!("unifi-sitemanager/", env!("CARGO_PKG_VERSION"));

/// A reusable transport handle with pooled connections and default headers.
#[derive(Debug)]
pub struct Session {
    id: u64,
    http: reqwest::Client,
    headers: HeaderMap,
    created_at: Instant,
}

impl Session {
    /// Identifier of this session, unique and increasing per manager.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// The underlying HTTP client.
    #[must_use]
    pub const fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Default headers attached to every request made through this session.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// When the session was created.
    #[must_use]
    pub const fn created_at(&self) -> Instant {
        self.created_at
    }

    fn is_expired_at(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.created_at) > ttl
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        debug!(session_id = self.id, "Session released");
    }
}

struct SessionSlot {
    current: Option<Arc<Session>>,
    next_id: u64,
}

/// Owner of the current [`Session`].
pub struct SessionManager {
    headers: HeaderMap,
    ttl: Duration,
    http_config: HttpConfig,
    slot: Mutex<SessionSlot>,
}

impl SessionManager {
    /// Create a manager. No session is created until the first [`acquire`](Self::acquire).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the API key cannot be sent as a header value.
    pub fn new(api_key: &SecretString, ttl: Duration, http_config: HttpConfig) -> Result<Self> {
        let mut key = HeaderValue::from_str(api_key.expose_secret()).map_err(|_| {
            Error::Validation("API key contains characters not allowed in a header".to_string())
        })?;
        key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(HeaderName::from_static(API_KEY_HEADER), key);
        headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));

        Ok(Self {
            headers,
            ttl,
            http_config,
            slot: Mutex::new(SessionSlot {
                current: None,
                next_id: 1,
            }),
        })
    }

    /// Override the `User-Agent` sent by sessions created from now on.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the value is not a valid header value.
    pub fn with_user_agent(mut self, user_agent: &str) -> Result<Self> {
        let value = HeaderValue::from_str(user_agent)
            .map_err(|_| Error::Validation(format!("Invalid user agent `{user_agent}`")))?;
        self.headers.insert(USER_AGENT, value);
        Ok(self)
    }

    /// Configured session time-to-live.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return a non-expired session, creating or rotating it as needed.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Transport`] if the HTTP client cannot be built.
    pub fn acquire(&self) -> Result<Arc<Session>> {
        let mut slot = self.lock();
        let now = Instant::now();

        if let Some(session) = &slot.current {
            if !session.is_expired_at(now, self.ttl) {
                return Ok(Arc::clone(session));
            }
            info!(session_id = session.id, "Session expired, creating new session");
        }

        // Release the stale session before opening a new one.
        slot.current = None;

        let id = slot.next_id;
        let session = Arc::new(self.build_session(id, now)?);
        slot.next_id += 1;
        slot.current = Some(Arc::clone(&session));

        debug!(session_id = id, "New session created");
        Ok(session)
    }

    /// Drop the current session so the next acquisition creates a fresh one.
    pub fn force_refresh(&self) {
        let released = self.lock().current.take();
        if let Some(session) = released {
            info!(session_id = session.id, "Session manually refreshed");
        }
    }

    /// Release the current session. Safe to call any number of times.
    pub fn close(&self) {
        if let Some(session) = self.lock().current.take() {
            debug!(session_id = session.id, "Session closed");
        }
    }

    /// Peek at the current session without creating or rotating it.
    #[must_use]
    pub fn current(&self) -> Option<Arc<Session>> {
        self.lock().current.clone()
    }

    fn build_session(&self, id: u64, created_at: Instant) -> Result<Session> {
        let http = reqwest::Client::builder()
            .default_headers(self.headers.clone())
            .connect_timeout(self.http_config.connect_timeout)
            .pool_idle_timeout(self.http_config.pool_idle_timeout)
            .pool_max_idle_per_host(self.http_config.pool_max_idle_per_host)
            .tcp_keepalive(self.http_config.tcp_keepalive)
            .build()
            .map_err(|err| ApiError::Transport(format!("Failed to build HTTP client: {err}")))?;

        Ok(Session {
            id,
            http,
            headers: self.headers.clone(),
            created_at,
        })
    }

    // The slot is always left consistent, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, SessionSlot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("ttl", &self.ttl)
            .field("current", &self.current().map(|session| session.id))
            .finish_non_exhaustive()
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        self.close();
    }
}
