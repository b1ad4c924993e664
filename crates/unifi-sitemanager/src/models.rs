//! Request parameters for Site Manager endpoints.
//!
//! Each type validates itself before a request is issued, so invalid input
//! fails fast with [`Error::Validation`] and never reaches the network.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use unifi_core::query::QueryParams;
use unifi_core::timestamp::{parse_rfc3339, validate_range};
use unifi_core::Error;

/// Smallest accepted page size.
pub const MIN_PAGE_SIZE: u32 = 1;
/// Largest accepted page size.
pub const MAX_PAGE_SIZE: u32 = 100;
/// Page size used when none is given.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Pagination parameters shared by the list endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageParams {
    /// Number of results per page (1-100).
    pub page_size: u32,
    /// Token returned by a previous page.
    pub next_token: Option<String>,
}

impl PageParams {
    /// Parameters for the first page with the default page size.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            next_token: None,
        }
    }

    /// Set the page size.
    #[must_use]
    pub const fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Continue from a previous page.
    #[must_use]
    pub fn with_next_token(mut self, token: impl Into<String>) -> Self {
        self.next_token = Some(token.into());
        self
    }

    /// Check the page size range.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the page size is outside 1-100.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_PAGE_SIZE..=MAX_PAGE_SIZE).contains(&self.page_size) {
            return Err(Error::Validation(format!(
                "page_size must be between {MIN_PAGE_SIZE} and {MAX_PAGE_SIZE}, got {}",
                self.page_size
            )));
        }
        Ok(())
    }

    fn push_into(&self, params: &mut QueryParams) {
        params.push("pageSize", self.page_size);
        params.push_opt("nextToken", self.next_token.as_deref());
    }

    /// Convert into query pairs.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut params = QueryParams::new();
        self.push_into(&mut params);
        params.into_pairs()
    }
}

impl Default for PageParams {
    fn default() -> Self {
        Self::new()
    }
}

/// Parameters for listing devices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceListParams {
    /// Pagination.
    pub page: PageParams,
    /// Only devices seen since this RFC3339 timestamp.
    pub time: Option<String>,
    /// Restrict to devices managed by these hosts.
    pub host_ids: Vec<String>,
}

impl DeviceListParams {
    /// Parameters with default pagination and no filters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the pagination parameters.
    #[must_use]
    pub fn with_page(mut self, page: PageParams) -> Self {
        self.page = page;
        self
    }

    /// Filter by last-seen timestamp.
    #[must_use]
    pub fn with_time(mut self, time: impl Into<String>) -> Self {
        self.time = Some(time.into());
        self
    }

    /// Filter by host identifiers.
    #[must_use]
    pub fn with_host_ids<I, S>(mut self, host_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.host_ids = host_ids.into_iter().map(Into::into).collect();
        self
    }

    /// Validate pagination, timestamp and host identifiers.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] on the first invalid field.
    pub fn validate(&self) -> Result<()> {
        self.page.validate()?;
        if let Some(time) = &self.time {
            parse_rfc3339(time)?;
        }
        if self.host_ids.iter().any(|id| id.trim().is_empty()) {
            return Err(Error::Validation(
                "host_ids cannot contain empty values".to_string(),
            ));
        }
        Ok(())
    }

    /// Convert into query pairs.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut params = QueryParams::new();
        self.page.push_into(&mut params);
        params.push_opt("time", self.time.as_deref());
        params.push_csv("hostIds", &self.host_ids);
        params.into_pairs()
    }
}

/// Aggregation interval of ISP metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricInterval {
    /// Five minute buckets.
    #[default]
    #[serde(rename = "5m")]
    FiveMinutes,
    /// One hour buckets.
    #[serde(rename = "1h")]
    OneHour,
}

impl MetricInterval {
    /// Path segment used by the API.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::FiveMinutes => "5m",
            Self::OneHour => "1h",
        }
    }
}

impl fmt::Display for MetricInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricInterval {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "5m" => Ok(Self::FiveMinutes),
            "1h" => Ok(Self::OneHour),
            other => Err(Error::Validation(format!(
                "Invalid metric type `{other}`: must be either '5m' or '1h'"
            ))),
        }
    }
}

/// Time window for ISP metrics: either a relative duration or an absolute
/// begin/end range, never both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsWindow {
    /// Relative window such as `24h`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    /// Start of the range (RFC3339).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub begin_timestamp: Option<String>,
    /// End of the range (RFC3339).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_timestamp: Option<String>,
}

impl MetricsWindow {
    /// An empty window; the API applies its own default.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Window covering the given relative duration.
    #[must_use]
    pub fn duration(duration: impl Into<String>) -> Self {
        Self {
            duration: Some(duration.into()),
            ..Self::default()
        }
    }

    /// Window between two timestamps.
    #[must_use]
    pub fn range(begin: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            duration: None,
            begin_timestamp: Some(begin.into()),
            end_timestamp: Some(end.into()),
        }
    }

    /// Set the start of the range.
    #[must_use]
    pub fn with_begin_timestamp(mut self, begin: impl Into<String>) -> Self {
        self.begin_timestamp = Some(begin.into());
        self
    }

    /// Set the end of the range.
    #[must_use]
    pub fn with_end_timestamp(mut self, end: impl Into<String>) -> Self {
        self.end_timestamp = Some(end.into());
        self
    }

    /// Validate exclusivity, timestamp format and ordering.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if `duration` is combined with a
    /// timestamp, a timestamp is malformed, or the range is not increasing.
    pub fn validate(&self) -> Result<()> {
        if let Some(duration) = &self.duration {
            if self.begin_timestamp.is_some() || self.end_timestamp.is_some() {
                return Err(Error::Validation(
                    "duration cannot be used with beginTimestamp or endTimestamp".to_string(),
                ));
            }
            if duration.trim().is_empty() {
                return Err(Error::Validation("duration cannot be empty".to_string()));
            }
        }

        validate_range(
            self.begin_timestamp.as_deref(),
            self.end_timestamp.as_deref(),
        )
    }

    /// Convert into query pairs.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut params = QueryParams::new();
        params.push_opt("duration", self.duration.as_deref());
        params.push_opt("beginTimestamp", self.begin_timestamp.as_deref());
        params.push_opt("endTimestamp", self.end_timestamp.as_deref());
        params.into_pairs()
    }
}

/// Body of the ISP metrics query endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IspMetricsQuery {
    /// Time window.
    #[serde(flatten)]
    pub window: MetricsWindow,
    /// Restrict to these sites.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub site_ids: Vec<String>,
    /// Restrict to these hosts.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub host_ids: Vec<String>,
}

impl IspMetricsQuery {
    /// Query with no window and no filters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the time window.
    #[must_use]
    pub fn with_window(mut self, window: MetricsWindow) -> Self {
        self.window = window;
        self
    }

    /// Filter by site identifiers.
    #[must_use]
    pub fn with_site_ids<I, S>(mut self, site_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.site_ids = site_ids.into_iter().map(Into::into).collect();
        self
    }

    /// Filter by host identifiers.
    #[must_use]
    pub fn with_host_ids<I, S>(mut self, host_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.host_ids = host_ids.into_iter().map(Into::into).collect();
        self
    }

    /// Validate the window and the identifier filters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] on the first invalid field.
    pub fn validate(&self) -> Result<()> {
        self.window.validate()?;
        if self
            .site_ids
            .iter()
            .chain(&self.host_ids)
            .any(|id| id.trim().is_empty())
        {
            return Err(Error::Validation(
                "site_ids and host_ids cannot contain empty values".to_string(),
            ));
        }
        Ok(())
    }
}
