//! HTTP client for OAuth-based usage fetching.
//!
//! This module provides the production [`UsageSource`]: a thin client
//! for the usage API with a short-lived response cache.
//!
//! # API Endpoint
//!
//! ```text
//! GET https://api.anthropic.com/api/oauth/usage
//! Authorization: Bearer <access_token>
//! ```
//!
//! # Response Format
//!
//! ```json
//! {
//!   "fiveHour": {
//!     "utilization": 25.0,
//!     "resetsAt": "2025-01-01T12:00:00Z",
//!     "tokensUsed": 125000,
//!     "tokensLimit": 500000
//!   }
//! }
//! ```
//!
//! Only the 5-hour window is consumed; other payload fields are ignored.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument, warn};
use url::Url;

use quotaminder_core::{Failure, UsageSnapshot, UsageSource};

use crate::map;

// ============================================================================
// Constants
// ============================================================================

/// Base URL for the usage API.
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Usage endpoint.
pub const USAGE_ENDPOINT: &str = "/api/oauth/usage";

/// Default request timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// How long a fetched snapshot is served from cache.
const DEFAULT_CACHE_TTL_SECS: u64 = 60;

/// Window duration reported alongside each snapshot (5 hours).
const FIVE_HOUR_WINDOW_MINUTES: u32 = 300;

/// User agent string for Quotaminder.
const USER_AGENT: &str = concat!("quotaminder/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// API Response Structures
// ============================================================================

/// Response from the usage API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageApiResponse {
    /// 5-hour usage window.
    pub five_hour: Option<ApiWindow>,
}

/// Individual usage window from the API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiWindow {
    /// Utilization percentage (0-100).
    pub utilization: f64,
    /// When this window resets (RFC 3339).
    pub resets_at: Option<String>,
    /// Tokens consumed in the window, when the API reports them.
    pub tokens_used: Option<u64>,
    /// Token ceiling for the window, when the API reports it.
    pub tokens_limit: Option<u64>,
}

impl ApiWindow {
    /// Parses the reset timestamp. Unparseable values become `None`.
    pub fn parsed_resets_at(&self) -> Option<DateTime<Utc>> {
        self.resets_at.as_ref().and_then(|s| {
            DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        })
    }
}

// ============================================================================
// Conversion to Core Types
// ============================================================================

impl UsageApiResponse {
    /// Converts the API payload into a core snapshot.
    ///
    /// # Errors
    ///
    /// Returns a [`Failure`] when the 5-hour window is missing or the
    /// reported utilization is not a finite number.
    pub fn to_snapshot(&self) -> Result<UsageSnapshot, Failure> {
        let Some(ref window) = self.five_hour else {
            return Err(Failure::new("Usage response missing the five-hour window"));
        };

        let mut snapshot = UsageSnapshot::new(window.utilization);
        snapshot.resets_at = window.parsed_resets_at();
        snapshot.window_minutes = Some(FIVE_HOUR_WINDOW_MINUTES);
        snapshot.tokens_used = window.tokens_used;
        snapshot.tokens_limit = window.tokens_limit;

        snapshot.validate().map_err(|e| Failure::new(e.to_string()))?;

        Ok(snapshot)
    }
}

// ============================================================================
// HTTP Usage Source
// ============================================================================

/// A snapshot held back for the cache TTL.
#[derive(Debug)]
struct CachedSnapshot {
    snapshot: UsageSnapshot,
    fetched: Instant,
}

/// [`UsageSource`] backed by the OAuth usage API.
///
/// Successful responses are cached for a short TTL so that UI-driven
/// state reads do not hammer the API; manual refresh bypasses the cache
/// through [`UsageSource::fetch_usage_uncached`].
#[derive(Debug)]
pub struct HttpUsageSource {
    client: Client,
    base_url: String,
    token: String,
    cache_ttl: Duration,
    cache: Mutex<Option<CachedSnapshot>>,
}

impl HttpUsageSource {
    /// Creates a source that authenticates with the given OAuth token.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built. This should only occur
    /// if the system's TLS/SSL configuration is fundamentally broken,
    /// making network operations impossible. This is considered
    /// unrecoverable at runtime.
    pub fn new(token: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|e| {
                panic!(
                    "Failed to create HTTP client: {e}. \
                    This usually indicates a broken TLS/SSL configuration."
                )
            });

        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            token: token.into(),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            cache: Mutex::new(None),
        }
    }

    /// Points the source at a custom base URL (proxies, test servers).
    ///
    /// Anything that is not an absolute http(s) URL with a host is
    /// rejected and the current base stays in effect.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let mut url = base_url.into();
        while url.ends_with('/') {
            url.pop();
        }
        match Url::parse(&url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") && parsed.host_str().is_some() => {
                self.base_url = url;
            }
            Ok(parsed) => {
                warn!(url, scheme = parsed.scheme(), "Ignoring non-http base URL");
            }
            Err(error) => {
                warn!(url, %error, "Ignoring unparseable base URL");
            }
        }
        self
    }

    /// Overrides the cache TTL. Zero disables caching.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    fn usage_url(&self) -> String {
        format!("{}{}", self.base_url, USAGE_ENDPOINT)
    }

    /// Returns the cached snapshot when one exists and is still fresh.
    /// A poisoned lock is treated as a cache miss.
    fn cached_snapshot(&self) -> Option<UsageSnapshot> {
        let cache = self.cache.lock().ok()?;
        let cached = cache.as_ref()?;
        if cached.fetched.elapsed() < self.cache_ttl {
            Some(cached.snapshot.clone())
        } else {
            None
        }
    }

    fn store_cache(&self, snapshot: &UsageSnapshot) {
        if let Ok(mut cache) = self.cache.lock() {
            *cache = Some(CachedSnapshot {
                snapshot: snapshot.clone(),
                fetched: Instant::now(),
            });
        }
    }

    /// Performs one authenticated fetch against the usage endpoint.
    #[instrument(skip(self))]
    async fn fetch_fresh(&self) -> Result<UsageSnapshot, Failure> {
        let url = self.usage_url();

        debug!(url = %url, "Fetching usage from API");

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| map::failure_from_transport(&e))?;

        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Failure::token_expired("OAuth token rejected").with_status(401));
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(Failure::rate_limited("Usage API rate limit exceeded").with_status(429));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "API request failed");
            return Err(map::failure_from_status(status.as_u16(), &body));
        }

        let body = response
            .text()
            .await
            .map_err(|e| map::failure_from_transport(&e))?;

        debug!(len = body.len(), "Received API response");

        let parsed: UsageApiResponse = serde_json::from_str(&body)
            .map_err(|e| Failure::new(format!("Failed to parse usage response: {e}")))?;

        parsed.to_snapshot()
    }
}

#[async_trait]
impl UsageSource for HttpUsageSource {
    fn id(&self) -> &str {
        "http"
    }

    async fn fetch_usage(&self) -> Result<UsageSnapshot, Failure> {
        if let Some(snapshot) = self.cached_snapshot() {
            debug!("Serving cached usage snapshot");
            return Ok(snapshot);
        }

        let snapshot = self.fetch_fresh().await?;
        self.store_cache(&snapshot);
        Ok(snapshot)
    }

    async fn fetch_usage_uncached(&self) -> Result<UsageSnapshot, Failure> {
        let snapshot = self.fetch_fresh().await?;
        self.store_cache(&snapshot);
        Ok(snapshot)
    }
}

// ============================================================================
// Tests
// ============================================================================
