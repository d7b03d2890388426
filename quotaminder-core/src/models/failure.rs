//! Poll failure representation and classification.
//!
//! Every failed poll is reported as a [`Failure`]: a message plus the
//! structured signals the transport layer could extract. Classification
//! into a [`FailureKind`] decides which retry budget, if any, applies.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Failure Kind
// ============================================================================

/// Classification of a poll failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    /// Credentials invalid; terminal, user action required.
    TokenExpired,
    /// Server-signaled backpressure; retried on its own budget.
    RateLimited,
    /// Transient connectivity problem; retried on the network budget.
    NetworkError,
    /// Anything else; surfaced verbatim, never retried.
    Unknown,
}

impl FailureKind {
    /// Returns a short human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::TokenExpired => "token expired",
            Self::RateLimited => "rate limited",
            Self::NetworkError => "network error",
            Self::Unknown => "unknown error",
        }
    }

    /// Returns true for classes that have a retry budget.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited | Self::NetworkError)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ============================================================================
// Failure
// ============================================================================

/// Message substrings that mark a failure as connectivity-related.
const NETWORK_PATTERNS: &[&str] = &[
    "network",
    "offline",
    "connection",
    "timeout",
    "econnrefused",
    "enotfound",
    "enetunreach",
    "etimedout",
    "fetch failed",
    "failed to fetch",
];

/// Message substrings that mark a failure as server backpressure.
const RATE_LIMIT_PATTERNS: &[&str] = &["rate limit", "too many requests"];

/// A failed poll as reported by a usage source.
///
/// Sources set the structured flags when the transport gives them a
/// definite signal (an HTTP 401, a refused connect); message and status
/// cover everything else. [`Failure::classify`] folds all of it into a
/// [`FailureKind`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Failure {
    /// Human-readable description of what went wrong.
    pub message: String,
    /// HTTP status code, when a response was received. 0 means the
    /// request never reached a server.
    pub status: Option<u16>,
    /// Structured signal: credentials are no longer valid.
    #[serde(default)]
    pub token_expired: bool,
    /// Structured signal: the server asked us to back off.
    #[serde(default)]
    pub rate_limited: bool,
    /// Structured signal: the host has no connectivity.
    #[serde(default)]
    pub offline: bool,
}

impl Failure {
    /// Creates a failure carrying only a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
            token_expired: false,
            rate_limited: false,
            offline: false,
        }
    }

    /// Creates a failure flagged as expired credentials.
    pub fn token_expired(message: impl Into<String>) -> Self {
        Self {
            token_expired: true,
            ..Self::new(message)
        }
    }

    /// Creates a failure flagged as server backpressure.
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            rate_limited: true,
            ..Self::new(message)
        }
    }

    /// Creates a failure flagged as a connectivity problem.
    pub fn offline(message: impl Into<String>) -> Self {
        Self {
            offline: true,
            ..Self::new(message)
        }
    }

    /// Attaches an HTTP status code.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Classifies this failure.
    ///
    /// Precedence, first match wins:
    /// 1. the `token_expired` flag;
    /// 2. the `rate_limited` flag, status 429, or a backpressure
    ///    message;
    /// 3. the `offline` flag, a connectivity message, or status 0 /
    ///    5xx;
    /// 4. otherwise [`FailureKind::Unknown`].
    pub fn classify(&self) -> FailureKind {
        if self.token_expired {
            return FailureKind::TokenExpired;
        }

        let message = self.message.to_lowercase();

        if self.rate_limited
            || self.status == Some(429)
            || RATE_LIMIT_PATTERNS.iter().any(|p| message.contains(p))
        {
            return FailureKind::RateLimited;
        }

        if self.offline
            || NETWORK_PATTERNS.iter().any(|p| message.contains(p))
            || self.status.is_some_and(|s| s == 0 || s >= 500)
        {
            return FailureKind::NetworkError;
        }

        FailureKind::Unknown
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) if status > 0 => write!(f, "{} (HTTP {status})", self.message),
            _ => write!(f, "{}", self.message),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
