//! Transport fault to [`Failure`] mapping.
//!
//! Everything the HTTP layer can go wrong with is flattened into a
//! structured [`Failure`] at this boundary. Definite transport signals
//! set the matching flag; everything else carries its message and
//! status through for the classifier to inspect.

use quotaminder_core::Failure;

/// Message fragments that mark a failure as an authentication problem
/// even when the status code alone is inconclusive.
pub const AUTH_PATTERNS: [&str; 5] = [
    "unauthorized",
    "authentication",
    "token expired",
    "invalid token",
    "session expired",
];

/// Returns true if the message reads as an authentication failure.
pub fn is_auth_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    AUTH_PATTERNS.iter().any(|p| lower.contains(p))
}

/// Maps a request-level error (no response received) to a failure.
///
/// Connect and timeout errors are definite connectivity signals; other
/// transport errors pass their message through unflagged.
pub fn failure_from_transport(error: &reqwest::Error) -> Failure {
    let message = error.to_string();
    if error.is_timeout() || error.is_connect() {
        Failure::offline(message)
    } else {
        Failure::new(message)
    }
}

/// Maps a non-success response (other than 401 and 429, which the
/// caller handles with definite flags) to a failure.
pub fn failure_from_status(status: u16, body: &str) -> Failure {
    let message = if body.is_empty() {
        format!("Usage API returned status {status}")
    } else {
        format!("Usage API returned status {status}: {body}")
    };
    if is_auth_message(&message) {
        Failure::token_expired(message).with_status(status)
    } else {
        Failure::new(message).with_status(status)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use quotaminder_core::FailureKind;

    #[test]
    fn test_auth_patterns_match_case_insensitively() {
        assert!(is_auth_message("401 Unauthorized"));
        assert!(is_auth_message("Authentication required"));
        assert!(is_auth_message("your token expired yesterday"));
        assert!(is_auth_message("Invalid token supplied"));
        assert!(is_auth_message("Session expired, please log in"));
        assert!(!is_auth_message("quota exhausted"));
    }

    #[test]
    fn test_server_errors_classify_as_network() {
        let failure = failure_from_status(503, "");
        assert_eq!(failure.classify(), FailureKind::NetworkError);
        assert_eq!(failure.status, Some(503));
    }

    #[test]
    fn test_auth_flavored_body_sets_token_expired() {
        let failure = failure_from_status(400, "invalid token");
        assert_eq!(failure.classify(), FailureKind::TokenExpired);
    }

    #[test]
    fn test_plain_client_error_stays_unknown() {
        let failure = failure_from_status(404, "not found");
        assert_eq!(failure.classify(), FailureKind::Unknown);
        assert!(failure.to_string().contains("404"));
    }
}
