use std::time::Duration;

use reqwest::StatusCode;

/// Configures how many extra attempts a logical call may make and how long
/// the waits between them grow.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of retries after the initial attempt.
    ///
    /// A logical call performs at most `max_attempts + 1` physical attempts.
    pub max_attempts: u32,
    /// Base of the exponential backoff, in whole seconds.
    ///
    /// The wait before retry `k` (0-based) is `delay_multiplier_secs ^ k`
    /// seconds.
    pub delay_multiplier_secs: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay_multiplier_secs: 5,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 0,
            delay_multiplier_secs: 0,
        }
    }
}

/// Returns whether a status code is treated as transient and worth retrying.
///
/// The retryable set is deliberately narrow: 503 Service Unavailable,
/// 408 Request Timeout, and 504 Gateway Timeout. Every other status, success
/// or not, is a definitive answer from the server and is returned as-is —
/// retrying a non-transient error wastes the attempt budget and can violate
/// idempotency assumptions for non-idempotent methods. Downstream services
/// depend on this set and on the backoff shape for rate-limit compliance, so
/// both are part of the crate's stable contract.
pub fn is_retryable_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::SERVICE_UNAVAILABLE | StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT
    )
}

/// Backoff before retry number `attempt` (0-based): `multiplier ^ attempt`
/// seconds, saturating instead of overflowing for absurd policies.
pub(crate) fn backoff_delay(multiplier_secs: u64, attempt: u32) -> Duration {
    Duration::from_secs(multiplier_secs.saturating_pow(attempt))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_matches_documented_contract() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.delay_multiplier_secs, 5);
    }

    #[test]
    fn backoff_is_exponential_in_the_attempt_index() {
        assert_eq!(backoff_delay(5, 0), Duration::from_secs(1));
        assert_eq!(backoff_delay(5, 1), Duration::from_secs(5));
        assert_eq!(backoff_delay(5, 2), Duration::from_secs(25));
        assert_eq!(backoff_delay(2, 3), Duration::from_secs(8));
    }

    #[test]
    fn backoff_saturates_instead_of_overflowing() {
        assert_eq!(backoff_delay(u64::MAX, 4), Duration::from_secs(u64::MAX));
    }

    #[test]
    fn only_503_408_504_are_retryable() {
        assert!(is_retryable_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(is_retryable_status(StatusCode::REQUEST_TIMEOUT));
        assert!(is_retryable_status(StatusCode::GATEWAY_TIMEOUT));

        assert!(!is_retryable_status(StatusCode::OK));
        assert!(!is_retryable_status(StatusCode::NOT_FOUND));
        assert!(!is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(!is_retryable_status(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(!is_retryable_status(StatusCode::BAD_GATEWAY));
    }
}
