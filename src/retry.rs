//! Failure classification and retry budgets.
//!
//! Two granularities: per-item dispositions decide what happens to a single
//! message's download attempt, and [`RetryPolicy`] bounds how often a whole
//! pass may be re-run. Rate limits are always pass-level — a 429 applies to
//! the session, not the one message that happened to trip it.

use std::time::Duration;

use rand::Rng as _;

use crate::feed::FeedError;

/// Reaction to a failed download attempt for one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemDisposition {
    /// Re-resolve the message by id and retry the download exactly once.
    RefreshAndRetry,
    /// Hand the failure to the run supervisor; the whole pass restarts.
    Escalate,
    /// Give up on this message for the current pass. It is recorded
    /// nowhere, so the next pass reconsiders it.
    Abandon,
}

impl ItemDisposition {
    pub fn classify(error: &FeedError) -> Self {
        match error {
            FeedError::ReferenceExpired { .. } => Self::RefreshAndRetry,
            FeedError::RateLimited { .. } => Self::Escalate,
            _ => Self::Abandon,
        }
    }
}

/// Failure escaping a single pass, consumed by the run supervisor.
#[derive(Debug)]
pub enum PassError {
    /// The gateway mandated a wait; the pass restarts afterwards without
    /// consuming the attempt budget.
    RateLimited { wait: Duration },
    /// Anything else; consumes one pass attempt.
    Failed(anyhow::Error),
}

impl From<FeedError> for PassError {
    fn from(error: FeedError) -> Self {
        match error {
            FeedError::RateLimited { retry_after } => Self::RateLimited { wait: retry_after },
            other => Self::Failed(other.into()),
        }
    }
}

/// Whole-pass retry budget and pacing.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total pass attempts before the run is abandoned.
    pub max_pass_attempts: u32,
    /// Base delay between failed pass attempts, in seconds.
    pub attempt_delay_secs: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_pass_attempts: 3,
            attempt_delay_secs: 5,
        }
    }
}

impl RetryPolicy {
    /// Delay before re-running a failed pass: the base plus up to one extra
    /// base of jitter.
    pub fn attempt_delay(&self) -> Duration {
        let jitter = if self.attempt_delay_secs > 0 {
            rand::thread_rng().gen_range(0..self.attempt_delay_secs)
        } else {
            0
        };
        Duration::from_secs(self.attempt_delay_secs + jitter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expired_reference_earns_refresh() {
        let e = FeedError::ReferenceExpired { id: 1 };
        assert_eq!(
            ItemDisposition::classify(&e),
            ItemDisposition::RefreshAndRetry
        );
    }

    #[test]
    fn test_rate_limit_escalates() {
        let e = FeedError::rate_limited(10);
        assert_eq!(ItemDisposition::classify(&e), ItemDisposition::Escalate);
    }

    #[test]
    fn test_status_error_abandons() {
        let e = FeedError::Status {
            status: 500,
            url: "u".into(),
        };
        assert_eq!(ItemDisposition::classify(&e), ItemDisposition::Abandon);
    }

    #[test]
    fn test_disk_error_abandons() {
        let e = FeedError::Disk(std::io::Error::other("disk full"));
        assert_eq!(ItemDisposition::classify(&e), ItemDisposition::Abandon);
    }

    #[test]
    fn test_decode_error_abandons() {
        let bad = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let e = FeedError::Decode(bad);
        assert_eq!(ItemDisposition::classify(&e), ItemDisposition::Abandon);
    }

    #[test]
    fn test_pass_error_from_rate_limit_keeps_wait() {
        match PassError::from(FeedError::rate_limited(45)) {
            PassError::RateLimited { wait } => assert_eq!(wait, Duration::from_secs(45)),
            other => panic!("expected RateLimited, got {:?}", other),
        }
    }

    #[test]
    fn test_pass_error_from_other_is_failed() {
        let e = FeedError::Status {
            status: 502,
            url: "u".into(),
        };
        assert!(matches!(PassError::from(e), PassError::Failed(_)));
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_pass_attempts, 3);
        assert_eq!(policy.attempt_delay_secs, 5);
    }

    #[test]
    fn test_attempt_delay_within_jitter_bounds() {
        let policy = RetryPolicy {
            max_pass_attempts: 3,
            attempt_delay_secs: 4,
        };
        for _ in 0..50 {
            let d = policy.attempt_delay().as_secs();
            assert!((4..8).contains(&d), "delay {} outside 4..8", d);
        }
    }

    #[test]
    fn test_attempt_delay_zero_base() {
        let policy = RetryPolicy {
            max_pass_attempts: 3,
            attempt_delay_secs: 0,
        };
        assert_eq!(policy.attempt_delay(), Duration::ZERO);
    }
}
