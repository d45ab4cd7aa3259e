//! Retry backoff for failed sync attempts.
//!
//! A failed sync is not retried immediately: the scheduling layer waits an
//! exponentially growing delay, with random jitter so that many clients
//! failing at once (e.g. after a backend outage) do not retry in lockstep.

use std::time::Duration;

/// Exponential backoff policy for sync retries.
///
/// Formula: `min(max_delay, initial_delay * 2^(attempt-1)) + random(0..=jitter)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay after the first failed attempt.
    pub initial_delay: Duration,
    /// Upper bound of the exponential part.
    pub max_delay: Duration,
    /// Total attempts per sync request (first run included).
    pub max_attempts: u32,
    /// Upper bound of the random jitter added to every delay.
    pub jitter: Duration,
}

impl RetryPolicy {
    /// Policy that never retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Whether another attempt may follow `attempt` (1-based).
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Delay to wait after the given failed attempt (1-based), without jitter.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        let factor = 1u32 << exponent;
        self.initial_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Delay to wait after the given failed attempt (1-based), with jitter.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay(attempt)
            .saturating_add(random_jitter(self.jitter))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(30),
            max_delay: Duration::from_secs(5 * 60 * 60),
            max_attempts: 5,
            jitter: Duration::from_secs(5),
        }
    }
}

/// Generate random jitter between zero and `max` inclusive, millisecond grained.
fn random_jitter(max: Duration) -> Duration {
    let max_ms = max.as_millis().min(u64::MAX as u128) as u64;
    if max_ms == 0 {
        return Duration::ZERO;
    }
    let mut bytes = [0u8; 8];
    if getrandom::getrandom(&mut bytes).is_err() {
        return Duration::ZERO;
    }
    let random = u64::from_le_bytes(bytes);
    Duration::from_millis(random % max_ms.saturating_add(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy_without_jitter() -> RetryPolicy {
        RetryPolicy {
            initial_delay: Duration::from_secs(10),
            max_delay: Duration::from_secs(60),
            max_attempts: 4,
            jitter: Duration::ZERO,
        }
    }

    #[test]
    fn delay_doubles_per_attempt() {
        let policy = policy_without_jitter();
        assert_eq!(policy.delay_for(1), Duration::from_secs(10));
        assert_eq!(policy.delay_for(2), Duration::from_secs(20));
        assert_eq!(policy.delay_for(3), Duration::from_secs(40));
    }

    #[test]
    fn delay_is_capped() {
        let policy = policy_without_jitter();
        assert_eq!(policy.delay_for(4), Duration::from_secs(60));
        assert_eq!(policy.delay_for(40), Duration::from_secs(60));
    }

    #[test]
    fn jitter_stays_within_bound() {
        let policy = RetryPolicy {
            jitter: Duration::from_millis(500),
            ..policy_without_jitter()
        };
        for _ in 0..50 {
            let delay = policy.delay_for(1);
            assert!(delay >= Duration::from_secs(10));
            assert!(delay <= Duration::from_millis(10_500));
        }
    }

    #[test]
    fn huge_delays_saturate() {
        let policy = RetryPolicy {
            initial_delay: Duration::from_secs(u64::MAX),
            max_delay: Duration::from_secs(u64::MAX),
            max_attempts: 3,
            jitter: Duration::from_secs(5),
        };
        assert!(policy.delay_for(1) >= Duration::from_secs(u64::MAX));
        assert!(policy.delay_for(3) >= Duration::from_secs(u64::MAX));

        let policy = RetryPolicy {
            jitter: Duration::MAX,
            ..policy_without_jitter()
        };
        assert!(policy.delay_for(1) >= Duration::from_secs(10));
    }

    #[test]
    fn should_retry_respects_max_attempts() {
        let policy = policy_without_jitter();
        assert!(policy.should_retry(1));
        assert!(policy.should_retry(3));
        assert!(!policy.should_retry(4));
        assert!(!RetryPolicy::no_retry().should_retry(1));
    }

    #[test]
    fn default_matches_scheduler_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.initial_delay, Duration::from_secs(30));
        assert_eq!(policy.max_delay, Duration::from_secs(18_000));
        assert_eq!(policy.max_attempts, 5);
    }
}
