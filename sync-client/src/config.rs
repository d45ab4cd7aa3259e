//! Sync scheduling configuration.

use serde::Deserialize;
use std::time::Duration;
use sync_core::RetryPolicy;

/// Retry and periodic trigger settings.
///
/// Deserializes from the `[sync]` table of the CLI configuration; every field
/// has a default.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SyncConfig {
    /// Delay before the first retry in seconds (default: 30).
    #[serde(default = "default_initial_backoff_secs")]
    pub initial_backoff_secs: u64,
    /// Upper bound of the retry delay in seconds (default: 5 hours).
    #[serde(default = "default_max_backoff_secs")]
    pub max_backoff_secs: u64,
    /// Attempts per sync request, first run included (default: 5).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Upper bound of the random jitter in milliseconds (default: 5000).
    #[serde(default = "default_jitter_ms")]
    pub jitter_ms: u64,
    /// Periodic sync interval in seconds, 0 disables it (default: 1 hour).
    #[serde(default = "default_periodic_interval_secs")]
    pub periodic_interval_secs: u64,
}

fn default_initial_backoff_secs() -> u64 {
    30
}

fn default_max_backoff_secs() -> u64 {
    5 * 60 * 60
}

fn default_max_attempts() -> u32 {
    5
}

fn default_jitter_ms() -> u64 {
    5_000
}

fn default_periodic_interval_secs() -> u64 {
    60 * 60
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            initial_backoff_secs: default_initial_backoff_secs(),
            max_backoff_secs: default_max_backoff_secs(),
            max_attempts: default_max_attempts(),
            jitter_ms: default_jitter_ms(),
            periodic_interval_secs: default_periodic_interval_secs(),
        }
    }
}

impl SyncConfig {
    /// Retry policy for the sync manager.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            initial_delay: Duration::from_secs(self.initial_backoff_secs),
            max_delay: Duration::from_secs(self.max_backoff_secs),
            max_attempts: self.max_attempts.max(1),
            jitter: Duration::from_millis(self.jitter_ms),
        }
    }

    /// Periodic sync interval, if enabled.
    pub fn periodic_interval(&self) -> Option<Duration> {
        (self.periodic_interval_secs > 0).then(|| Duration::from_secs(self.periodic_interval_secs))
    }
}
