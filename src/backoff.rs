use std::time::Duration;

use crate::config::AdvertiseConfig;
use crate::jitter;

/// Exponent clamp so `retry_interval << failures` cannot overflow u64 millis.
/// The ceiling from `max_retry_interval` kicks in long before this on any
/// realistic configuration.
const MAX_BACKOFF_SHIFT: u32 = 20;

/// Pure timing policy for a heartbeat loop: how long to wait after the k-th
/// consecutive failure, and how long to wait after a success.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    retry_interval: Duration,
    max_retry_interval: Duration,
    advertise_interval: Duration,
    fuzz_interval: Duration,
}

impl BackoffPolicy {
    pub fn new(
        retry_interval: Duration,
        max_retry_interval: Duration,
        advertise_interval: Duration,
        fuzz_interval: Duration,
    ) -> Self {
        Self {
            retry_interval,
            max_retry_interval,
            advertise_interval,
            fuzz_interval,
        }
    }

    pub fn from_config(config: &AdvertiseConfig) -> Self {
        Self::new(
            config.retry_interval(),
            config.max_retry_interval(),
            config.advertise_interval(),
            config.fuzz_interval(),
        )
    }

    /// Upper bound of the retry window after `consecutive_failures` failures:
    /// `retry_interval * 2^failures`, clamped to `max_retry_interval`.
    pub fn retry_window(&self, consecutive_failures: u32) -> Duration {
        let shift = consecutive_failures.min(MAX_BACKOFF_SHIFT);
        let upper_ms = (self.retry_interval.as_millis() as u64).saturating_mul(1u64 << shift);
        Duration::from_millis(upper_ms).min(self.max_retry_interval)
    }

    /// Delay before the next retry, drawn uniformly from the current retry
    /// window. Even the first retry (`consecutive_failures == 0`) is drawn
    /// from `[0, retry_interval)`, never scheduled immediately.
    pub fn next_retry_delay(&self, consecutive_failures: u32) -> Duration {
        jitter::uniform_before(self.retry_window(consecutive_failures))
    }

    /// Delay before the next advertisement after a success:
    /// `advertise_interval + [0, fuzz_interval)`.
    pub fn next_advertise_delay(&self) -> Duration {
        self.advertise_interval + jitter::uniform_before(self.fuzz_interval)
    }
}
