//! Exponential backoff with jitter.

use rand::Rng;
use std::time::Duration;

use crate::config::RetryConfig;

/// Delay before retry number `retry` (1-based). Retry 0 is the initial attempt.
pub fn calculate_backoff(retry: u32, base_ms: u64, max_ms: u64) -> Duration {
    if retry == 0 {
        return Duration::ZERO;
    }

    let exponential_base = 2u64.saturating_pow(retry - 1);
    let capped_delay = base_ms.saturating_mul(exponential_base).min(max_ms);

    // Up to 10% jitter so synchronized callers spread out.
    let jitter_range = capped_delay / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped_delay + jitter)
}

/// Backoff schedule for one backend's retry policy.
pub fn backoff_for(config: &RetryConfig, retry: u32) -> Duration {
    calculate_backoff(retry, config.base_delay_ms, config.max_delay_ms)
}
