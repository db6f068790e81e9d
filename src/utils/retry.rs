//! Retry utilities: backoff builders for upstream calls.
//!
//! Uses `backon` for exponential backoff with jitter.

use std::time::Duration;

use backon::ExponentialBuilder;

use crate::config::RetryConfig;

/// Backoff for transient upstream failures (network errors, 5xx, rate limits).
pub fn upstream_backoff(config: &RetryConfig) -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(config.min_delay_ms))
        .with_max_delay(Duration::from_millis(config.max_delay_ms))
        .with_max_times(config.max_times)
        .with_jitter()
}
