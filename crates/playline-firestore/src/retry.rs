//! Retry policy with exponential backoff and jitter.

use std::time::Duration;

/// Retry policy configuration.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts.
    pub max_retries: u32,
    /// Base delay for exponential backoff (in milliseconds).
    pub base_delay_ms: u64,
    /// Maximum delay cap (in milliseconds).
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 100,
            max_delay_ms: 5000,
        }
    }
}

impl RetryConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let base_delay_ms: u64 = std::env::var("FIRESTORE_RETRY_BASE_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(100);

        let max_delay_ms: u64 = std::env::var("FIRESTORE_RETRY_MAX_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5000);

        Self {
            max_retries: 3,
            base_delay_ms,
            max_delay_ms,
        }
    }

    /// Delay before the next attempt after `attempt` failures.
    ///
    /// Honors an explicit server-provided delay (Retry-After) when present;
    /// otherwise exponential backoff with full jitter, capped at
    /// `max_delay_ms` and never below `base_delay_ms`.
    pub fn delay_for(&self, attempt: u32, retry_after_ms: Option<u64>) -> Duration {
        if let Some(after) = retry_after_ms {
            return Duration::from_millis(after);
        }

        let exp_delay = self.base_delay_ms.saturating_mul(2u64.pow(attempt.min(16)));
        let capped_delay = exp_delay.min(self.max_delay_ms);

        // Full jitter from the subsecond clock; avoids pulling in a RNG for
        // a spot where statistical quality is irrelevant.
        let jittered = if capped_delay > 0 {
            use std::time::SystemTime;
            let nanos = SystemTime::now()
                .duration_since(SystemTime::UNIX_EPOCH)
                .map(|d| d.subsec_nanos())
                .unwrap_or(0);
            let random_factor = (nanos % 1000) as f64 / 1000.0;
            ((capped_delay as f64) * random_factor) as u64
        } else {
            0
        };

        Duration::from_millis(jittered.max(self.base_delay_ms))
    }
}
