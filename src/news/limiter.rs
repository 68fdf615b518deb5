//! Minimum-interval rate limiter
//!
//! The news provider caps call frequency, so every fetch acquires this gate
//! first. One limiter instance is shared (via `Arc`) across everything that
//! talks to the provider; if ingestion is ever parallelized the limiter is
//! already the single global token the calls serialize on.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Enforces a minimum delay between successive calls.
pub struct RateLimiter {
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: Mutex::new(None),
        }
    }

    /// Wait until at least `min_interval` has passed since the previous
    /// acquire, then claim the slot. The first acquire never waits.
    pub async fn acquire(&self) {
        let mut last = self.last_call.lock().await;
        if let Some(prev) = *last {
            let ready_at = prev + self.min_interval;
            tokio::time::sleep_until(ready_at).await;
        }
        *last = Some(Instant::now());
    }
}
