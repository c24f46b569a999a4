//! Minimum spacing between outbound Reddit requests

use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::trace;

/// Enforces a minimum delay between consecutive requests.
///
/// Owned by the client that issues the requests; nothing here is global.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: Mutex::new(None),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait until a request may be sent, then record it as sent
    pub async fn acquire(&self) {
        let wait = self
            .last_request
            .lock()
            .map(|last| self.min_interval.saturating_sub(last.elapsed()))
            .unwrap_or(Duration::ZERO);

        if !wait.is_zero() {
            trace!(wait_ms = wait.as_millis() as u64, "Rate limiter delaying request");
            tokio::time::sleep(wait).await;
        }

        *self.last_request.lock() = Some(Instant::now());
    }
}
