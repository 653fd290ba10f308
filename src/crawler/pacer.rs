//! Request pacing
//!
//! The crawl issues one request at a time; the pacer makes every request wait
//! until at least the configured interval has passed since the previous one.

use std::time::Duration;
use tokio::time::Instant;

/// Minimum spacing between consecutive remote requests
#[derive(Debug)]
pub struct RequestPacer {
    interval: Duration,
    last_request: Option<Instant>,
}

impl RequestPacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_request: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Time left before the next request may be sent
    pub fn time_until_ready(&self, now: Instant) -> Duration {
        match self.last_request {
            Some(last) => (last + self.interval).saturating_duration_since(now),
            None => Duration::ZERO,
        }
    }

    /// Waits until a request may be sent and records it as sent
    pub async fn wait(&mut self) {
        let wait = self.time_until_ready(Instant::now());
        if !wait.is_zero() {
            tracing::trace!("Pacing: sleeping {:?} before next request", wait);
            tokio::time::sleep(wait).await;
        }
        self.last_request = Some(Instant::now());
    }
}
