use std::time::{Duration, Instant};

/// Tracks the politeness delay for a single worker
///
/// Each worker owns one throttle, so the bound applies to the request rate of
/// that worker independent of how many workers are running.
#[derive(Debug, Clone)]
pub struct Throttle {
    /// Minimum time between two requests issued by this worker
    pub min_delay: Duration,

    /// Number of requests issued through this throttle
    pub request_count: u32,

    /// Timestamp of the last request
    pub last_request_time: Option<Instant>,
}

impl Throttle {
    /// Creates a throttle that enforces `min_delay` between requests
    pub fn new(min_delay: Duration) -> Self {
        Self {
            min_delay,
            request_count: 0,
            last_request_time: None,
        }
    }

    /// Checks if a request can be issued at `now`
    pub fn can_request(&self, now: Instant) -> bool {
        self.time_until_next_request(now).is_none()
    }

    /// Calculates the time until the next request can be made
    ///
    /// Returns None if a request can be made now, or the duration to wait otherwise.
    pub fn time_until_next_request(&self, now: Instant) -> Option<Duration> {
        let last = self.last_request_time?;
        let elapsed = now.saturating_duration_since(last);
        if elapsed < self.min_delay {
            Some(self.min_delay - elapsed)
        } else {
            None
        }
    }

    /// Records that a request was made at `now`
    pub fn record_request(&mut self, now: Instant) {
        self.request_count = self.request_count.saturating_add(1);
        self.last_request_time = Some(now);
    }

    /// Waits until the delay has elapsed, then records the request
    pub async fn acquire(&mut self) {
        if let Some(wait) = self.time_until_next_request(Instant::now()) {
            tracing::trace!("Throttling worker for {:?}", wait);
            tokio::time::sleep(wait).await;
        }
        self.record_request(Instant::now());
    }
}
