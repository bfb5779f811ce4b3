//! Pacing floor for outbound requests
//!
//! A pacing floor is a minimum gap between the *end* of one request and the
//! *start* of the next one to the same target. Request latency is therefore
//! added on top of the floor rather than counted against it. The first request
//! is never delayed.

use std::time::{Duration, Instant};

/// Enforces a minimum delay between consecutive requests to one target
#[derive(Debug, Clone)]
pub struct PacingFloor {
    /// Minimum gap between requests
    floor: Duration,

    /// When the previous request finished
    last_finished: Option<Instant>,
}

impl PacingFloor {
    pub fn new(floor: Duration) -> Self {
        Self {
            floor,
            last_finished: None,
        }
    }

    pub fn floor(&self) -> Duration {
        self.floor
    }

    /// Calculates the time until the next request may start
    ///
    /// Returns None if a request can be made now, or the duration to wait otherwise.
    pub fn time_until_ready(&self, now: Instant) -> Option<Duration> {
        let last = self.last_finished?;
        let elapsed = now.saturating_duration_since(last);
        if elapsed < self.floor {
            Some(self.floor - elapsed)
        } else {
            None
        }
    }

    /// Sleeps until the floor since the previous request has passed
    pub async fn wait(&self) {
        if let Some(delay) = self.time_until_ready(Instant::now()) {
            tracing::trace!("Pacing: waiting {:?}", delay);
            tokio::time::sleep(delay).await;
        }
    }

    /// Records that a request just finished (successfully or not)
    pub fn mark_finished(&mut self) {
        self.last_finished = Some(Instant::now());
    }
}
