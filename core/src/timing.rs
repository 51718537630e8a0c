//! Request latency for `--show-timing`.

use std::time::{Duration, Instant};

/// Measures the time from submission to the first response.
#[derive(Debug, Clone)]
pub struct RequestTimer {
    started: Instant,
    first_response: Option<Duration>,
}

impl RequestTimer {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
            first_response: None,
        }
    }

    /// Record the first response. Later calls keep the first measurement.
    pub fn mark_first_response(&mut self) -> Duration {
        *self
            .first_response
            .get_or_insert_with(|| self.started.elapsed())
    }

    pub fn first_response(&self) -> Option<Duration> {
        self.first_response
    }
}

/// The diagnostic line printed for `--show-timing`.
pub fn format_elapsed(elapsed: Duration) -> String {
    format!("Request took {} ms\n", elapsed.as_millis())
}
