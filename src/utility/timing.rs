// ============================================
// TIMING UTILITY - Cycle duration logging
// ============================================
// Usage:
//   let timer = Timer::start_with_threshold("cycle", 10_000);
//   ...
//   let elapsed = timer.stop();
// ============================================

use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Timer for measuring execution time
pub struct Timer {
    name: String,
    start: Instant,
    threshold_ms: u128,
}

impl Timer {
    /// Create a timer that warns if execution exceeds threshold (in milliseconds)
    pub fn start_with_threshold(name: impl Into<String>, threshold_ms: u128) -> Self {
        Self {
            name: name.into(),
            start: Instant::now(),
            threshold_ms,
        }
    }

    /// Stop the timer and log the result
    pub fn stop(self) -> Duration {
        let duration = self.start.elapsed();
        let ms = duration.as_millis();

        if self.is_slow(ms) {
            warn!(timer = %self.name, elapsed_ms = ms, "{} took {:.2}s", self.name, duration.as_secs_f64());
        } else {
            debug!(timer = %self.name, elapsed_ms = ms, "{} took {}ms", self.name, ms);
        }

        duration
    }

    fn is_slow(&self, ms: u128) -> bool {
        ms >= self.threshold_ms
    }
}
