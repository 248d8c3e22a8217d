//! Monotonic frame clock

use std::time::Instant;

use crate::consts::MAX_FRAME_DELTA;

/// Clamp a raw frame delta into `[0, max]`. NaN becomes 0.
#[inline]
pub fn clamp_delta(raw: f64, max: f64) -> f64 {
    if raw.is_nan() { 0.0 } else { raw.clamp(0.0, max) }
}

/// Samples elapsed time between calls to [`Clock::tick`]
#[derive(Debug, Clone)]
pub struct Clock {
    base: Instant,
    prev: Instant,
    /// Seconds between the last two ticks, clamped
    delta: f64,
    /// Seconds since the clock was created (unclamped)
    total: f64,
    max_delta: f64,
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock {
    pub fn new() -> Self {
        Self::with_max_delta(MAX_FRAME_DELTA)
    }

    /// Clock whose deltas never exceed `max_delta` seconds
    pub fn with_max_delta(max_delta: f64) -> Self {
        let now = Instant::now();
        Self {
            base: now,
            prev: now,
            delta: 0.0,
            total: 0.0,
            max_delta,
        }
    }

    /// Sample the time source
    pub fn tick(&mut self) {
        let now = Instant::now();
        let raw = now.saturating_duration_since(self.prev).as_secs_f64();
        self.prev = now;

        // A debugger pause or OS sleep must not turn into a multi-second step
        self.delta = clamp_delta(raw, self.max_delta);
        self.total = now.saturating_duration_since(self.base).as_secs_f64();
    }

    /// Seconds between the last two ticks, in `[0, max_delta]`
    pub fn delta_time(&self) -> f64 {
        self.delta
    }

    /// Seconds since creation as of the last tick
    pub fn total_time(&self) -> f64 {
        self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_clamp_delta_rejects_anomalies() {
        assert_eq!(clamp_delta(-0.5, 0.25), 0.0);
        assert_eq!(clamp_delta(10.0, 0.25), 0.25);
        assert_eq!(clamp_delta(f64::NAN, 0.25), 0.0);
        assert_eq!(clamp_delta(0.016, 0.25), 0.016);
    }

    #[test]
    fn test_tick_measures_elapsed_time() {
        let mut clock = Clock::new();
        assert_eq!(clock.delta_time(), 0.0);
        std::thread::sleep(Duration::from_millis(5));
        clock.tick();
        assert!(clock.delta_time() >= 0.004);
        assert!(clock.delta_time() <= MAX_FRAME_DELTA);
        assert!(clock.total_time() >= clock.delta_time());
    }

    #[test]
    fn test_long_pause_is_clamped() {
        let mut clock = Clock::with_max_delta(0.001);
        std::thread::sleep(Duration::from_millis(5));
        clock.tick();
        assert_eq!(clock.delta_time(), 0.001);
        // Total time is not clamped
        assert!(clock.total_time() >= 0.004);
    }
}
