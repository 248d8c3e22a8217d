//! Fixed-timestep accumulator
//!
//! Real time is poured into an accumulator and drained in whole simulation
//! steps. At most `max_steps` run per outer iteration; any whole steps still
//! owed after that are dropped (the simulation slows down instead of
//! spiralling), so the accumulator always ends below one step.

use std::time::Duration;

use crate::consts::{IDLE_SLEEP_MS, MAX_CATCH_UP_STEPS, MAX_FRAME_DELTA, SECONDS_PER_FRAME};
use crate::platform::clamp_delta;

/// What one outer iteration is allowed to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameBudget {
    /// Simulation steps to run now
    pub steps: u32,
    /// Whole steps discarded by the catch-up cap
    pub dropped: u32,
}

impl FrameBudget {
    /// A render is due only if the world changed
    pub fn render_due(&self) -> bool {
        self.steps > 0
    }
}

#[derive(Debug, Clone)]
pub struct FrameScheduler {
    seconds_per_step: f64,
    max_steps: u32,
    max_delta: f64,
    accumulated: f64,
    /// Steps discarded since creation
    dropped_total: u64,
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new(SECONDS_PER_FRAME, MAX_CATCH_UP_STEPS, MAX_FRAME_DELTA)
    }
}

impl FrameScheduler {
    pub fn new(seconds_per_step: f64, max_steps: u32, max_delta: f64) -> Self {
        Self {
            seconds_per_step,
            max_steps: max_steps.max(1),
            max_delta,
            accumulated: 0.0,
            dropped_total: 0,
        }
    }

    pub fn seconds_per_step(&self) -> f64 {
        self.seconds_per_step
    }

    /// Time carried over to the next iteration, always in `[0, seconds_per_step)`
    pub fn accumulated(&self) -> f64 {
        self.accumulated
    }

    pub fn dropped_total(&self) -> u64 {
        self.dropped_total
    }

    /// Feed one frame's elapsed time and get the number of steps to run
    pub fn advance(&mut self, dt: f64) -> FrameBudget {
        self.accumulated += clamp_delta(dt, self.max_delta);

        let mut budget = FrameBudget::default();
        while self.accumulated >= self.seconds_per_step && budget.steps < self.max_steps {
            self.accumulated -= self.seconds_per_step;
            budget.steps += 1;
        }

        if self.accumulated >= self.seconds_per_step {
            let owed = (self.accumulated / self.seconds_per_step).floor();
            self.accumulated -= owed * self.seconds_per_step;
            // Guard against the subtraction landing a hair above one step
            if self.accumulated >= self.seconds_per_step || self.accumulated < 0.0 {
                self.accumulated = self.accumulated.rem_euclid(self.seconds_per_step);
            }
            budget.dropped = owed as u32;
            self.dropped_total += budget.dropped as u64;
            log::debug!(
                "Frame scheduler dropped {} step(s) after {} catch-up steps",
                budget.dropped,
                budget.steps
            );
        }

        budget
    }

    /// Give the CPU back briefly when nothing was rendered, unless the
    /// swap chain already paces the loop.
    pub fn idle(&self, budget: FrameBudget, vsync: bool) {
        if !budget.render_due() && !vsync {
            std::thread::sleep(Duration::from_millis(IDLE_SLEEP_MS));
        }
    }

    /// Forget pending time (e.g. after a long stall the caller handled itself)
    pub fn reset(&mut self) {
        self.accumulated = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // A power-of-two step keeps the arithmetic exact
    const STEP: f64 = 1.0 / 64.0;

    #[test]
    fn test_small_deltas_accumulate() {
        let mut sched = FrameScheduler::new(STEP, 2, 0.25);
        assert_eq!(sched.advance(STEP / 2.0).steps, 0);
        let budget = sched.advance(STEP / 2.0);
        assert_eq!(budget.steps, 1);
        assert!(budget.render_due());
        assert_eq!(sched.accumulated(), 0.0);
    }

    #[test]
    fn test_no_render_without_step() {
        let mut sched = FrameScheduler::new(STEP, 2, 0.25);
        let budget = sched.advance(STEP / 4.0);
        assert!(!budget.render_due());
        assert_eq!(budget, FrameBudget::default());
    }

    #[test]
    fn test_huge_delta_capped_at_two_steps() {
        let mut sched = FrameScheduler::default();
        let budget = sched.advance(10.0);
        assert_eq!(budget.steps, 2);
        // 10 s is clamped to 0.25 s = 15 steps; 2 run, 13 are dropped
        assert_eq!(budget.dropped, 13);
        assert!(sched.accumulated() >= 0.0);
        assert!(sched.accumulated() < sched.seconds_per_step());

        // The backlog is gone: a tiny delta does not trigger more catch-up
        assert_eq!(sched.advance(0.0).steps, 0);
        assert_eq!(sched.dropped_total(), 13);
    }

    #[test]
    fn test_negative_delta_ignored() {
        let mut sched = FrameScheduler::new(STEP, 2, 0.25);
        sched.advance(STEP / 2.0);
        sched.advance(-1.0);
        assert_eq!(sched.accumulated(), STEP / 2.0);
    }

    #[test]
    fn test_fractional_remainder_survives_cap() {
        let mut sched = FrameScheduler::new(STEP, 2, 1.0);
        let budget = sched.advance(5.5 * STEP);
        assert_eq!(budget.steps, 2);
        assert_eq!(budget.dropped, 3);
        assert_eq!(sched.accumulated(), STEP / 2.0);
    }

    proptest! {
        #[test]
        fn prop_accumulator_conservation(ticks in prop::collection::vec(0u32..=16, 0..400)) {
            // Each delta is at most one step, so the cap of 2 never engages
            let mut sched = FrameScheduler::new(STEP, 2, 0.25);
            let mut steps = 0u64;
            let mut total = 0.0f64;
            for t in ticks {
                let dt = t as f64 / 1024.0;
                total += dt;
                let budget = sched.advance(dt);
                prop_assert_eq!(budget.dropped, 0);
                steps += budget.steps as u64;
                prop_assert!(sched.accumulated() >= 0.0);
                prop_assert!(sched.accumulated() < STEP);
            }
            prop_assert_eq!(steps, (total / STEP).floor() as u64);
        }

        #[test]
        fn prop_cap_never_exceeded(deltas in prop::collection::vec(0.0f64..20.0, 1..50)) {
            let mut sched = FrameScheduler::new(1.0 / 60.0, 2, 0.25);
            for dt in deltas {
                let budget = sched.advance(dt);
                prop_assert!(budget.steps <= 2);
                prop_assert!(sched.accumulated() >= 0.0);
                prop_assert!(sched.accumulated() < sched.seconds_per_step());
            }
        }
    }
}
