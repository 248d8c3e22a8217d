//! Wall-clock deadline pacing
//!
//! Alternative to the accumulator: every outer iteration runs exactly one
//! simulation step and one render, then waits for the next deadline
//! (`previous + seconds_per_frame`). Overrunning by more than a whole frame
//! re-anchors the deadline to `now + seconds_per_frame`, so a stall is never
//! caught up.

use std::time::Duration;

use crate::consts::{IDLE_SLEEP_MS, YIELD_THRESHOLD};
use crate::platform::Clock;

/// Result of checking the deadline
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pace {
    /// Too early, `remaining` seconds to go
    Wait { remaining: f64 },
    /// Deadline passed. `dropped` is set when the schedule was re-anchored.
    Ready { dropped: bool },
}

#[derive(Debug, Clone)]
pub struct DeadlinePacer {
    seconds_per_frame: f64,
    next_deadline: f64,
    dropped_total: u64,
}

impl DeadlinePacer {
    /// First deadline is one frame after `now`
    pub fn new(seconds_per_frame: f64, now: f64) -> Self {
        Self {
            seconds_per_frame,
            next_deadline: now + seconds_per_frame,
            dropped_total: 0,
        }
    }

    pub fn next_deadline(&self) -> f64 {
        self.next_deadline
    }

    /// Times the schedule was re-anchored after an overrun
    pub fn dropped_total(&self) -> u64 {
        self.dropped_total
    }

    /// Compare `now` against the deadline, advancing it once it has passed
    pub fn poll(&mut self, now: f64) -> Pace {
        let remaining = self.next_deadline - now;
        if remaining > 0.0 {
            return Pace::Wait { remaining };
        }

        if -remaining <= self.seconds_per_frame {
            self.next_deadline += self.seconds_per_frame;
            Pace::Ready { dropped: false }
        } else {
            self.next_deadline = now + self.seconds_per_frame;
            self.dropped_total += 1;
            log::debug!("Frame deadline overrun by {:.2} ms, re-anchoring", -remaining * 1000.0);
            Pace::Ready { dropped: true }
        }
    }

    /// Block until the next deadline. Sleeps in 1 ms slices while more than
    /// 2 ms remain and spins for the rest. With vsync on, presentation
    /// already paced the frame, so this returns immediately.
    pub fn wait(&mut self, clock: &mut Clock, vsync: bool) -> Pace {
        loop {
            clock.tick();
            match self.poll(clock.total_time()) {
                ready @ Pace::Ready { .. } => return ready,
                wait @ Pace::Wait { remaining } => {
                    if vsync {
                        return wait;
                    }
                    if remaining > YIELD_THRESHOLD {
                        std::thread::sleep(Duration::from_millis(IDLE_SLEEP_MS));
                    } else {
                        std::hint::spin_loop();
                    }
                }
            }
        }
    }
}
