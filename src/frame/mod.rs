//! Outer-loop timing: how many simulation steps to run and when to render

pub mod fps;
pub mod pacer;
pub mod scheduler;

pub use fps::FpsCounter;
pub use pacer::{DeadlinePacer, Pace};
pub use scheduler::{FrameBudget, FrameScheduler};
