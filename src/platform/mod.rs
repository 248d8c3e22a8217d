//! Platform abstraction layer
//!
//! Wraps the OS facilities the frame loop needs:
//! - Monotonic high-resolution time

pub mod clock;

pub use clock::{Clock, clamp_delta};
