//! Danmaku - fixed-timestep bullet-hell simulation with instanced sprite batching
//!
//! Core modules:
//! - `sim`: Projectile pool, spawner and per-step simulation
//! - `frame`: Fixed-timestep scheduler, deadline pacer, FPS counter
//! - `renderer`: wgpu device, textures and the instanced sprite batcher
//! - `platform`: Monotonic clock
//! - `trig`: Lookup-table sine/cosine used by the simulation
//! - `settings`: JSON-backed runtime configuration

pub mod app;
pub mod error;
pub mod frame;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;
pub mod trig;

pub use error::{InitError, SettingsError};
pub use settings::{Pacing, Settings};

use glam::Vec2;

/// Engine configuration constants
pub mod consts {
    /// Target simulation rate (Hz)
    pub const TARGET_FPS: f64 = 60.0;
    /// Fixed simulation timestep in seconds
    pub const SECONDS_PER_FRAME: f64 = 1.0 / TARGET_FPS;
    /// Maximum simulation steps per outer iteration before the backlog is dropped
    pub const MAX_CATCH_UP_STEPS: u32 = 2;
    /// Clock deltas are clamped to this (seconds) to survive debugger pauses and OS sleep
    pub const MAX_FRAME_DELTA: f64 = 0.25;

    /// Projectiles may drift this far (pixels) outside the screen before they are culled
    pub const OFFSCREEN_MARGIN: f32 = 100.0;

    /// Default renderer batch capacity (instances per flush)
    pub const DEFAULT_MAX_INSTANCES: usize = 65_536;

    /// Spin-wait yields the CPU only while more than this remains (seconds)
    pub const YIELD_THRESHOLD: f64 = 0.002;
    /// Idle sleep when no render is due and vsync is off (milliseconds)
    pub const IDLE_SLEEP_MS: u64 = 1;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Unit heading vector for an angle, using the lookup-table trig
#[inline]
pub fn heading(angle: f32) -> Vec2 {
    Vec2::new(trig::cos(angle), trig::sin(angle))
}

/// Returns true if `pos` lies inside `[-margin, bounds.x + margin] x [-margin, bounds.y + margin]`
#[inline]
pub fn in_bounds(pos: Vec2, bounds: Vec2, margin: f32) -> bool {
    pos.x >= -margin && pos.x <= bounds.x + margin && pos.y >= -margin && pos.y <= bounds.y + margin
}
