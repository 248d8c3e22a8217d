//! Lookup-table trigonometry
//!
//! The full circle is divided into 2048 steps. Only the first quarter wave
//! (513 samples, `0..=PI/2`) is stored; the other three quarters are folded
//! onto it by mirroring the index and flipping the IEEE-754 sign bit.
//!
//! Values are truncated to the table step (`TAU / 2048`), so the absolute
//! error of [`sin`] and [`cos`] is about [`MAX_ERROR`]. `sin(0)` and `cos(0)`
//! are exact.

use std::f32::consts::{FRAC_PI_2, PI, TAU};
use std::sync::LazyLock;

/// 120 degrees
pub const TWO_PI_3: f32 = TAU / 3.0;

/// Number of table steps per full turn
const STEPS: i32 = 2048;
/// Samples in the stored quarter wave (inclusive of PI/2)
const QUARTER: usize = (STEPS / 4) as usize + 1;
const RAD_TO_INDEX: f32 = (STEPS / 2) as f32 / PI;

/// One table step: the truncation error bound of [`sin`] and [`cos`]
pub const MAX_ERROR: f32 = TAU / STEPS as f32;

static SIN_TABLE: LazyLock<[f32; QUARTER]> = LazyLock::new(|| {
    let step = TAU / STEPS as f32;
    let mut table = [0.0f32; QUARTER];
    for (i, slot) in table.iter_mut().enumerate() {
        *slot = (step * i as f32).sin();
    }
    table[0] = 0.0;
    table[QUARTER - 1] = 1.0;
    table
});

/// Force table construction up front so the first simulation step doesn't pay for it
pub fn init() {
    LazyLock::force(&SIN_TABLE);
    log::debug!("Trig lookup table ready ({} samples)", QUARTER);
}

/// Map a full-circle index in `[0, 2048)` onto the quarter table
#[inline]
fn lookup(full_index: i32) -> f32 {
    // Fold the half wave [0, 1023] onto [0, 512, 0]
    let quarter_index = 512 - ((full_index & 1023) - 512).abs();
    let value = SIN_TABLE[quarter_index as usize];

    // The second half turn is the negated first half
    let sign_bit = ((full_index as u32) & 1024) << 21;
    f32::from_bits(value.to_bits() ^ sign_bit)
}

/// Lookup-table sine (radians in, `[-1, 1]` out)
#[inline]
pub fn sin(radians: f32) -> f32 {
    let index = (radians * RAD_TO_INDEX).floor() as i32 & (STEPS - 1);
    lookup(index)
}

/// Lookup-table cosine, `sin(x + PI/2)` shifted by a quarter table
#[inline]
pub fn cos(radians: f32) -> f32 {
    let index = (radians * RAD_TO_INDEX + (STEPS / 4) as f32).floor() as i32 & (STEPS - 1);
    lookup(index)
}

/// Polynomial atan on `z` in `[0, 1]`
#[inline]
fn atan_01(z: f32) -> f32 {
    let z2 = z * z;
    (((-0.046_496_475 * z2 + 0.159_314_22) * z2 - 0.327_622_76) * z2 * z) + z
}

/// Branch-light atan2 approximation, error below 0.005 rad
#[inline]
pub fn atan2(y: f32, x: f32) -> f32 {
    let ax = x.abs();
    let ay = y.abs();

    // Bias keeps 0/0 finite
    let min = ax.min(ay);
    let max = ax.max(ay) + 1e-7;
    let mut angle = atan_01(min / max);

    if ay > ax {
        angle = FRAC_PI_2 - angle;
    }
    if x < 0.0 {
        angle = PI - angle;
    }
    angle.copysign(y)
}
