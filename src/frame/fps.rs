//! Rendered-frame rate measurement

/// Counts rendered frames and recomputes the rate once at least a second
/// has passed since the last measurement.
#[derive(Debug, Clone)]
pub struct FpsCounter {
    frames: u32,
    last_update: f64,
    fps: f32,
}

impl FpsCounter {
    pub fn new(now: f64) -> Self {
        Self {
            frames: 0,
            last_update: now,
            fps: 0.0,
        }
    }

    /// Record one rendered frame. Returns the new rate when it was recomputed.
    pub fn frame(&mut self, now: f64) -> Option<f32> {
        self.frames += 1;
        let elapsed = now - self.last_update;
        if elapsed < 1.0 {
            return None;
        }

        self.fps = (self.frames as f64 / elapsed) as f32;
        self.frames = 0;
        self.last_update = now;
        Some(self.fps)
    }

    /// Last measured rate (0 until the first second has passed)
    pub fn fps(&self) -> f32 {
        self.fps
    }
}
