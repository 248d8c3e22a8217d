//! Runtime settings
//!
//! Read from a JSON file next to the executable's working directory. Every
//! field is optional in the file; missing ones take their defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_MAX_INSTANCES, MAX_CATCH_UP_STEPS, MAX_FRAME_DELTA, TARGET_FPS};
use crate::error::SettingsError;

/// How the outer loop paces simulation and rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Pacing {
    /// Accumulate real time, run up to `max_catch_up_steps` fixed steps per
    /// iteration, render only when a step ran
    #[default]
    FixedStep,
    /// One step and one render per iteration, then spin-wait to the next
    /// wall-clock deadline
    Deadline,
}

impl Pacing {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pacing::FixedStep => "fixed_step",
            Pacing::Deadline => "deadline",
        }
    }
}

/// Emitter pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SpawnPattern {
    /// Rotating, accelerating radial volleys
    #[default]
    Spiral,
    /// Radial volleys at a seeded random base angle
    Scatter,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnerSettings {
    pub pattern: SpawnPattern,
    /// Projectiles per volley, evenly spaced around the circle
    pub arms: u32,
    /// Volleys per simulation step (raise for stress testing)
    pub bursts_per_step: u32,
    /// Pixels per step
    pub speed: f32,
    /// Growth of the spiral's rotation rate (radians per step²)
    pub angular_accel: f32,
    pub kind: u16,
    pub color: u16,
    /// RNG seed for the scatter pattern
    pub seed: u64,
}

impl Default for SpawnerSettings {
    fn default() -> Self {
        Self {
            pattern: SpawnPattern::Spiral,
            arms: 3,
            bursts_per_step: 1,
            speed: 8.0,
            angular_accel: 0.001,
            kind: 0,
            color: 0,
            seed: 0,
        }
    }
}

/// Engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Window ===
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Let the swap chain pace presentation
    pub vsync: bool,

    // === Frame pacing ===
    pub pacing: Pacing,
    /// Simulation rate (Hz)
    pub target_fps: f64,
    /// Clock deltas above this are clamped (seconds)
    pub max_frame_delta: f64,
    /// Fixed steps allowed per outer iteration
    pub max_catch_up_steps: u32,

    // === Capacity ===
    /// Sprite instances per flush
    pub max_instances: usize,
    /// Projectile pool size; defaults to `max_instances` and may never exceed it
    pub bullet_capacity: Option<usize>,

    // === Scene ===
    pub clear_color: [f32; 4],
    pub bullet_size: f32,
    pub show_fps: bool,
    pub bullet_texture: Option<PathBuf>,
    pub font_atlas: Option<PathBuf>,
    pub centerpiece_texture: Option<PathBuf>,
    pub spawner: SpawnerSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            title: "Danmaku".to_string(),
            width: 1280,
            height: 960,
            vsync: false,

            pacing: Pacing::FixedStep,
            target_fps: TARGET_FPS,
            max_frame_delta: MAX_FRAME_DELTA,
            max_catch_up_steps: MAX_CATCH_UP_STEPS,

            max_instances: DEFAULT_MAX_INSTANCES,
            bullet_capacity: None,

            clear_color: [0.3, 0.0, 0.3, 1.0],
            bullet_size: 30.0,
            show_fps: true,
            bullet_texture: None,
            font_atlas: None,
            centerpiece_texture: None,
            spawner: SpawnerSettings::default(),
        }
    }
}

impl Settings {
    /// Default file name looked up in the working directory
    pub const FILE_NAME: &'static str = "danmaku.json";
    /// Environment variable overriding the settings path
    pub const PATH_ENV: &'static str = "DANMAKU_SETTINGS";

    /// Fixed simulation step (seconds)
    pub fn seconds_per_frame(&self) -> f64 {
        1.0 / self.target_fps
    }

    /// Pool size actually used (never above `max_instances`)
    pub fn bullet_capacity(&self) -> usize {
        self.bullet_capacity
            .unwrap_or(self.max_instances)
            .min(self.max_instances)
    }

    /// Replace nonsensical values with defaults and enforce that every live
    /// projectile fits in one renderer flush.
    pub fn validated(mut self) -> Self {
        let defaults = Self::default();

        if self.width == 0 || self.height == 0 {
            log::warn!(
                "Invalid window size {}x{}, using {}x{}",
                self.width,
                self.height,
                defaults.width,
                defaults.height
            );
            self.width = defaults.width;
            self.height = defaults.height;
        }
        if !(self.target_fps.is_finite() && self.target_fps > 0.0) {
            log::warn!("Invalid target_fps {}, using {}", self.target_fps, defaults.target_fps);
            self.target_fps = defaults.target_fps;
        }
        if !(self.max_frame_delta.is_finite() && self.max_frame_delta > 0.0) {
            log::warn!(
                "Invalid max_frame_delta {}, using {}",
                self.max_frame_delta,
                defaults.max_frame_delta
            );
            self.max_frame_delta = defaults.max_frame_delta;
        }
        if self.max_catch_up_steps == 0 {
            log::warn!("max_catch_up_steps must be at least 1, using {}", defaults.max_catch_up_steps);
            self.max_catch_up_steps = defaults.max_catch_up_steps;
        }
        if self.max_instances == 0 {
            log::warn!("max_instances must be positive, using {}", defaults.max_instances);
            self.max_instances = defaults.max_instances;
        }
        if let Some(capacity) = self.bullet_capacity {
            if capacity > self.max_instances {
                log::warn!(
                    "bullet_capacity {} exceeds max_instances {}, clamping",
                    capacity,
                    self.max_instances
                );
                self.bullet_capacity = Some(self.max_instances);
            }
        }
        if self.spawner.arms == 0 {
            log::warn!("spawner.arms must be at least 1, using {}", defaults.spawner.arms);
            self.spawner.arms = defaults.spawner.arms;
        }

        self
    }

    /// Settings path: `$DANMAKU_SETTINGS` if set, else `./danmaku.json`
    pub fn default_path() -> PathBuf {
        std::env::var_os(Self::PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(Self::FILE_NAME))
    }

    /// Parse settings from JSON text
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str::<Self>(json)?.validated())
    }

    /// Load settings from `path`
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Load from `path` if it exists, otherwise fall back to defaults
    pub fn load_or_default(path: &Path) -> Result<Self, SettingsError> {
        if path.exists() {
            Self::load(path)
        } else {
            log::info!("No settings file at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Write settings as pretty JSON
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }
}
