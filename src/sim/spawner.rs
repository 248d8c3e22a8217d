//! Bullet emitter
//!
//! Owns the spawn-angle progression that drives the radial patterns, so two
//! spawners built from the same settings emit identical streams.

use std::f32::consts::{PI, TAU};

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::store::ProjectileStore;
use crate::normalize_angle;
use crate::settings::{SpawnPattern, SpawnerSettings};

#[derive(Debug, Clone)]
pub struct Spawner {
    pub origin: Vec2,
    pattern: SpawnPattern,
    /// Base heading of the next volley (radians, kept in [-π, π))
    angle: f32,
    /// Rotation of the base heading per step
    angular_vel: f32,
    /// Growth of `angular_vel` per step
    angular_accel: f32,
    arms: u32,
    speed: f32,
    bursts_per_step: u32,
    kind: u16,
    color: u16,
    rng: Pcg32,
}

impl Spawner {
    pub fn new(settings: &SpawnerSettings, origin: Vec2) -> Self {
        Self {
            origin,
            pattern: settings.pattern,
            angle: 0.0,
            angular_vel: 0.0,
            angular_accel: settings.angular_accel,
            arms: settings.arms.max(1),
            speed: settings.speed,
            bursts_per_step: settings.bursts_per_step,
            kind: settings.kind,
            color: settings.color,
            rng: Pcg32::seed_from_u64(settings.seed),
        }
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn angular_vel(&self) -> f32 {
        self.angular_vel
    }

    /// Angle between neighbouring arms of one volley
    pub fn spread(&self) -> f32 {
        TAU / self.arms as f32
    }

    /// Run one simulation step of the emitter. Returns how many projectiles
    /// the store accepted.
    pub fn emit(&mut self, store: &mut ProjectileStore) -> usize {
        self.angular_vel += self.angular_accel;
        self.angle = normalize_angle(self.angle + self.angular_vel);

        let spread = self.spread();
        let mut spawned = 0;
        for _ in 0..self.bursts_per_step {
            let base = match self.pattern {
                SpawnPattern::Spiral => self.angle,
                SpawnPattern::Scatter => self.rng.random_range(-PI..PI),
            };
            for arm in 0..self.arms {
                let angle = base + arm as f32 * spread;
                if store.spawn_with_angle(self.origin, angle, self.speed, self.kind, self.color) {
                    spawned += 1;
                }
            }
        }
        spawned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trig::TWO_PI_3;

    fn spiral() -> SpawnerSettings {
        SpawnerSettings::default()
    }

    #[test]
    fn test_default_spiral_emits_three_arms() {
        let mut store = ProjectileStore::new(16);
        let mut spawner = Spawner::new(&spiral(), Vec2::new(640.0, 480.0));
        assert_eq!(spawner.emit(&mut store), 3);

        let angles: Vec<f32> = store.active().iter().map(|p| p.angle).collect();
        assert!((angles[1] - angles[0] - TWO_PI_3).abs() < 1e-5);
        assert!((angles[2] - angles[1] - TWO_PI_3).abs() < 1e-5);
        assert!(store.active().iter().all(|p| p.speed == 8.0));
        assert!(store.active().iter().all(|p| p.pos == Vec2::new(640.0, 480.0)));
    }

    #[test]
    fn test_angular_velocity_accumulates() {
        let mut store = ProjectileStore::new(64);
        let mut spawner = Spawner::new(&spiral(), Vec2::ZERO);
        spawner.emit(&mut store);
        spawner.emit(&mut store);
        spawner.emit(&mut store);
        // 0.001 + 0.002 + 0.003
        assert!((spawner.angular_vel() - 0.003).abs() < 1e-6);
        assert!((spawner.angle() - 0.006).abs() < 1e-6);
    }

    #[test]
    fn test_bursts_multiply_volley() {
        let settings = SpawnerSettings {
            bursts_per_step: 4,
            ..spiral()
        };
        let mut store = ProjectileStore::new(100);
        let mut spawner = Spawner::new(&settings, Vec2::ZERO);
        assert_eq!(spawner.emit(&mut store), 12);
    }

    #[test]
    fn test_emit_reports_only_accepted_spawns() {
        let mut store = ProjectileStore::new(2);
        let mut spawner = Spawner::new(&spiral(), Vec2::ZERO);
        assert_eq!(spawner.emit(&mut store), 2);
        assert_eq!(store.dropped(), 1);
    }

    #[test]
    fn test_scatter_is_deterministic_per_seed() {
        let settings = SpawnerSettings {
            pattern: SpawnPattern::Scatter,
            seed: 7,
            ..spiral()
        };
        let mut a = ProjectileStore::new(32);
        let mut b = ProjectileStore::new(32);
        let mut sa = Spawner::new(&settings, Vec2::ZERO);
        let mut sb = Spawner::new(&settings, Vec2::ZERO);
        for _ in 0..5 {
            sa.emit(&mut a);
            sb.emit(&mut b);
        }
        assert_eq!(a.active(), b.active());
    }
}
