//! Bullet simulation
//!
//! Pure CPU state, no rendering or platform dependencies:
//! - Fixed timestep only (one call to [`Simulation::step`] is one frame)
//! - Seeded RNG only
//! - Exclusive ownership, no locking

pub mod projectile;
pub mod spawner;
pub mod store;

pub use projectile::Projectile;
pub use spawner::Spawner;
pub use store::ProjectileStore;

use glam::Vec2;

use crate::settings::SpawnerSettings;

/// Everything a simulation step touches
#[derive(Debug, Clone)]
pub struct Simulation {
    pub store: ProjectileStore,
    pub spawner: Spawner,
    /// Visible area (pixels); culling adds the off-screen margin on top
    bounds: Vec2,
    /// Steps run since creation
    ticks: u64,
}

impl Simulation {
    /// `capacity` must not exceed the renderer's per-flush instance limit
    pub fn new(capacity: usize, bounds: Vec2, spawner: &SpawnerSettings) -> Self {
        Self {
            store: ProjectileStore::new(capacity),
            spawner: Spawner::new(spawner, bounds * 0.5),
            bounds,
            ticks: 0,
        }
    }

    pub fn bounds(&self) -> Vec2 {
        self.bounds
    }

    /// Follow a window resize; the emitter stays centred
    pub fn set_bounds(&mut self, bounds: Vec2) {
        self.bounds = bounds;
        self.spawner.origin = bounds * 0.5;
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// One fixed step: spawn first, then integrate and cull
    pub fn step(&mut self) {
        self.spawner.emit(&mut self.store);
        self.store.update(self.bounds);
        self.ticks += 1;
    }
}
