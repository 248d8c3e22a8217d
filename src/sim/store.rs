//! Fixed-capacity projectile pool
//!
//! Live projectiles are packed densely at the front of the backing array.
//! Removal swaps the last live record into the hole, so iteration order is
//! NOT stable across steps that cull anything.

use glam::Vec2;

use super::projectile::Projectile;
use crate::consts::OFFSCREEN_MARGIN;
use crate::in_bounds;

/// Dense bullet pool with O(1) spawn and O(1) removal
#[derive(Debug, Clone)]
pub struct ProjectileStore {
    /// Backing storage, always `capacity` records long. Only `..active` is meaningful.
    slots: Vec<Projectile>,
    active: usize,
    /// Spawns dropped because the pool was full
    dropped: u64,
    /// Set while the pool is saturated so exhaustion is logged once per episode
    saturated: bool,
}

impl ProjectileStore {
    /// Allocate a zeroed pool. The capacity never changes afterwards.
    pub fn new(capacity: usize) -> Self {
        log::info!("Projectile pool initialized with capacity: {}", capacity);
        Self {
            slots: vec![Projectile::default(); capacity],
            active: 0,
            dropped: 0,
            saturated: false,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of live projectiles
    pub fn len(&self) -> usize {
        self.active
    }

    pub fn is_empty(&self) -> bool {
        self.active == 0
    }

    pub fn is_full(&self) -> bool {
        self.active == self.slots.len()
    }

    /// Total spawn requests rejected because the pool was full
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Live projectiles. The borrow ends before the next mutation.
    pub fn active(&self) -> &[Projectile] {
        &self.slots[..self.active]
    }

    /// Append a projectile. Returns false (and drops it) when the pool is full.
    pub fn spawn(&mut self, projectile: Projectile) -> bool {
        if self.active == self.slots.len() {
            self.dropped += 1;
            if !self.saturated {
                self.saturated = true;
                log::warn!(
                    "Projectile pool capacity ({}) reached, dropping new spawns",
                    self.slots.len()
                );
            }
            return false;
        }

        self.slots[self.active] = projectile;
        self.active += 1;
        true
    }

    /// Spawn from a heading and speed
    pub fn spawn_with_angle(&mut self, pos: Vec2, angle: f32, speed: f32, kind: u16, color: u16) -> bool {
        self.spawn(Projectile::new(pos, angle, speed).with_style(kind, color))
    }

    /// Spawn from a constant Cartesian velocity (converted to heading and speed)
    pub fn spawn_with_velocity(&mut self, pos: Vec2, velocity: Vec2, kind: u16, color: u16) -> bool {
        self.spawn(Projectile::from_velocity(pos, velocity).with_style(kind, color))
    }

    /// Integrate every live projectile one step and cull those outside
    /// `bounds` (plus the off-screen margin). Returns how many were removed.
    pub fn update(&mut self, bounds: Vec2) -> usize {
        let before = self.active;
        let mut i = 0;
        while i < self.active {
            let p = &mut self.slots[i];
            p.integrate();

            if in_bounds(p.pos, bounds, OFFSCREEN_MARGIN) {
                i += 1;
            } else {
                // Swap-remove; the record moved into `i` has not been stepped yet,
                // so stay on this index.
                self.active -= 1;
                self.slots[i] = self.slots[self.active];
            }
        }

        if self.saturated && self.active < self.slots.len() {
            self.saturated = false;
        }
        before - self.active
    }

    /// Drop every live projectile. Backing memory is left as is.
    pub fn clear(&mut self) {
        self.active = 0;
        self.saturated = false;
    }
}
