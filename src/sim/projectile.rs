//! Projectile record and its integration rule

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::heading;

/// A single bullet, stored by value in the pool.
///
/// Heading is measured in radians from +x, clockwise on screen (y grows
/// downward). All rates are per simulation step, not per second.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Projectile {
    /// Screen-space position (pixels)
    pub pos: Vec2,
    /// Heading (radians)
    pub angle: f32,
    /// Radians per step
    pub angular_vel: f32,
    /// Radians per step²
    pub angular_accel: f32,
    /// Pixels per step
    pub speed: f32,
    /// Pixels per step²
    pub tangential_accel: f32,
    /// Sprite variant selector
    pub kind: u16,
    /// Color variant selector
    pub color: u16,
}

impl Projectile {
    /// Projectile moving in a straight line at constant speed
    pub fn new(pos: Vec2, angle: f32, speed: f32) -> Self {
        Self {
            pos,
            angle,
            speed,
            ..Default::default()
        }
    }

    /// Build the canonical angle/speed form from a constant Cartesian velocity
    pub fn from_velocity(pos: Vec2, velocity: Vec2) -> Self {
        Self::new(pos, crate::trig::atan2(velocity.y, velocity.x), velocity.length())
    }

    pub fn with_style(mut self, kind: u16, color: u16) -> Self {
        self.kind = kind;
        self.color = color;
        self
    }

    /// Advance one step with semi-implicit Euler: rates first, then the
    /// quantities that depend on them.
    #[inline]
    pub fn integrate(&mut self) {
        self.angular_vel += self.angular_accel;
        self.speed += self.tangential_accel;
        self.angle += self.angular_vel;
        self.pos += heading(self.angle) * self.speed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integrate_straight_line() {
        let mut p = Projectile::new(Vec2::ZERO, 0.0, 8.0);
        p.integrate();
        assert_eq!(p.angle, 0.0);
        assert_eq!(p.pos, Vec2::new(8.0, 0.0));
    }

    #[test]
    fn test_integrate_updates_rates_before_position() {
        let mut p = Projectile {
            angular_accel: 0.0,
            tangential_accel: 2.0,
            speed: 0.0,
            ..Default::default()
        };
        p.integrate();
        // Speed was raised to 2 before the position moved
        assert_eq!(p.speed, 2.0);
        assert_eq!(p.pos, Vec2::new(2.0, 0.0));

        let mut q = Projectile {
            angular_accel: 0.5,
            speed: 1.0,
            ..Default::default()
        };
        q.integrate();
        assert_eq!(q.angular_vel, 0.5);
        assert_eq!(q.angle, 0.5);
        assert!((q.pos.x - 0.5f32.cos()).abs() <= crate::trig::MAX_ERROR + 1e-4);
        assert!((q.pos.y - 0.5f32.sin()).abs() <= crate::trig::MAX_ERROR + 1e-4);
    }

    #[test]
    fn test_from_velocity_matches_direction() {
        let p = Projectile::from_velocity(Vec2::new(10.0, 10.0), Vec2::new(0.0, 3.0));
        assert!((p.angle - std::f32::consts::FRAC_PI_2).abs() < 0.005);
        assert_eq!(p.speed, 3.0);
        assert_eq!(p.angular_vel, 0.0);
        assert_eq!(p.tangential_accel, 0.0);
    }
}
