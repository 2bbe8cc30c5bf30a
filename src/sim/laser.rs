//! Sweeping lasers
//!
//! A laser casts a ray from its origin, damages the robot when the robot is
//! the nearest thing hit, then rotates a little. It sweeps back and forth
//! between two angles forever.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::physics::{PhysicsWorld, RayHit, category};
use crate::consts::*;
use crate::{deg_to_rad, direction_from_angle};

/// Everything a laser beam can stop on
pub const LASER_MASK: u16 = category::ALL & !category::FEET;

/// What a laser drew this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaserBeam {
    pub origin: Vec2,
    /// Hit point, or full reach when nothing was hit
    pub end: Vec2,
    pub hit: Option<RayHit>,
}

impl LaserBeam {
    pub fn hit_robot(&self) -> bool {
        self.hit.is_some_and(|h| h.category == category::ROBOT)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Laser {
    pub name: String,
    pub origin: Vec2,
    /// Current angle (radians, counter-clockwise from +x)
    pub angle: f32,
    initial_angle: f32,
    final_angle: f32,
    /// +1, -1, or 0 for a laser that never moves
    direction: f32,
    speed: f32,
    pub damage: u32,
}

impl Laser {
    /// Build from editor values: `rotation` is the clockwise start rotation and
    /// `rotation_angle` how far it sweeps, both in degrees.
    pub fn new(
        name: impl Into<String>,
        origin: Vec2,
        rotation: f32,
        rotation_angle: f32,
        speed: f32,
        damage: u32,
    ) -> Self {
        let initial_angle = deg_to_rad(90.0 - rotation);
        let final_angle = deg_to_rad(90.0 - rotation - rotation_angle);
        let direction = if rotation_angle == 0.0 {
            0.0
        } else {
            -rotation_angle.signum()
        };

        Self {
            name: name.into(),
            origin,
            angle: initial_angle,
            initial_angle,
            final_angle,
            direction,
            speed,
            damage,
        }
    }

    pub fn direction(&self) -> f32 {
        self.direction
    }

    /// Angle the laser is currently sweeping towards
    pub fn target_angle(&self) -> f32 {
        self.final_angle
    }

    /// Cast the beam against the world at the current angle
    pub fn cast(&self, world: &PhysicsWorld) -> LaserBeam {
        let reach = self.origin + direction_from_angle(self.angle) * MAX_LASER_LENGTH;
        let hit = world.ray_cast(self.origin, reach, LASER_MASK);
        LaserBeam {
            origin: self.origin,
            end: hit.map_or(reach, |h| h.point),
            hit,
        }
    }

    /// Rotate by the sweep speed; returns true when a bound was reached and
    /// the sweep reversed.
    pub fn advance(&mut self, dt: f32) -> bool {
        if self.direction == 0.0 {
            return false;
        }

        self.angle += deg_to_rad(LASER_SWEEP_DEG_PER_SEC) * dt * self.speed * self.direction;

        let passed = if self.direction < 0.0 {
            self.angle < self.final_angle
        } else {
            self.angle > self.final_angle
        };

        if passed {
            self.angle = self.final_angle;
            self.final_angle = self.initial_angle;
            self.initial_angle = self.angle;
            self.direction = -self.direction;
        }
        passed
    }

    /// One tick: cast first, then rotate
    pub fn update(&mut self, world: &PhysicsWorld, dt: f32) -> LaserBeam {
        let beam = self.cast(world);
        self.advance(dt);
        beam
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::physics::Shape;

    #[test]
    fn test_angles_from_editor_values() {
        let laser = Laser::new("laser", Vec2::ZERO, 0.0, 90.0, 1.0, 5);
        assert!((laser.angle - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
        assert!(laser.target_angle().abs() < 1e-6);
        // positive rotation angle sweeps clockwise
        assert_eq!(laser.direction(), -1.0);
    }

    #[test]
    fn test_static_laser_never_moves() {
        let mut laser = Laser::new("laser", Vec2::ZERO, 30.0, 0.0, 1.0, 5);
        let before = laser.angle;
        for _ in 0..600 {
            assert!(!laser.advance(SIM_DT));
        }
        assert_eq!(laser.angle, before);
    }

    #[test]
    fn test_sweep_reverses_at_bounds() {
        // 10 degree sweep at speed 10 => 50 deg/s => 0.2s per leg
        let mut laser = Laser::new("laser", Vec2::ZERO, 0.0, -10.0, 10.0, 5);
        let start = laser.angle;
        assert_eq!(laser.direction(), 1.0);

        let mut flips = 0;
        for _ in 0..((0.2 / SIM_DT) as usize + 2) {
            if laser.advance(SIM_DT) {
                flips += 1;
            }
        }
        assert_eq!(flips, 1);
        assert_eq!(laser.direction(), -1.0);
        assert!((laser.target_angle() - start).abs() < 1e-6);
        assert!(laser.angle <= start + deg_to_rad(10.0) + 1e-6);
    }

    #[test]
    fn test_beam_stops_at_nearest_hit() {
        let mut world = PhysicsWorld::new();
        let robot = world.add_body(
            category::ROBOT,
            Vec2::new(0.0, 500.0),
            Shape::Aabb { half: Vec2::new(48.0, 100.0) },
            false,
        );
        let laser = Laser::new("laser", Vec2::ZERO, 0.0, 0.0, 1.0, 5);
        let beam = laser.cast(&world);
        assert!(beam.hit_robot());
        assert_eq!(beam.hit.map(|h| h.body), Some(robot));
        assert!((beam.end.y - 400.0).abs() < 0.01);

        // a wall in front shields the robot
        world.add_body(
            category::WORLD,
            Vec2::new(0.0, 200.0),
            Shape::Aabb { half: Vec2::new(50.0, 10.0) },
            false,
        );
        let beam = laser.cast(&world);
        assert!(!beam.hit_robot());
        assert!((beam.end.y - 190.0).abs() < 0.01);
    }

    #[test]
    fn test_beam_ignores_feet_sensor() {
        let mut world = PhysicsWorld::new();
        world.add_body(
            category::FEET,
            Vec2::new(0.0, 100.0),
            Shape::Aabb { half: Vec2::splat(10.0) },
            true,
        );
        let laser = Laser::new("laser", Vec2::ZERO, 0.0, 0.0, 1.0, 5);
        let beam = laser.cast(&world);
        assert!(beam.hit.is_none());
        assert!((beam.end.y - MAX_LASER_LENGTH).abs() < 0.5);
    }
}
