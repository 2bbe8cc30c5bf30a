//! Moving level pieces
//!
//! Saws patrol left and right, barrels bob up and down. Both are looping
//! motion paths evaluated from the level clock, so they never drift.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Horizontal saw patrol: out, wait, back, wait
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SawPatrol {
    pub movement: f32,
    pub movement_time: f32,
    pub stop_time: f32,
    /// Seconds per full turn (cosmetic)
    pub rotation_time: f32,
}

impl SawPatrol {
    fn period(&self) -> f32 {
        2.0 * (self.movement_time + self.stop_time)
    }

    /// Offset from the spawn position after `t` seconds
    pub fn offset(&self, t: f32) -> Vec2 {
        let period = self.period();
        if period <= 0.0 {
            return Vec2::ZERO;
        }
        let t = t.rem_euclid(period);
        let move_t = self.movement_time;

        let x = if t < move_t {
            self.movement * t / move_t
        } else if t < move_t + self.stop_time {
            self.movement
        } else if t < 2.0 * move_t + self.stop_time {
            self.movement * (1.0 - (t - move_t - self.stop_time) / move_t)
        } else {
            0.0
        };
        Vec2::new(x, 0.0)
    }

    /// Spin angle in degrees
    pub fn rotation(&self, t: f32) -> f32 {
        if self.rotation_time <= 0.0 {
            return 0.0;
        }
        (t / self.rotation_time).fract() * 360.0
    }
}

/// Speeds of the four bob steps; each step also travels the barrel's gap
const BARREL_STEPS: [f32; 4] = [50.0, -40.0, 30.0, -40.0];

/// Vertical barrel bob. Each barrel gets a different gap so they drift out of sync.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BarrelBob {
    pub gap: f32,
}

impl BarrelBob {
    /// `index` is 1-based, in level order
    pub fn new(index: u32) -> Self {
        Self {
            gap: index as f32 * 10.0,
        }
    }

    fn step(&self, base: f32) -> (f32, f32) {
        let distance = base.signum() * (base.abs() + self.gap);
        let duration = (base.abs() + self.gap) / base.abs();
        (distance, duration)
    }

    pub fn period(&self) -> f32 {
        BARREL_STEPS.iter().map(|&b| self.step(b).1).sum()
    }

    /// Offset from the spawn position after `t` seconds
    pub fn offset(&self, t: f32) -> Vec2 {
        let mut t = t.rem_euclid(self.period());
        let mut y = 0.0;
        for base in BARREL_STEPS {
            let (distance, duration) = self.step(base);
            if t < duration {
                y += distance * t / duration;
                break;
            }
            y += distance;
            t -= duration;
        }
        Vec2::new(0.0, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn saw() -> SawPatrol {
        SawPatrol {
            movement: 300.0,
            movement_time: 2.0,
            stop_time: 1.0,
            rotation_time: 0.5,
        }
    }

    #[test]
    fn test_saw_patrol_cycle() {
        let saw = saw();
        assert_eq!(saw.offset(0.0).x, 0.0);
        assert_eq!(saw.offset(1.0).x, 150.0);
        assert_eq!(saw.offset(2.5).x, 300.0);
        assert_eq!(saw.offset(4.0).x, 150.0);
        assert_eq!(saw.offset(5.5).x, 0.0);
        // repeats
        assert_eq!(saw.offset(7.0).x, 150.0);
    }

    #[test]
    fn test_saw_without_timing_stays_put() {
        let saw = SawPatrol {
            movement: 100.0,
            movement_time: 0.0,
            stop_time: 0.0,
            rotation_time: 0.0,
        };
        assert_eq!(saw.offset(3.0), Vec2::ZERO);
        assert_eq!(saw.rotation(3.0), 0.0);
    }

    #[test]
    fn test_saw_spins() {
        assert!((saw().rotation(0.25) - 180.0).abs() < 1e-3);
    }

    #[test]
    fn test_barrel_steps() {
        let barrel = BarrelBob::new(1);
        // first step: 60 up over 1.2s
        assert!((barrel.offset(1.2).y - 60.0).abs() < 1e-3);
        // second step: 50 down over 1.25s
        assert!((barrel.offset(2.45).y - 10.0).abs() < 1e-3);
        let period = barrel.period();
        assert!((period - (1.2 + 1.25 + 4.0 / 3.0 + 1.25)).abs() < 1e-4);
    }

    #[test]
    fn test_barrel_returns_home() {
        for index in 1..5 {
            let barrel = BarrelBob::new(index);
            let period = barrel.period();
            assert!(barrel.offset(period - 1e-4).y.abs() < 0.1);
            assert!(barrel.offset(period * 3.0 + 0.5).y > 0.0);
        }
    }
}
