//! The player's robot
//!
//! Movement intent, the jump/double-jump rules, ground-contact counting,
//! the animation state machine and the shield all live here. Physics
//! integration against the level is done by the tick.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::physics::Aabb;
use crate::consts::*;

/// Animation/movement state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RobotState {
    Idle,
    Running,
    Jumping,
    /// Airborne without having jumped (walked off a ledge)
    Falling,
}

impl RobotState {
    /// Animation clip a host should play for this state
    pub fn animation(&self) -> &'static str {
        match self {
            RobotState::Idle => "idle",
            RobotState::Running => "run",
            RobotState::Jumping => "jump",
            RobotState::Falling => "fall",
        }
    }

    /// Whether the looping footstep sound plays in this state
    pub fn footsteps(&self) -> bool {
        matches!(self, RobotState::Running)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Robot {
    /// Bottom-centre of the collision box
    pub pos: Vec2,
    pub vel: Vec2,
    pub facing_left: bool,
    to_left: bool,
    to_right: bool,
    jumping: bool,
    number_of_jumps: u8,
    /// Jump button was held last tick (jumps trigger on press, not hold)
    jump_latch: bool,
    feet_touching: u32,
    shield: u32,
    max_shield: u32,
    /// Damage of every harm object currently in contact
    active_harm: Vec<u32>,
    state: RobotState,
}

impl Robot {
    pub fn new(pos: Vec2, max_shield: u32) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            facing_left: false,
            to_left: false,
            to_right: false,
            jumping: false,
            number_of_jumps: 0,
            jump_latch: false,
            feet_touching: 0,
            shield: max_shield,
            max_shield,
            active_harm: Vec::new(),
            state: RobotState::Idle,
        }
    }

    /// Collision box
    pub fn bounds(&self) -> Aabb {
        Aabb::from_min_size(
            Vec2::new(self.pos.x - ROBOT_SIZE.x / 2.0, self.pos.y),
            ROBOT_SIZE,
        )
    }

    pub fn set_bounds(&mut self, bounds: Aabb) {
        self.pos = Vec2::new(bounds.center().x, bounds.min.y);
    }

    /// Centre of the collision box
    pub fn body_center(&self) -> Vec2 {
        self.bounds().center()
    }

    /// Thin sensor under the robot, slightly narrower than the body
    pub fn feet_center(&self) -> Vec2 {
        Vec2::new(self.pos.x, self.pos.y - FEET_SENSOR_HEIGHT / 2.0)
    }

    pub fn feet_half() -> Vec2 {
        Vec2::new(ROBOT_SIZE.x * 0.4, FEET_SENSOR_HEIGHT / 2.0)
    }

    pub fn state(&self) -> RobotState {
        self.state
    }

    pub fn is_jumping(&self) -> bool {
        self.jumping
    }

    pub fn number_of_jumps(&self) -> u8 {
        self.number_of_jumps
    }

    pub fn feet_touching(&self) -> u32 {
        self.feet_touching
    }

    pub fn feet_touch_anything(&self) -> bool {
        self.feet_touching > 0
    }

    pub fn shield(&self) -> u32 {
        self.shield
    }

    pub fn max_shield(&self) -> u32 {
        self.max_shield
    }

    pub fn periodic_damage(&self) -> u32 {
        self.active_harm.iter().copied().max().unwrap_or(0)
    }

    /// Apply left/right intent; sets horizontal velocity and facing
    pub fn set_movement(&mut self, to_left: bool, to_right: bool) {
        if to_left {
            self.facing_left = true;
        }
        if to_right {
            self.facing_left = false;
        }
        self.to_left = to_left;
        self.to_right = to_right;

        let dir = (if to_left { 0.0 } else { 1.0 }) - (if to_right { 0.0 } else { 1.0 });
        self.vel.x = dir * NORMAL_MOVEMENT.x;
    }

    /// Feed the jump button; returns true when an impulse was applied
    pub fn jump(&mut self, pressed: bool) -> bool {
        if !pressed {
            self.jump_latch = false;
            return false;
        }
        if self.jump_latch {
            return false;
        }
        self.jump_latch = true;

        let do_jump = if !self.jumping && self.feet_touch_anything() {
            self.number_of_jumps = 1;
            true
        } else if self.jumping && self.number_of_jumps < MAX_JUMPS {
            self.number_of_jumps += 1;
            true
        } else {
            false
        };

        if do_jump {
            // Mass is 1, so the impulse is the new vertical speed
            self.vel.y = NORMAL_MOVEMENT.y;
            self.jumping = true;
        }
        do_jump
    }

    /// Feet started touching something walkable; returns true on landing
    pub fn feet_touch_start(&mut self) -> bool {
        self.feet_touching += 1;
        if self.jumping {
            self.jumping = false;
            self.number_of_jumps = 0;
            return true;
        }
        false
    }

    pub fn feet_touch_end(&mut self) {
        self.feet_touching = self.feet_touching.saturating_sub(1);
    }

    pub fn decide_state(&self) -> RobotState {
        if self.jumping {
            RobotState::Jumping
        } else if !self.feet_touch_anything() && self.vel.y < 0.0 {
            RobotState::Falling
        } else if self.to_left || self.to_right {
            RobotState::Running
        } else {
            RobotState::Idle
        }
    }

    /// Switch to the decided state; returns the new state when it changed
    pub fn update_state(&mut self) -> Option<RobotState> {
        let wanted = self.decide_state();
        if wanted != self.state {
            self.state = wanted;
            Some(wanted)
        } else {
            None
        }
    }

    /// Subtract shield, saturating at zero. Returns true if any damage applied.
    pub fn damage_shield(&mut self, amount: u32) -> bool {
        if amount == 0 || self.shield == 0 {
            return false;
        }
        self.shield = self.shield.saturating_sub(amount);
        true
    }

    /// Touching a harm object: hurt now and keep hurting every tick
    pub fn start_periodic_damage(&mut self, amount: u32) -> bool {
        self.active_harm.push(amount);
        self.damage_shield(amount)
    }

    pub fn stop_periodic_damage(&mut self, amount: u32) {
        if let Some(idx) = self.active_harm.iter().position(|&d| d == amount) {
            self.active_harm.swap_remove(idx);
        }
    }

    /// Per-tick damage from harm objects still in contact
    pub fn apply_periodic_damage(&mut self) -> bool {
        let amount = self.periodic_damage();
        self.damage_shield(amount)
    }

    pub fn shield_percentage(&self) -> f32 {
        if self.max_shield == 0 {
            return 0.0;
        }
        self.shield as f32 / self.max_shield as f32 * 100.0
    }

    pub fn is_destroyed(&self) -> bool {
        self.shield == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grounded() -> Robot {
        let mut robot = Robot::new(Vec2::ZERO, 100);
        robot.feet_touch_start();
        robot
    }

    #[test]
    fn test_horizontal_movement() {
        let mut robot = Robot::new(Vec2::ZERO, 100);
        robot.set_movement(true, false);
        assert_eq!(robot.vel.x, -NORMAL_MOVEMENT.x);
        assert!(robot.facing_left);

        robot.set_movement(false, true);
        assert_eq!(robot.vel.x, NORMAL_MOVEMENT.x);
        assert!(!robot.facing_left);

        // both pressed cancel out
        robot.set_movement(true, true);
        assert_eq!(robot.vel.x, 0.0);
    }

    #[test]
    fn test_cannot_jump_in_the_air() {
        let mut robot = Robot::new(Vec2::ZERO, 100);
        assert!(!robot.jump(true));
        assert_eq!(robot.vel.y, 0.0);
    }

    #[test]
    fn test_double_jump_needs_release() {
        let mut robot = grounded();
        assert!(robot.jump(true));
        assert_eq!(robot.number_of_jumps(), 1);

        // holding does nothing
        assert!(!robot.jump(true));

        robot.jump(false);
        assert!(robot.jump(true));
        assert_eq!(robot.number_of_jumps(), 2);

        // no triple jump
        robot.jump(false);
        assert!(!robot.jump(true));
    }

    #[test]
    fn test_landing_resets_jumps() {
        let mut robot = grounded();
        robot.jump(true);
        robot.feet_touch_end();
        assert!(robot.feet_touch_start());
        assert!(!robot.is_jumping());
        assert_eq!(robot.number_of_jumps(), 0);
    }

    #[test]
    fn test_feet_counter_is_reference_counted() {
        let mut robot = Robot::new(Vec2::ZERO, 100);
        robot.feet_touch_start();
        robot.feet_touch_start();
        robot.feet_touch_end();
        assert!(robot.feet_touch_anything());
        robot.feet_touch_end();
        assert!(!robot.feet_touch_anything());
        robot.feet_touch_end();
        assert_eq!(robot.feet_touching(), 0);
    }

    #[test]
    fn test_state_machine() {
        let mut robot = grounded();
        assert_eq!(robot.update_state(), None);

        robot.set_movement(false, true);
        assert_eq!(robot.update_state(), Some(RobotState::Running));
        assert!(robot.state().footsteps());

        robot.jump(true);
        assert_eq!(robot.update_state(), Some(RobotState::Jumping));
        assert_eq!(robot.state().animation(), "jump");

        robot.feet_touch_start();
        robot.set_movement(false, false);
        assert_eq!(robot.update_state(), Some(RobotState::Idle));
    }

    #[test]
    fn test_falling_off_a_ledge() {
        let mut robot = grounded();
        robot.feet_touch_end();
        robot.vel.y = -10.0;
        assert_eq!(robot.update_state(), Some(RobotState::Falling));
        // no ground, no jump
        assert!(!robot.jump(true));
    }

    #[test]
    fn test_shield_saturates() {
        let mut robot = Robot::new(Vec2::ZERO, 10);
        assert!(robot.damage_shield(4));
        assert_eq!(robot.shield_percentage(), 60.0);
        assert!(robot.damage_shield(40));
        assert_eq!(robot.shield(), 0);
        assert!(robot.is_destroyed());
        assert!(!robot.damage_shield(1));
    }

    #[test]
    fn test_periodic_damage() {
        let mut robot = Robot::new(Vec2::ZERO, 100);
        robot.start_periodic_damage(5);
        assert_eq!(robot.shield(), 95);
        robot.apply_periodic_damage();
        assert_eq!(robot.shield(), 90);

        robot.start_periodic_damage(2);
        assert_eq!(robot.periodic_damage(), 5);
        robot.stop_periodic_damage(5);
        assert_eq!(robot.periodic_damage(), 2);
        robot.stop_periodic_damage(2);
        assert!(!robot.apply_periodic_damage());
        assert_eq!(robot.shield(), 88);
    }
}
