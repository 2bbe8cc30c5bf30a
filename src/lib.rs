//! Lasers and Bots - a 2D robot platformer
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics world, robot, lasers, switches, scoring)
//! - `levels`: Level catalogue and per-level records
//! - `persistence`: Flat key/value store backing records and settings
//! - `settings`: Player preferences
//! - `runner`: Headless fixed-timestep driver for scripted sessions

pub mod error;
pub mod levels;
pub mod persistence;
pub mod runner;
pub mod settings;
pub mod sim;

pub use error::{Error, Result};
pub use levels::{CompletedResult, LevelInfo, LevelManager};
pub use persistence::{KeyValueStore, Value};
pub use runner::{InputScript, InputSegment, Runner};
pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    use glam::Vec2;

    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// World gravity (units/s²)
    pub const GRAVITY: f32 = -5000.0;

    /// Robot horizontal run speed and vertical jump impulse (mass is 1)
    pub const NORMAL_MOVEMENT: Vec2 = Vec2::new(1000.0, 2600.0);
    /// Robot collision box (width, height)
    pub const ROBOT_SIZE: Vec2 = Vec2::new(96.0, 200.0);
    /// Height of the feet sensor under the robot
    pub const FEET_SENSOR_HEIGHT: f32 = 6.0;
    /// Jumps allowed before landing again
    pub const MAX_JUMPS: u8 = 2;

    /// How far a laser reaches when it hits nothing
    pub const MAX_LASER_LENGTH: f32 = 10000.0;
    /// Laser sweep speed in degrees per second (scaled by the laser's speed factor)
    pub const LASER_SWEEP_DEG_PER_SEC: f32 = 5.0;

    /// Shapes closer than this are considered touching
    pub const CONTACT_SLOP: f32 = 1.0;

    /// Countdown before a level starts (3, 2, 1, 0, GO)
    pub const COUNTDOWN_SECS: f32 = 4.6;
    /// Time the explosion plays before the game over
    pub const EXPLOSION_SECS: f32 = 5.0;
    /// Number of robot fragments spawned on explosion
    pub const ROBOT_FRAGMENTS: usize = 6;

    /// Time record reported when a level was never completed
    pub const NO_TIME_RECORD: f32 = 999_999.0;
}

/// Convert degrees to radians
#[inline]
pub fn deg_to_rad(deg: f32) -> f32 {
    deg * std::f32::consts::PI / 180.0
}

/// Unit vector for an angle in radians
#[inline]
pub fn direction_from_angle(angle: f32) -> glam::Vec2 {
    glam::Vec2::new(angle.cos(), angle.sin())
}
