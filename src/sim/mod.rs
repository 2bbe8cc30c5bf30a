//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by body id / object name)
//! - No rendering, audio or platform dependencies

pub mod hazards;
pub mod laser;
pub mod level;
pub mod physics;
pub mod robot;
pub mod scoring;
pub mod state;
pub mod switches;
pub mod tick;

pub use hazards::{BarrelBob, SawPatrol};
pub use laser::{Laser, LaserBeam};
pub use level::{HarmKind, LevelMap, LevelObject, RectDef};
pub use physics::{Aabb, BodyId, PhysicsWorld, RayHit, Shape, category};
pub use robot::{Robot, RobotState};
pub use scoring::calculate_stars;
pub use state::{Fragment, GameEvent, GamePhase, GameState, Owner};
pub use switches::{DoorTouch, OnOff, Placed, Propagation, Registry, SwitchEvent};
pub use tick::{TickInput, tick};
