//! Game state and core simulation types
//!
//! Everything a level session needs lives here, so a session can be
//! serialized and replayed deterministically.

use std::collections::BTreeMap;

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::hazards::{BarrelBob, SawPatrol};
use super::laser::{Laser, LaserBeam};
use super::level::{HarmKind, LevelMap, LevelObject};
use super::physics::{BodyId, PhysicsWorld, Shape, category};
use super::robot::{Robot, RobotState};
use super::switches::{OnOff, Placed, Registry};
use crate::consts::*;
use crate::error::{Error, Result};

/// Thickness of the invisible walls around the map
pub const BOUNDARY_THICKNESS: f32 = 100.0;
/// Fragment spin range (rad/s), sign picked at random
pub const FRAGMENT_SPIN: (f32, f32) = (2.5, 4.5);
pub const FRAGMENT_LINEAR_DAMPING: f32 = 0.5;
/// Where each fragment starts, in robot half-sizes from the body centre:
/// head, left and right arm, left and right leg, torso
pub const FRAGMENT_LAYOUT: [Vec2; ROBOT_FRAGMENTS] = [
    Vec2::new(0.0, 0.6),
    Vec2::new(-0.5, 0.0),
    Vec2::new(0.5, 0.0),
    Vec2::new(-0.5, -0.5),
    Vec2::new(0.5, -0.5),
    Vec2::new(0.0, 0.0),
];
pub const FRAGMENT_ANGULAR_DAMPING: f32 = 0.25;

/// Current phase of a level session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// 3, 2, 1, 0, GO before play starts
    Countdown,
    /// Active gameplay
    Playing,
    /// Game is paused
    Paused,
    /// Robot blew up, fragments flying
    Exploding,
    /// Robot went through the open exit door
    Completed { stars: u8 },
    /// Run ended after the explosion
    GameOver,
}

/// Cues for a host to play sounds, animations and update the HUD
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Countdown number, -1 for GO
    Countdown(i8),
    /// Countdown done, level music starts
    MusicStart,
    Paused,
    Resumed,
    Jumped { double: bool },
    Landed,
    RobotStateChanged(RobotState),
    SwitchOn { name: String },
    SwitchArmed { name: String },
    DoorUnlocked { name: String },
    DoorOpened { name: String },
    RobotDamaged { amount: u32, shield: u32 },
    LaserHit { laser: String },
    RobotDestroyed,
    LevelCompleted { stars: u8, time: f32 },
    GameOver,
}

/// What a physics body belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Owner {
    Boundary,
    Solid,
    Robot,
    Feet,
    Harm { kind: HarmKind, damage: u32 },
    Saw { index: usize, damage: u32 },
    Switch { name: String },
    Door { name: String },
    Barrel { index: usize },
    Box { name: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Saw {
    pub name: String,
    pub body: BodyId,
    pub home: Vec2,
    pub patrol: SawPatrol,
    /// Spin in degrees (cosmetic)
    pub rotation: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Barrel {
    pub name: String,
    pub body: BodyId,
    pub home: Vec2,
    pub bob: BarrelBob,
}

/// A piece of the robot after it blew up
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fragment {
    pub pos: Vec2,
    pub vel: Vec2,
    pub angle: f32,
    pub angular_vel: f32,
}

/// RNG state wrapper for serialization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
    pub stream: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed, stream: 0 }
    }

    /// Fresh generator on the next stream, so every draw sequence is reproducible
    pub fn next_rng(&mut self) -> Pcg32 {
        let rng = Pcg32::new(self.seed, self.stream);
        self.stream += 1;
        rng
    }
}

/// Complete level session (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub seed: u64,
    pub rng_state: RngState,
    pub phase: GamePhase,
    /// Seconds spent in the current timed phase (countdown, explosion)
    pub phase_timer: f32,
    /// Next countdown cue to emit
    countdown_cue: i8,
    /// Level clock, only runs while playing
    pub total_time: f32,
    /// Clock driving saws and barrels (keeps running through the explosion)
    pub scene_time: f32,
    /// Seconds allowed for the 2-star rating
    pub time_limit: u32,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub world: PhysicsWorld,
    pub robot: Robot,
    pub robot_body: Option<BodyId>,
    pub feet_body: Option<BodyId>,
    pub lasers: Vec<Laser>,
    pub saws: Vec<Saw>,
    pub barrels: Vec<Barrel>,
    pub registry: Registry,
    pub owners: BTreeMap<BodyId, Owner>,
    pub fragments: Vec<Fragment>,
    /// Beams cast this tick, one per laser
    #[serde(skip)]
    pub beams: Vec<LaserBeam>,
    /// Cues raised during the last tick
    #[serde(skip)]
    pub events: Vec<GameEvent>,
}

fn boundary_walls(width: f32, height: f32) -> [(Vec2, Vec2); 4] {
    let t = BOUNDARY_THICKNESS;
    let half_t = t / 2.0;
    [
        // floor, ceiling
        (Vec2::new(width / 2.0, -half_t), Vec2::new(width / 2.0 + t, half_t)),
        (Vec2::new(width / 2.0, height + half_t), Vec2::new(width / 2.0 + t, half_t)),
        // left, right
        (Vec2::new(-half_t, height / 2.0), Vec2::new(half_t, height / 2.0 + t)),
        (Vec2::new(width + half_t, height / 2.0), Vec2::new(half_t, height / 2.0 + t)),
    ]
}

impl GameState {
    /// Build a session from a map. The session starts with the countdown.
    pub fn from_level(map: &LevelMap, time_limit: u32, seed: u64) -> Result<Self> {
        map.validate()?;
        let (spawn, shield) = map.robot().ok_or(Error::MissingRobot)?;

        let mut world = PhysicsWorld::new();
        let mut owners = BTreeMap::new();
        let mut registry = Registry::new(map.propagation);
        let mut lasers = Vec::new();
        let mut saws = Vec::new();
        let mut barrels = Vec::new();

        for (center, half) in boundary_walls(map.width, map.height) {
            let id = world.add_body(category::WORLD, center, Shape::Aabb { half }, false);
            owners.insert(id, Owner::Boundary);
        }

        for solid in &map.solids {
            let bounds = solid.aabb();
            let id = world.add_body(
                category::WORLD,
                bounds.center(),
                Shape::Aabb { half: bounds.half() },
                false,
            );
            owners.insert(id, Owner::Solid);
        }

        for tile in &map.harm_tiles {
            let bounds = tile.rect.aabb();
            let cat = match tile.kind {
                HarmKind::Spikes => category::SPIKES,
                HarmKind::Acid => category::ACID,
            };
            let id = world.add_body(cat, bounds.center(), Shape::Aabb { half: bounds.half() }, false);
            owners.insert(
                id,
                Owner::Harm {
                    kind: tile.kind,
                    damage: tile.damage,
                },
            );
        }

        for object in &map.objects {
            match object {
                LevelObject::Robot { .. } | LevelObject::Light { .. } => {}
                LevelObject::Laser {
                    name,
                    x,
                    y,
                    rotation,
                    rotation_angle,
                    damage,
                    speed,
                } => {
                    registry.insert(name.clone(), Placed::Laser)?;
                    lasers.push(Laser::new(
                        name.clone(),
                        Vec2::new(*x, *y),
                        *rotation,
                        *rotation_angle,
                        *speed,
                        *damage,
                    ));
                }
                LevelObject::Switch {
                    name,
                    rect,
                    target,
                    activated,
                } => {
                    registry.insert(
                        name.clone(),
                        Placed::Switch {
                            state: OnOff::new(*activated),
                            target: target.clone(),
                        },
                    )?;
                    let bounds = rect.aabb();
                    let id = world.add_body(
                        category::SWITCHES,
                        bounds.center(),
                        Shape::Aabb { half: bounds.half() },
                        true,
                    );
                    owners.insert(id, Owner::Switch { name: name.clone() });
                }
                LevelObject::Door { name, rect } => {
                    registry.insert(
                        name.clone(),
                        Placed::Door {
                            state: OnOff::default(),
                        },
                    )?;
                    let bounds = rect.aabb();
                    let id = world.add_body(
                        category::DOOR,
                        bounds.center(),
                        Shape::Aabb { half: bounds.half() },
                        true,
                    );
                    owners.insert(id, Owner::Door { name: name.clone() });
                }
                LevelObject::Barrel { name, rect } => {
                    registry.insert(name.clone(), Placed::Barrel)?;
                    let bounds = rect.aabb();
                    let id = world.add_body(
                        category::BARREL,
                        bounds.center(),
                        Shape::Aabb { half: bounds.half() },
                        false,
                    );
                    let index = barrels.len();
                    owners.insert(id, Owner::Barrel { index });
                    barrels.push(Barrel {
                        name: name.clone(),
                        body: id,
                        home: bounds.center(),
                        bob: BarrelBob::new(index as u32 + 1),
                    });
                }
                LevelObject::Saw {
                    name,
                    x,
                    y,
                    radius,
                    damage,
                    movement,
                    movement_time,
                    stop_time,
                    rotation_time,
                } => {
                    registry.insert(name.clone(), Placed::Saw)?;
                    let home = Vec2::new(*x, *y);
                    let id = world.add_body(category::SAW, home, Shape::Circle { radius: *radius }, false);
                    let index = saws.len();
                    owners.insert(
                        id,
                        Owner::Saw {
                            index,
                            damage: *damage,
                        },
                    );
                    saws.push(Saw {
                        name: name.clone(),
                        body: id,
                        home,
                        patrol: SawPatrol {
                            movement: *movement,
                            movement_time: *movement_time,
                            stop_time: *stop_time,
                            rotation_time: *rotation_time,
                        },
                        rotation: 0.0,
                    });
                }
                LevelObject::Box { name, rect } => {
                    registry.insert(name.clone(), Placed::Box)?;
                    let bounds = rect.aabb();
                    let id = world.add_body(
                        category::BOX,
                        bounds.center(),
                        Shape::Aabb { half: bounds.half() },
                        false,
                    );
                    owners.insert(id, Owner::Box { name: name.clone() });
                }
            }
        }

        let robot = Robot::new(spawn, shield);
        let robot_body = world.add_body(
            category::ROBOT,
            robot.body_center(),
            Shape::Aabb {
                half: ROBOT_SIZE / 2.0,
            },
            false,
        );
        owners.insert(robot_body, Owner::Robot);
        let feet_body = world.add_body(
            category::FEET,
            robot.feet_center(),
            Shape::Aabb {
                half: Robot::feet_half(),
            },
            true,
        );
        owners.insert(feet_body, Owner::Feet);

        log::info!(
            "Level session created: {} lasers, {} saws, {} barrels, {} named objects",
            lasers.len(),
            saws.len(),
            barrels.len(),
            registry.len()
        );

        Ok(Self {
            seed,
            rng_state: RngState::new(seed),
            phase: GamePhase::Countdown,
            phase_timer: 0.0,
            countdown_cue: 3,
            total_time: 0.0,
            scene_time: 0.0,
            time_limit,
            time_ticks: 0,
            world,
            robot,
            robot_body: Some(robot_body),
            feet_body: Some(feet_body),
            lasers,
            saws,
            barrels,
            registry,
            owners,
            fragments: Vec::new(),
            beams: Vec::new(),
            events: Vec::new(),
        })
    }

    /// Skip the countdown (tests, replays)
    pub fn start_now(&mut self) {
        if self.phase == GamePhase::Countdown {
            self.phase = GamePhase::Playing;
            self.phase_timer = 0.0;
            self.countdown_cue = -2;
        }
    }

    pub fn owner(&self, body: BodyId) -> Option<&Owner> {
        self.owners.get(&body)
    }

    /// Emit every countdown cue whose time has come; true once the countdown is over
    pub(crate) fn advance_countdown(&mut self, dt: f32) -> bool {
        // Cue n fires at (3 - n) seconds, GO (-1) at 4
        while self.countdown_cue >= -1 && self.phase_timer >= f32::from(3 - self.countdown_cue) {
            self.events.push(GameEvent::Countdown(self.countdown_cue));
            self.countdown_cue -= 1;
        }
        self.phase_timer += dt;
        self.phase_timer >= COUNTDOWN_SECS
    }

    /// Put the robot and its feet sensor where the robot is
    pub(crate) fn sync_robot_bodies(&mut self) {
        if let Some(id) = self.robot_body {
            self.world.set_position(id, self.robot.body_center());
        }
        if let Some(id) = self.feet_body {
            self.world.set_position(id, self.robot.feet_center());
        }
    }

    /// Shield ran out: scatter fragments, drop the robot from the world
    pub(crate) fn explode_robot(&mut self) {
        let mut rng = self.rng_state.next_rng();
        let center = self.robot.body_center();
        let half = ROBOT_SIZE / 2.0;
        self.fragments = FRAGMENT_LAYOUT
            .iter()
            .map(|offset| {
                let spin = rng.random_range(FRAGMENT_SPIN.0..=FRAGMENT_SPIN.1);
                let sign = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
                Fragment {
                    pos: center + *offset * half,
                    vel: self.robot.vel,
                    angle: 0.0,
                    angular_vel: spin * sign,
                }
            })
            .collect();

        for id in [self.robot_body.take(), self.feet_body.take()]
            .into_iter()
            .flatten()
        {
            self.world.remove_body(id);
            self.owners.remove(&id);
        }

        self.phase = GamePhase::Exploding;
        self.phase_timer = 0.0;
        self.events.push(GameEvent::RobotDestroyed);
        log::info!("Robot destroyed after {:.2}s", self.total_time);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::tick::{TickInput, tick};

    const MAP: &str = r#"{
        "width": 2000, "height": 1000,
        "solids": [ { "x": 0, "y": 0, "width": 2000, "height": 64 } ],
        "objects": [
            { "type": "robot", "x": 200, "y": 64, "shield": 100 },
            { "type": "switch", "name": "lever", "x": 600, "y": 64, "width": 64, "height": 64, "target": "exit", "activated": true },
            { "type": "door", "name": "exit", "x": 1800, "y": 64, "width": 140, "height": 200 },
            { "type": "barrel", "name": "barrel1", "x": 1000, "y": 64, "width": 80, "height": 100 },
            { "type": "barrel", "name": "barrel2", "x": 1200, "y": 64, "width": 80, "height": 100 }
        ]
    }"#;

    fn session() -> GameState {
        let map = LevelMap::from_json(MAP).unwrap();
        GameState::from_level(&map, 60, 7).unwrap()
    }

    #[test]
    fn test_session_from_level() {
        let state = session();
        assert_eq!(state.phase, GamePhase::Countdown);
        assert_eq!(state.registry.len(), 4);
        assert_eq!(state.barrels[1].bob.gap, 20.0);

        let robot = state.robot_body.unwrap();
        assert_eq!(state.owner(robot), Some(&Owner::Robot));
        let body = state.world.body(robot).unwrap();
        assert_eq!(body.pos, Vec2::new(200.0, 164.0));
    }

    #[test]
    fn test_boundary_walls_stop_rays() {
        let state = session();
        let hit = state
            .world
            .ray_cast(Vec2::new(100.0, 500.0), Vec2::new(-5000.0, 500.0), category::ALL)
            .unwrap();
        assert_eq!(state.owner(hit.body), Some(&Owner::Boundary));
        assert!((hit.point.x - 0.0).abs() < 0.01);
    }

    #[test]
    fn test_explosion_is_seeded() {
        let mut a = session();
        let mut b = session();
        a.explode_robot();
        b.explode_robot();

        assert_eq!(a.phase, GamePhase::Exploding);
        assert_eq!(a.fragments.len(), ROBOT_FRAGMENTS);
        assert!(a.robot_body.is_none());
        let center = a.robot.body_center();
        assert_eq!(a.fragments[5].pos, center);
        assert!(a.fragments[0].pos.y > center.y);
        assert!(a.fragments[1].pos.x < center.x && a.fragments[2].pos.x > center.x);
        assert!(a.fragments[3].pos.y < center.y && a.fragments[4].pos.y < center.y);
        for (fa, fb) in a.fragments.iter().zip(&b.fragments) {
            assert_eq!(fa.pos, fb.pos);
            assert_eq!(fa.angular_vel, fb.angular_vel);
            let spin = fa.angular_vel.abs();
            assert!((FRAGMENT_SPIN.0..=FRAGMENT_SPIN.1).contains(&spin));
        }
    }

    #[test]
    fn test_state_serializes() {
        let state = session();
        let json = serde_json::to_string(&state).unwrap();
        let back: GameState = serde_json::from_str(&json).unwrap();
        assert_eq!(back.registry.len(), state.registry.len());
        assert_eq!(back.robot.pos, state.robot.pos);
    }

    #[test]
    fn test_reloaded_session_keeps_contacts() {
        let idle = TickInput::default();
        let mut state = session();
        state.start_now();
        for _ in 0..5 {
            tick(&mut state, &idle, SIM_DT);
        }
        assert_eq!(state.robot.feet_touching(), 1);

        let json = serde_json::to_string(&state).unwrap();
        let mut back: GameState = serde_json::from_str(&json).unwrap();
        for _ in 0..5 {
            tick(&mut back, &idle, SIM_DT);
        }
        assert_eq!(back.robot.feet_touching(), 1);

        let jump = TickInput {
            jump: true,
            ..Default::default()
        };
        tick(&mut back, &jump, SIM_DT);
        for _ in 0..10 {
            tick(&mut back, &idle, SIM_DT);
        }
        assert!(back.robot.pos.y > 200.0);
        assert_eq!(back.robot.feet_touching(), 0);
    }
}
