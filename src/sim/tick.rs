//! Fixed timestep simulation tick
//!
//! Core game loop that advances a level session deterministically.

use glam::Vec2;

use super::physics::{Aabb, ContactEvent, ContactKind, category};
use super::scoring::calculate_stars;
use super::state::{
    FRAGMENT_ANGULAR_DAMPING, FRAGMENT_LINEAR_DAMPING, GameEvent, GamePhase, GameState, Owner,
};
use super::switches::{DoorTouch, SwitchEvent};
use crate::consts::*;

/// What the robot (and its fragments) collide with
pub const ROBOT_SOLIDS: u16 = category::WORLD | category::WALK_ON;

/// Fragment collision box half size
const FRAGMENT_HALF: Vec2 = Vec2::splat(12.0);

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickInput {
    pub left: bool,
    pub right: bool,
    /// Jump button held (jumps trigger on press)
    pub jump: bool,
    /// Pause toggle
    pub pause: bool,
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    state.events.clear();

    // Handle pause toggle
    if input.pause {
        match state.phase {
            GamePhase::Playing => {
                state.phase = GamePhase::Paused;
                state.events.push(GameEvent::Paused);
                return;
            }
            GamePhase::Paused => {
                state.phase = GamePhase::Playing;
                state.events.push(GameEvent::Resumed);
            }
            _ => {}
        }
    }

    match state.phase {
        GamePhase::Paused | GamePhase::Completed { .. } | GamePhase::GameOver => return,
        _ => {}
    }

    state.time_ticks += 1;

    match state.phase {
        GamePhase::Countdown => {
            if state.advance_countdown(dt) {
                state.phase = GamePhase::Playing;
                state.phase_timer = 0.0;
                state.events.push(GameEvent::MusicStart);
                log::info!("Level started");
            }
        }

        GamePhase::Playing => {
            state.total_time += dt;

            if state.robot.shield_percentage() == 0.0 {
                state.explode_robot();
                // close out the removed bodies' contacts
                let contacts = state
                    .world
                    .update_contacts(category::ROBOT | category::FEET);
                for contact in contacts {
                    handle_contact(state, &contact);
                }
                update_scene(state, dt);
                return;
            }

            update_robot(state, input);
            update_scene(state, dt);
            integrate_robot(state, dt);

            let contacts = state
                .world
                .update_contacts(category::ROBOT | category::FEET);
            for contact in contacts {
                handle_contact(state, &contact);
                if matches!(state.phase, GamePhase::Completed { .. }) {
                    return;
                }
            }

            update_lasers(state, dt, true);
        }

        GamePhase::Exploding => {
            update_scene(state, dt);
            update_fragments(state, dt);
            state.phase_timer += dt;
            if state.phase_timer >= EXPLOSION_SECS {
                state.phase = GamePhase::GameOver;
                state.events.push(GameEvent::GameOver);
                log::info!("Game over");
            }
        }

        GamePhase::Paused | GamePhase::Completed { .. } | GamePhase::GameOver => {}
    }
}

/// Input, jump, state machine and periodic damage
fn update_robot(state: &mut GameState, input: &TickInput) {
    let robot = &mut state.robot;
    robot.set_movement(input.left, input.right);

    if robot.jump(input.jump) {
        state.events.push(GameEvent::Jumped {
            double: robot.number_of_jumps() > 1,
        });
    }

    if let Some(new_state) = robot.update_state() {
        state.events.push(GameEvent::RobotStateChanged(new_state));
    }

    if robot.apply_periodic_damage() {
        state.events.push(GameEvent::RobotDamaged {
            amount: robot.periodic_damage(),
            shield: robot.shield(),
        });
    }
}

/// Saws, barrels and lasers that run whether or not the robot is alive
fn update_scene(state: &mut GameState, dt: f32) {
    state.scene_time += dt;
    let t = state.scene_time;

    for saw in &mut state.saws {
        state.world.set_position(saw.body, saw.home + saw.patrol.offset(t));
        saw.rotation = saw.patrol.rotation(t);
    }
    for barrel in &state.barrels {
        state
            .world
            .set_position(barrel.body, barrel.home + barrel.bob.offset(t));
    }

    if state.phase == GamePhase::Exploding {
        update_lasers(state, dt, false);
    }
}

/// Gravity plus swept movement against solids
fn integrate_robot(state: &mut GameState, dt: f32) {
    let robot = &mut state.robot;
    robot.vel.y += GRAVITY * dt;

    let moved = state
        .world
        .move_aabb(robot.bounds(), robot.vel * dt, ROBOT_SOLIDS);
    if moved.blocked_y {
        robot.vel.y = 0.0;
    }
    robot.set_bounds(moved.bounds);

    // Moving platforms may have pushed into the robot
    let push = state.world.depenetrate(robot.bounds(), ROBOT_SOLIDS);
    if push != Vec2::ZERO {
        robot.set_bounds(robot.bounds().translate(push));
        if push.y != 0.0 {
            robot.vel.y = 0.0;
        }
    }

    state.sync_robot_bodies();
}

fn handle_contact(state: &mut GameState, contact: &ContactEvent) {
    if contact.watched_category == category::FEET {
        if contact.other_category & ROBOT_SOLIDS == 0 {
            return;
        }
        match contact.kind {
            ContactKind::Begin => {
                if state.robot.feet_touch_start() {
                    state.events.push(GameEvent::Landed);
                }
            }
            ContactKind::End => state.robot.feet_touch_end(),
        }
        return;
    }

    let Some(owner) = state.owner(contact.other).cloned() else {
        return;
    };

    match (contact.kind, owner) {
        (ContactKind::Begin, Owner::Door { name }) => match state.registry.touch_door(&name) {
            DoorTouch::Opened => state.events.push(GameEvent::DoorOpened { name }),
            DoorTouch::Exit => complete_level(state),
            DoorTouch::Nothing => {}
        },
        (ContactKind::Begin, Owner::Switch { name }) => {
            for event in state.registry.touch_switch(&name) {
                state.events.push(match event {
                    SwitchEvent::On { name } => GameEvent::SwitchOn { name },
                    SwitchEvent::Armed { name } => GameEvent::SwitchArmed { name },
                    SwitchEvent::DoorUnlocked { name } => GameEvent::DoorUnlocked { name },
                });
            }
        }
        (ContactKind::Begin, Owner::Harm { damage, .. } | Owner::Saw { damage, .. }) => {
            if state.robot.start_periodic_damage(damage) {
                state.events.push(GameEvent::RobotDamaged {
                    amount: damage,
                    shield: state.robot.shield(),
                });
            }
        }
        (ContactKind::End, Owner::Harm { damage, .. } | Owner::Saw { damage, .. }) => {
            state.robot.stop_periodic_damage(damage);
        }
        _ => {}
    }
}

fn complete_level(state: &mut GameState) {
    let stars = calculate_stars(
        state.total_time,
        state.time_limit,
        state.robot.shield_percentage(),
    );
    state.phase = GamePhase::Completed { stars };
    state.events.push(GameEvent::LevelCompleted {
        stars,
        time: state.total_time,
    });
    log::info!(
        "Level completed in {:.2}s with {} stars",
        state.total_time,
        stars
    );
}

/// Cast every laser and sweep it; only a live robot takes damage
fn update_lasers(state: &mut GameState, dt: f32, robot_alive: bool) {
    state.beams.clear();
    for laser in &mut state.lasers {
        let beam = laser.update(&state.world, dt);
        if robot_alive && beam.hit_robot() && state.robot.damage_shield(laser.damage) {
            state.events.push(GameEvent::LaserHit {
                laser: laser.name.clone(),
            });
            state.events.push(GameEvent::RobotDamaged {
                amount: laser.damage,
                shield: state.robot.shield(),
            });
        }
        state.beams.push(beam);
    }
}

fn update_fragments(state: &mut GameState, dt: f32) {
    for fragment in &mut state.fragments {
        fragment.vel.y += GRAVITY * dt;
        fragment.vel *= 1.0 / (1.0 + dt * FRAGMENT_LINEAR_DAMPING);
        fragment.angular_vel *= 1.0 / (1.0 + dt * FRAGMENT_ANGULAR_DAMPING);

        let bounds = Aabb::from_center(fragment.pos, FRAGMENT_HALF);
        let moved = state.world.move_aabb(bounds, fragment.vel * dt, ROBOT_SOLIDS);
        if moved.blocked_x {
            fragment.vel.x = 0.0;
        }
        if moved.blocked_y {
            fragment.vel.y = 0.0;
        }
        fragment.pos = moved.bounds.center();
        fragment.angle += fragment.angular_vel * dt;
    }
}
