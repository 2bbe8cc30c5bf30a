//! Minimal 2D physics world
//!
//! Just enough physics for a tile platformer: axis-aligned boxes and circles,
//! category bitmasks, nearest-hit ray casts, swept box movement against solids,
//! and contact begin/end events derived from touching pairs.

use std::collections::BTreeSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::CONTACT_SLOP;

/// Collision categories (bitmask)
pub mod category {
    pub const WORLD: u16 = 1;
    pub const ROBOT: u16 = 2;
    pub const SPIKES: u16 = 4;
    pub const SAW: u16 = 8;
    pub const ACID: u16 = 16;
    pub const DOOR: u16 = 32;
    pub const SWITCHES: u16 = 64;
    pub const BLOCKS: u16 = 128;
    pub const BARREL: u16 = 256;
    pub const BOX: u16 = 512;
    pub const FEET: u16 = 1024;

    /// Everything that hurts the robot on contact
    pub const HARM: u16 = SPIKES | ACID | SAW;
    /// Everything the robot can stand on (besides the world itself)
    pub const WALK_ON: u16 = HARM | BLOCKS | BARREL | BOX;
    pub const ALL: u16 = u16::MAX;
}

pub type BodyId = u32;

/// Penetration shallower than this counts as merely touching when sweeping
const SKIN: f32 = 1e-3;

/// Axis-aligned box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn from_center(center: Vec2, half: Vec2) -> Self {
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn from_min_size(min: Vec2, size: Vec2) -> Self {
        Self { min, max: min + size }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    #[inline]
    pub fn half(&self) -> Vec2 {
        (self.max - self.min) * 0.5
    }

    pub fn translate(&self, delta: Vec2) -> Self {
        Self {
            min: self.min + delta,
            max: self.max + delta,
        }
    }

    /// Overlap test; a positive `slop` also accepts boxes that are merely close
    pub fn overlaps(&self, other: &Aabb, slop: f32) -> bool {
        self.min.x < other.max.x + slop
            && self.max.x > other.min.x - slop
            && self.min.y < other.max.y + slop
            && self.max.y > other.min.y - slop
    }

    pub fn contains_point(&self, p: Vec2) -> bool {
        p.x > self.min.x && p.x < self.max.x && p.y > self.min.y && p.y < self.max.y
    }

    pub fn closest_point(&self, p: Vec2) -> Vec2 {
        p.clamp(self.min, self.max)
    }

    /// Smallest translation that moves `self` out of `other` (None if not overlapping)
    pub fn push_out_of(&self, other: &Aabb) -> Option<Vec2> {
        if !self.overlaps(other, 0.0) {
            return None;
        }
        let candidates = [
            Vec2::new(other.max.x - self.min.x, 0.0),
            Vec2::new(other.min.x - self.max.x, 0.0),
            Vec2::new(0.0, other.max.y - self.min.y),
            Vec2::new(0.0, other.min.y - self.max.y),
        ];
        candidates
            .into_iter()
            .min_by(|a, b| a.length_squared().total_cmp(&b.length_squared()))
    }

    /// Slab test along `origin + t * delta`, t in [0, 1]
    pub fn ray_fraction(&self, origin: Vec2, delta: Vec2) -> Option<f32> {
        let mut t_min = 0.0_f32;
        let mut t_max = 1.0_f32;

        for axis in 0..2 {
            let o = origin[axis];
            let d = delta[axis];
            let lo = self.min[axis];
            let hi = self.max[axis];

            if d.abs() < f32::EPSILON {
                if o < lo || o > hi {
                    return None;
                }
            } else {
                let inv = 1.0 / d;
                let mut t1 = (lo - o) * inv;
                let mut t2 = (hi - o) * inv;
                if t1 > t2 {
                    std::mem::swap(&mut t1, &mut t2);
                }
                t_min = t_min.max(t1);
                t_max = t_max.min(t2);
                if t_min > t_max {
                    return None;
                }
            }
        }

        Some(t_min)
    }
}

/// Ray against a circle; None when missing or when the origin is inside
pub fn ray_circle_fraction(center: Vec2, radius: f32, origin: Vec2, delta: Vec2) -> Option<f32> {
    let f = origin - center;
    let a = delta.length_squared();
    let c = f.length_squared() - radius * radius;
    if a < f32::EPSILON || c <= 0.0 {
        return None;
    }
    let b = 2.0 * f.dot(delta);
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return None;
    }
    let t = (-b - disc.sqrt()) / (2.0 * a);
    (0.0..=1.0).contains(&t).then_some(t)
}

/// Collision geometry, positioned by the owning body's centre
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Aabb { half: Vec2 },
    Circle { radius: f32 },
}

impl Shape {
    pub fn bounds(&self, pos: Vec2) -> Aabb {
        match *self {
            Shape::Aabb { half } => Aabb::from_center(pos, half),
            Shape::Circle { radius } => Aabb::from_center(pos, Vec2::splat(radius)),
        }
    }

    /// Shapes that contain the ray origin are not reported
    pub fn ray_fraction(&self, pos: Vec2, origin: Vec2, delta: Vec2) -> Option<f32> {
        match *self {
            Shape::Aabb { half } => {
                let bounds = Aabb::from_center(pos, half);
                if bounds.contains_point(origin) {
                    return None;
                }
                bounds.ray_fraction(origin, delta)
            }
            Shape::Circle { radius } => ray_circle_fraction(pos, radius, origin, delta),
        }
    }

    pub fn touches(&self, pos: Vec2, other: &Shape, other_pos: Vec2, slop: f32) -> bool {
        match (*self, *other) {
            (Shape::Aabb { half: a }, Shape::Aabb { half: b }) => {
                Aabb::from_center(pos, a).overlaps(&Aabb::from_center(other_pos, b), slop)
            }
            (Shape::Circle { radius }, Shape::Aabb { half }) => {
                circle_touches_box(pos, radius, &Aabb::from_center(other_pos, half), slop)
            }
            (Shape::Aabb { half }, Shape::Circle { radius }) => {
                circle_touches_box(other_pos, radius, &Aabb::from_center(pos, half), slop)
            }
            (Shape::Circle { radius: ra }, Shape::Circle { radius: rb }) => {
                pos.distance(other_pos) <= ra + rb + slop
            }
        }
    }
}

fn circle_touches_box(center: Vec2, radius: f32, bounds: &Aabb, slop: f32) -> bool {
    center.distance(bounds.closest_point(center)) <= radius + slop
}

/// A body in the world
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    pub id: BodyId,
    pub category: u16,
    /// Centre of the shape
    pub pos: Vec2,
    pub shape: Shape,
    /// Sensors report contacts but never block movement
    pub sensor: bool,
}

impl Body {
    pub fn bounds(&self) -> Aabb {
        self.shape.bounds(self.pos)
    }
}

/// Nearest ray cast result
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub body: BodyId,
    pub category: u16,
    pub point: Vec2,
    /// Fraction along the cast segment (0 = origin, 1 = end)
    pub fraction: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContactKind {
    Begin,
    End,
}

/// A watched body started or stopped touching another body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactEvent {
    pub kind: ContactKind,
    pub watched: BodyId,
    pub watched_category: u16,
    pub other: BodyId,
    pub other_category: u16,
}

/// Result of moving a box through the world
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveResult {
    pub bounds: Aabb,
    pub blocked_x: bool,
    pub blocked_y: bool,
}

/// All bodies plus the set of currently touching pairs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysicsWorld {
    /// Sorted by id for deterministic iteration
    bodies: Vec<Body>,
    next_id: BodyId,
    /// (watched, other) pairs touching after the last `update_contacts`
    #[serde(default)]
    touching: BTreeSet<(BodyId, BodyId)>,
    /// Ends for pairs whose body was removed, reported by the next `update_contacts`
    #[serde(default)]
    ended: Vec<ContactEvent>,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorld {
    pub fn new() -> Self {
        Self {
            bodies: Vec::new(),
            next_id: 1,
            touching: BTreeSet::new(),
            ended: Vec::new(),
        }
    }

    pub fn add_body(&mut self, category: u16, pos: Vec2, shape: Shape, sensor: bool) -> BodyId {
        let id = self.next_id;
        self.next_id += 1;
        self.bodies.push(Body {
            id,
            category,
            pos,
            shape,
            sensor,
        });
        id
    }

    /// Remove a body. Its touching pairs end with the next `update_contacts`.
    pub fn remove_body(&mut self, id: BodyId) -> Option<Body> {
        let idx = self.index_of(id)?;
        let pairs: Vec<_> = self
            .touching
            .iter()
            .copied()
            .filter(|&(a, b)| a == id || b == id)
            .collect();
        for (w, o) in pairs {
            if let Some(event) = self.contact_event(ContactKind::End, w, o) {
                self.ended.push(event);
            }
            self.touching.remove(&(w, o));
        }
        Some(self.bodies.remove(idx))
    }

    fn index_of(&self, id: BodyId) -> Option<usize> {
        self.bodies.binary_search_by_key(&id, |b| b.id).ok()
    }

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.index_of(id).map(|i| &self.bodies[i])
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn set_position(&mut self, id: BodyId, pos: Vec2) {
        if let Some(i) = self.index_of(id) {
            self.bodies[i].pos = pos;
        }
    }

    /// Nearest body hit by the segment `origin..end` whose category intersects `mask`
    pub fn ray_cast(&self, origin: Vec2, end: Vec2, mask: u16) -> Option<RayHit> {
        let delta = end - origin;
        self.bodies
            .iter()
            .filter(|b| b.category & mask != 0)
            .filter_map(|b| {
                b.shape
                    .ray_fraction(b.pos, origin, delta)
                    .map(|fraction| RayHit {
                        body: b.id,
                        category: b.category,
                        point: origin + delta * fraction,
                        fraction,
                    })
            })
            .min_by(|a, b| a.fraction.total_cmp(&b.fraction))
    }

    fn solids(&self, mask: u16) -> impl Iterator<Item = (BodyId, Aabb)> + '_ {
        self.bodies
            .iter()
            .filter(move |b| !b.sensor && b.category & mask != 0)
            .map(|b| (b.id, b.bounds()))
    }

    /// Move a box by `delta`, one axis at a time, stopping flush against solids in `mask`.
    ///
    /// Solids the box already overlaps are skipped; `depenetrate` deals with those.
    pub fn move_aabb(&self, bounds: Aabb, delta: Vec2, mask: u16) -> MoveResult {
        self.sweep(bounds, delta, mask, None)
    }

    fn sweep(&self, bounds: Aabb, delta: Vec2, mask: u16, skip: Option<BodyId>) -> MoveResult {
        let mut result = MoveResult {
            bounds,
            blocked_x: false,
            blocked_y: false,
        };
        let size = bounds.max - bounds.min;

        if delta.x != 0.0 {
            let start = result.bounds;
            let mut moved = start.translate(Vec2::new(delta.x, 0.0));
            for (id, solid) in self.solids(mask) {
                if Some(id) == skip
                    || start.overlaps(&solid, -SKIN)
                    || !moved.overlaps(&solid, -SKIN)
                {
                    continue;
                }
                if delta.x > 0.0 {
                    moved.max.x = solid.min.x;
                    moved.min.x = solid.min.x - size.x;
                } else {
                    moved.min.x = solid.max.x;
                    moved.max.x = solid.max.x + size.x;
                }
                result.blocked_x = true;
            }
            result.bounds = moved;
        }

        if delta.y != 0.0 {
            let start = result.bounds;
            let mut moved = start.translate(Vec2::new(0.0, delta.y));
            for (id, solid) in self.solids(mask) {
                if Some(id) == skip
                    || start.overlaps(&solid, -SKIN)
                    || !moved.overlaps(&solid, -SKIN)
                {
                    continue;
                }
                if delta.y > 0.0 {
                    moved.max.y = solid.min.y;
                    moved.min.y = solid.min.y - size.y;
                } else {
                    moved.min.y = solid.max.y;
                    moved.max.y = solid.max.y + size.y;
                }
                result.blocked_y = true;
            }
            result.bounds = moved;
        }

        result
    }

    /// Translation that pushes a box out of every overlapping solid (moving platforms).
    ///
    /// Each push is swept against the other solids, so a box squeezed between a
    /// moving body and a wall stops at the wall and stays overlapped.
    pub fn depenetrate(&self, bounds: Aabb, mask: u16) -> Vec2 {
        let mut current = bounds;
        for (id, solid) in self.solids(mask) {
            if let Some(push) = current.push_out_of(&solid) {
                current = self.sweep(current, push, mask, Some(id)).bounds;
            }
        }
        current.min - bounds.min
    }

    /// Recompute touching pairs for bodies in `watch_mask` and report the changes.
    ///
    /// Ends, including those queued by `remove_body`, are reported before begins.
    pub fn update_contacts(&mut self, watch_mask: u16) -> Vec<ContactEvent> {
        let mut now = BTreeSet::new();
        for watched in self.bodies.iter().filter(|b| b.category & watch_mask != 0) {
            for other in self.bodies.iter() {
                if other.category & watch_mask != 0 {
                    continue;
                }
                if watched
                    .shape
                    .touches(watched.pos, &other.shape, other.pos, CONTACT_SLOP)
                {
                    now.insert((watched.id, other.id));
                }
            }
        }

        let mut events = std::mem::take(&mut self.ended);
        for &(w, o) in self.touching.difference(&now) {
            if let Some(event) = self.contact_event(ContactKind::End, w, o) {
                events.push(event);
            }
        }
        for &(w, o) in now.difference(&self.touching) {
            if let Some(event) = self.contact_event(ContactKind::Begin, w, o) {
                events.push(event);
            }
        }

        self.touching = now;
        events
    }

    fn contact_event(&self, kind: ContactKind, watched: BodyId, other: BodyId) -> Option<ContactEvent> {
        let w = self.body(watched)?;
        let o = self.body(other)?;
        Some(ContactEvent {
            kind,
            watched,
            watched_category: w.category,
            other,
            other_category: o.category,
        })
    }
}
