//! Level map format
//!
//! Maps are JSON. Coordinates are world units with y pointing up; rectangles
//! are given by their bottom-left corner.
//!
//! ```json
//! {
//!   "width": 4000, "height": 1200,
//!   "propagation": "arm",
//!   "solids": [ { "x": 0, "y": 0, "width": 4000, "height": 64 } ],
//!   "harm_tiles": [ { "x": 900, "y": 64, "width": 128, "height": 32, "damage": 5, "kind": "spikes" } ],
//!   "objects": [
//!     { "type": "robot", "x": 200, "y": 64, "shield": 100 },
//!     { "type": "laser", "name": "laser1", "x": 1500, "y": 1100, "rotation": 150, "rotation_angle": 60, "damage": 2 }
//!   ]
//! }
//! ```

use std::collections::BTreeSet;
use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::physics::Aabb;
use super::switches::Propagation;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RectDef {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl RectDef {
    pub fn aabb(&self) -> Aabb {
        Aabb::from_min_size(Vec2::new(self.x, self.y), Vec2::new(self.width, self.height))
    }

    fn is_valid(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HarmKind {
    Spikes,
    Acid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarmTile {
    #[serde(flatten)]
    pub rect: RectDef,
    pub damage: u32,
    pub kind: HarmKind,
}

fn default_speed() -> f32 {
    1.0
}

fn default_rotation_time() -> f32 {
    1.0
}

/// Placed object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LevelObject {
    /// Spawn point (bottom-centre of the robot)
    Robot { x: f32, y: f32, shield: u32 },
    Laser {
        name: String,
        x: f32,
        y: f32,
        #[serde(default)]
        rotation: f32,
        #[serde(default)]
        rotation_angle: f32,
        damage: u32,
        #[serde(default = "default_speed")]
        speed: f32,
    },
    Switch {
        name: String,
        #[serde(flatten)]
        rect: RectDef,
        target: String,
        #[serde(default)]
        activated: bool,
    },
    Door {
        name: String,
        #[serde(flatten)]
        rect: RectDef,
    },
    Barrel {
        name: String,
        #[serde(flatten)]
        rect: RectDef,
    },
    /// Saw centre and patrol
    Saw {
        name: String,
        x: f32,
        y: f32,
        radius: f32,
        damage: u32,
        movement: f32,
        movement_time: f32,
        stop_time: f32,
        #[serde(default = "default_rotation_time")]
        rotation_time: f32,
    },
    Box {
        name: String,
        #[serde(flatten)]
        rect: RectDef,
    },
    /// Decoration only
    Light {
        #[serde(flatten)]
        rect: RectDef,
    },
}

impl LevelObject {
    pub fn name(&self) -> Option<&str> {
        match self {
            LevelObject::Laser { name, .. }
            | LevelObject::Switch { name, .. }
            | LevelObject::Door { name, .. }
            | LevelObject::Barrel { name, .. }
            | LevelObject::Saw { name, .. }
            | LevelObject::Box { name, .. } => Some(name),
            LevelObject::Robot { .. } | LevelObject::Light { .. } => None,
        }
    }

    fn has_valid_size(&self) -> bool {
        match self {
            LevelObject::Switch { rect, .. }
            | LevelObject::Door { rect, .. }
            | LevelObject::Barrel { rect, .. }
            | LevelObject::Box { rect, .. } => rect.is_valid(),
            LevelObject::Saw { radius, .. } => *radius > 0.0,
            LevelObject::Robot { .. } | LevelObject::Laser { .. } | LevelObject::Light { .. } => {
                true
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelMap {
    pub width: f32,
    pub height: f32,
    #[serde(default)]
    pub propagation: Propagation,
    #[serde(default)]
    pub solids: Vec<RectDef>,
    #[serde(default)]
    pub harm_tiles: Vec<HarmTile>,
    #[serde(default)]
    pub objects: Vec<LevelObject>,
}

impl LevelMap {
    pub fn from_json(json: &str) -> Result<Self> {
        let map: LevelMap =
            serde_json::from_str(json).map_err(|e| Error::json("level map", e))?;
        map.validate()?;
        Ok(map)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let map = Self::from_json(&json)?;
        log::info!(
            "Loaded map {} ({} objects)",
            path.display(),
            map.objects.len()
        );
        Ok(map)
    }

    /// Exactly one robot, unique names, positive sizes
    pub fn validate(&self) -> Result<()> {
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(Error::InvalidSize {
                name: "map".to_string(),
            });
        }
        if let Some(i) = self.solids.iter().position(|r| !r.is_valid()) {
            return Err(Error::InvalidSize {
                name: format!("solid #{i}"),
            });
        }
        if let Some(i) = self.harm_tiles.iter().position(|h| !h.rect.is_valid()) {
            return Err(Error::InvalidSize {
                name: format!("harm tile #{i}"),
            });
        }

        let mut robots = 0;
        let mut names = BTreeSet::new();
        for (i, object) in self.objects.iter().enumerate() {
            if let LevelObject::Robot { shield, .. } = object {
                robots += 1;
                if *shield == 0 {
                    return Err(Error::InvalidShield);
                }
            }
            if let LevelObject::Laser { name, speed, .. } = object {
                if !speed.is_finite() || *speed <= 0.0 {
                    return Err(Error::InvalidLaserSpeed { name: name.clone() });
                }
            }
            if let Some(name) = object.name() {
                if !names.insert(name) {
                    return Err(Error::DuplicateName {
                        name: name.to_string(),
                    });
                }
            }
            if !object.has_valid_size() {
                return Err(Error::InvalidSize {
                    name: object
                        .name()
                        .map_or_else(|| format!("object #{i}"), str::to_string),
                });
            }
        }

        match robots {
            0 => Err(Error::MissingRobot),
            1 => Ok(()),
            _ => Err(Error::DuplicateRobot),
        }
    }

    /// The robot spawn point and shield
    pub fn robot(&self) -> Option<(Vec2, u32)> {
        self.objects.iter().find_map(|o| match o {
            LevelObject::Robot { x, y, shield } => Some((Vec2::new(*x, *y), *shield)),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAP: &str = r#"{
        "width": 2000, "height": 1000,
        "solids": [ { "x": 0, "y": 0, "width": 2000, "height": 64 } ],
        "harm_tiles": [ { "x": 900, "y": 64, "width": 128, "height": 32, "damage": 5, "kind": "acid" } ],
        "objects": [
            { "type": "robot", "x": 200, "y": 64, "shield": 100 },
            { "type": "laser", "name": "laser1", "x": 1500, "y": 900, "rotation": 150, "rotation_angle": 60, "damage": 2 },
            { "type": "switch", "name": "lever", "x": 600, "y": 64, "width": 64, "height": 64, "target": "exit", "activated": true },
            { "type": "door", "name": "exit", "x": 1800, "y": 64, "width": 140, "height": 200 },
            { "type": "saw", "name": "saw1", "x": 1200, "y": 120, "radius": 50, "damage": 10, "movement": 200, "movement_time": 2, "stop_time": 1 },
            { "type": "light", "x": 0, "y": 900, "width": 10, "height": 10 }
        ]
    }"#;

    #[test]
    fn test_parse_map() {
        let map = LevelMap::from_json(MAP).unwrap();
        assert_eq!(map.propagation, Propagation::Arm);
        assert_eq!(map.objects.len(), 6);
        assert_eq!(map.harm_tiles[0].kind, HarmKind::Acid);
        assert_eq!(map.robot(), Some((Vec2::new(200.0, 64.0), 100)));

        match &map.objects[1] {
            LevelObject::Laser { speed, .. } => assert_eq!(*speed, 1.0),
            other => panic!("expected laser, got {other:?}"),
        }
        match &map.objects[4] {
            LevelObject::Saw { rotation_time, .. } => assert_eq!(*rotation_time, 1.0),
            other => panic!("expected saw, got {other:?}"),
        }
    }

    #[test]
    fn test_cascade_propagation() {
        let json = MAP.replacen("\"width\": 2000,", "\"width\": 2000, \"propagation\": \"cascade\",", 1);
        let map = LevelMap::from_json(&json).unwrap();
        assert_eq!(map.propagation, Propagation::Cascade);
    }

    #[test]
    fn test_robot_required_once() {
        let none = MAP.replace(r#"{ "type": "robot", "x": 200, "y": 64, "shield": 100 },"#, "");
        assert!(matches!(LevelMap::from_json(&none), Err(Error::MissingRobot)));

        let two = MAP.replace(
            r#"{ "type": "robot", "x": 200, "y": 64, "shield": 100 },"#,
            r#"{ "type": "robot", "x": 200, "y": 64, "shield": 100 },
               { "type": "robot", "x": 300, "y": 64, "shield": 100 },"#,
        );
        assert!(matches!(LevelMap::from_json(&two), Err(Error::DuplicateRobot)));
    }

    #[test]
    fn test_zero_shield_rejected() {
        let json = MAP.replace("\"shield\": 100", "\"shield\": 0");
        assert!(matches!(LevelMap::from_json(&json), Err(Error::InvalidShield)));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let json = MAP.replace("\"name\": \"saw1\"", "\"name\": \"lever\"");
        assert!(matches!(
            LevelMap::from_json(&json),
            Err(Error::DuplicateName { name }) if name == "lever"
        ));
    }

    #[test]
    fn test_laser_speed_must_be_positive() {
        for speed in ["0", "-2"] {
            let json = MAP.replace(
                "\"rotation_angle\": 60,",
                &format!("\"rotation_angle\": 60, \"speed\": {speed},"),
            );
            assert!(matches!(
                LevelMap::from_json(&json),
                Err(Error::InvalidLaserSpeed { name }) if name == "laser1"
            ));
        }

        // NaN can't be written in JSON, so build the map directly
        let mut map = LevelMap::from_json(MAP).unwrap();
        if let LevelObject::Laser { speed, .. } = &mut map.objects[1] {
            *speed = f32::NAN;
        }
        assert!(matches!(map.validate(), Err(Error::InvalidLaserSpeed { .. })));
    }

    #[test]
    fn test_non_positive_size_rejected() {
        let json = MAP.replace("\"radius\": 50", "\"radius\": 0");
        assert!(matches!(
            LevelMap::from_json(&json),
            Err(Error::InvalidSize { name }) if name == "saw1"
        ));
    }

    #[test]
    fn test_bad_json() {
        assert!(matches!(LevelMap::from_json("{"), Err(Error::Json { .. })));
    }
}
