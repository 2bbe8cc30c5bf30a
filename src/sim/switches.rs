//! Switches, doors and the name registry linking them
//!
//! Every named object in a level is registered by name. A switch names a
//! target; turning the switch on activates that target. Doors must be
//! activated (unlocked) before touching them opens them, and touching an
//! open door finishes the level.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One-shot on/off object state: both flags only ever go false -> true
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnOff {
    activated: bool,
    on: bool,
}

impl OnOff {
    pub fn new(activated: bool) -> Self {
        Self { activated, on: false }
    }

    pub fn is_activated(&self) -> bool {
        self.activated
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Returns true when this call changed the state
    pub fn on(&mut self) -> bool {
        if self.on {
            return false;
        }
        self.on = true;
        true
    }

    /// Returns true when this call changed the state
    pub fn activate(&mut self) -> bool {
        if self.activated {
            return false;
        }
        self.activated = true;
        true
    }
}

/// How far turning a switch on reaches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Propagation {
    /// The target is activated, nothing more
    #[default]
    Arm,
    /// A switch target is also turned on, and its own target resolved in turn
    Cascade,
}

/// A named object placed in the level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Placed {
    Switch { state: OnOff, target: String },
    Door { state: OnOff },
    Laser,
    Saw,
    Barrel,
    Box,
}

impl Placed {
    pub fn kind(&self) -> &'static str {
        match self {
            Placed::Switch { .. } => "switch",
            Placed::Door { .. } => "door",
            Placed::Laser => "laser",
            Placed::Saw => "saw",
            Placed::Barrel => "barrel",
            Placed::Box => "box",
        }
    }
}

/// Things that happened while resolving a switch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchEvent {
    /// Switch turned on
    On { name: String },
    /// A target switch became activated
    Armed { name: String },
    /// A target door became activated
    DoorUnlocked { name: String },
}

/// Result of the robot touching a door
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorTouch {
    /// Locked, or not a door
    Nothing,
    Opened,
    /// The door was already open: level complete
    Exit,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Registry {
    objects: BTreeMap<String, Placed>,
    propagation: Propagation,
}

impl Registry {
    pub fn new(propagation: Propagation) -> Self {
        Self {
            objects: BTreeMap::new(),
            propagation,
        }
    }

    pub fn propagation(&self) -> Propagation {
        self.propagation
    }

    pub fn insert(&mut self, name: impl Into<String>, object: Placed) -> Result<()> {
        let name = name.into();
        if self.objects.contains_key(&name) {
            return Err(Error::DuplicateName { name });
        }
        self.objects.insert(name, object);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Placed> {
        self.objects.get(name)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Switch or door state by name
    pub fn state(&self, name: &str) -> Option<OnOff> {
        match self.objects.get(name)? {
            Placed::Switch { state, .. } | Placed::Door { state } => Some(*state),
            _ => None,
        }
    }

    /// Robot touched a switch
    pub fn touch_switch(&mut self, name: &str) -> Vec<SwitchEvent> {
        let mut events = Vec::new();

        let Some(Placed::Switch { state, target }) = self.objects.get_mut(name) else {
            return events;
        };
        if !state.is_activated() || !state.on() {
            return events;
        }
        events.push(SwitchEvent::On {
            name: name.to_string(),
        });
        let target = target.clone();

        self.resolve_target(target, &mut events);
        events
    }

    fn resolve_target(&mut self, mut target: String, events: &mut Vec<SwitchEvent>) {
        loop {
            match self.objects.get_mut(&target) {
                Some(Placed::Door { state }) => {
                    if state.activate() {
                        log::info!("Door {} unlocked", target);
                        events.push(SwitchEvent::DoorUnlocked { name: target });
                    }
                    return;
                }
                Some(Placed::Switch {
                    state,
                    target: next,
                }) => {
                    if state.activate() {
                        events.push(SwitchEvent::Armed {
                            name: target.clone(),
                        });
                    }
                    // `on` is one-shot, so a cycle stops at the first switch already on
                    if self.propagation != Propagation::Cascade || !state.on() {
                        return;
                    }
                    events.push(SwitchEvent::On {
                        name: target.clone(),
                    });
                    target = next.clone();
                }
                Some(other) => {
                    log::warn!("Switch target {} is a {}, ignoring", target, other.kind());
                    return;
                }
                None => {
                    log::warn!("Switch target {} not found", target);
                    return;
                }
            }
        }
    }

    /// Robot touched a door
    pub fn touch_door(&mut self, name: &str) -> DoorTouch {
        let Some(Placed::Door { state }) = self.objects.get_mut(name) else {
            return DoorTouch::Nothing;
        };
        if !state.is_activated() {
            DoorTouch::Nothing
        } else if state.on() {
            log::info!("Door {} opened", name);
            DoorTouch::Opened
        } else {
            DoorTouch::Exit
        }
    }
}
