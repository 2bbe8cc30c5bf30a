//! Game settings and preferences
//!
//! Persisted as flat keys in the save store, next to the level records.

use crate::persistence::KeyValueStore;

/// Store keys
mod keys {
    pub const EFFECTS_MUTED: &str = "effects_muted";
    pub const MUSIC_MUTED: &str = "music_muted";
    pub const MUSIC_VOLUME: &str = "music_volume";
    pub const EFFECTS_VOLUME: &str = "effects_volume";
    pub const FULL_SCREEN: &str = "full_screen";
    pub const WINDOW_SIZE: &str = "window_size";
    pub const DEBUG_GRID: &str = "debug_grid";
    pub const DEBUG_PHYSICS: &str = "debug_physics";
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    // === Audio ===
    pub effects_muted: bool,
    pub music_muted: bool,
    /// Music volume (0.0 - 1.0)
    pub music_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub effects_volume: f32,

    // === Window ===
    pub full_screen: bool,
    /// Windowed size as a fraction of the desktop
    pub window_size: f32,

    // === Debug ===
    pub debug_grid: bool,
    pub debug_physics: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            effects_muted: false,
            music_muted: false,
            music_volume: 1.0,
            effects_volume: 1.0,

            full_screen: false,
            window_size: 0.75,

            debug_grid: false,
            debug_physics: false,
        }
    }
}

impl Settings {
    /// Read settings from the store, falling back to defaults per key
    pub fn load(store: &KeyValueStore) -> Self {
        let defaults = Self::default();
        Self {
            effects_muted: store.get_bool(keys::EFFECTS_MUTED, defaults.effects_muted),
            music_muted: store.get_bool(keys::MUSIC_MUTED, defaults.music_muted),
            music_volume: store
                .get_float(keys::MUSIC_VOLUME, defaults.music_volume)
                .clamp(0.0, 1.0),
            effects_volume: store
                .get_float(keys::EFFECTS_VOLUME, defaults.effects_volume)
                .clamp(0.0, 1.0),
            full_screen: store.get_bool(keys::FULL_SCREEN, defaults.full_screen),
            window_size: store.get_float(keys::WINDOW_SIZE, defaults.window_size),
            debug_grid: store.get_bool(keys::DEBUG_GRID, defaults.debug_grid),
            debug_physics: store.get_bool(keys::DEBUG_PHYSICS, defaults.debug_physics),
        }
    }

    /// Write every setting into the store (caller decides when to flush to disk)
    pub fn save(&self, store: &mut KeyValueStore) {
        store.set_bool(keys::EFFECTS_MUTED, self.effects_muted);
        store.set_bool(keys::MUSIC_MUTED, self.music_muted);
        store.set_float(keys::MUSIC_VOLUME, self.music_volume);
        store.set_float(keys::EFFECTS_VOLUME, self.effects_volume);
        store.set_bool(keys::FULL_SCREEN, self.full_screen);
        store.set_float(keys::WINDOW_SIZE, self.window_size);
        store.set_bool(keys::DEBUG_GRID, self.debug_grid);
        store.set_bool(keys::DEBUG_PHYSICS, self.debug_physics);
        log::info!("Settings saved");
    }

    pub fn set_music_volume(&mut self, volume: f32) {
        self.music_volume = volume.clamp(0.0, 1.0);
    }

    pub fn set_effects_volume(&mut self, volume: f32) {
        self.effects_volume = volume.clamp(0.0, 1.0);
    }

    pub fn toggle_music(&mut self) {
        self.music_muted = !self.music_muted;
    }

    pub fn toggle_effects(&mut self) {
        self.effects_muted = !self.effects_muted;
    }

    /// Volume a host should actually play music at
    pub fn effective_music_volume(&self) -> f32 {
        if self.music_muted { 0.0 } else { self.music_volume }
    }

    /// Volume a host should actually play effects at
    pub fn effective_effects_volume(&self) -> f32 {
        if self.effects_muted { 0.0 } else { self.effects_volume }
    }
}
