//! Level catalogue and per-level records
//!
//! The catalogue lists every level (map, time limit, music). Best times and
//! stars are kept in the save store under `level_%04d_*` keys.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::NO_TIME_RECORD;
use crate::error::{Error, Result};
use crate::persistence::KeyValueStore;

/// Outcome of recording a completed level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompletedResult {
    NoRecordChange,
    NewLevelRecord,
    NewLevel3StarsRecord,
    NewLevelRecordAnd3StarsRecord,
}

/// One entry of the catalogue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelInfo {
    pub name: String,
    /// Map file, relative to the catalogue
    pub map: String,
    /// Seconds allowed for the 2-star rating
    pub time_limit: u32,
    pub music: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Version {
    major: u32,
    minor: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Metadata {
    format: String,
    version: Version,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Catalogue {
    metadata: Metadata,
    levels: Vec<LevelInfo>,
}

/// Level catalogue plus the records store
#[derive(Debug)]
pub struct LevelManager {
    levels: Vec<LevelInfo>,
    store: KeyValueStore,
}

fn stars_key(level: u16) -> String {
    format!("level_{level:04}_stars")
}

fn time_record_key(level: u16) -> String {
    format!("level_{level:04}_time_record")
}

fn three_stars_record_key(level: u16) -> String {
    format!("level_{level:04}_3_stars_time_record")
}

impl LevelManager {
    /// Parse a catalogue (`metadata.format == "levels"`, version 1.0)
    pub fn from_json(json: &str, store: KeyValueStore) -> Result<Self> {
        let catalogue: Catalogue =
            serde_json::from_str(json).map_err(|e| Error::json("level catalogue", e))?;

        if catalogue.metadata.format != "levels" {
            return Err(Error::InvalidCatalogueFormat {
                found: catalogue.metadata.format,
            });
        }
        let Version { major, minor } = catalogue.metadata.version;
        if major != 1 || minor != 0 {
            return Err(Error::UnsupportedCatalogueVersion { major, minor });
        }

        if u16::try_from(catalogue.levels.len()).is_err() {
            return Err(Error::TooManyLevels {
                count: catalogue.levels.len(),
            });
        }

        log::info!("Level catalogue loaded: {} levels", catalogue.levels.len());
        Ok(Self {
            levels: catalogue.levels,
            store,
        })
    }

    pub fn load(path: impl AsRef<Path>, store: KeyValueStore) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_json(&json, store)
    }

    pub fn num_levels(&self) -> u16 {
        // from_json rejects catalogues that don't fit
        u16::try_from(self.levels.len()).unwrap_or(u16::MAX)
    }

    /// Level info (1-based)
    pub fn level(&self, level: u16) -> Result<&LevelInfo> {
        let count = self.num_levels();
        if level == 0 || level > count {
            return Err(Error::LevelOutOfRange { level, count });
        }
        Ok(&self.levels[usize::from(level - 1)])
    }

    pub fn store(&self) -> &KeyValueStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut KeyValueStore {
        &mut self.store
    }

    pub fn level_stars(&self, level: u16) -> u8 {
        self.store.get_int(&stars_key(level), 0).clamp(0, 3) as u8
    }

    pub fn level_time_record(&self, level: u16) -> f32 {
        self.store.get_float(&time_record_key(level), NO_TIME_RECORD)
    }

    pub fn level_3_stars_record(&self, level: u16) -> f32 {
        self.store
            .get_float(&three_stars_record_key(level), NO_TIME_RECORD)
    }

    /// The first level is always open; later ones need a star on the previous level
    pub fn is_level_enabled(&self, level: u16) -> bool {
        if level <= 1 {
            return true;
        }
        self.level_stars(level - 1) > 0
    }

    pub fn next_level(&self, level: u16) -> u16 {
        if level < self.num_levels() {
            level + 1
        } else {
            self.num_levels()
        }
    }

    /// Record a completion, returning which records changed
    pub fn set_level_completed(&mut self, level: u16, stars: u8, time: f32) -> CompletedResult {
        let mut result = CompletedResult::NoRecordChange;

        if time < self.level_time_record(level) {
            self.store.set_float(&time_record_key(level), time);
            result = CompletedResult::NewLevelRecord;
        }

        if stars == 3 && time < self.level_3_stars_record(level) {
            self.store.set_float(&three_stars_record_key(level), time);
            result = match result {
                CompletedResult::NoRecordChange => CompletedResult::NewLevel3StarsRecord,
                _ => CompletedResult::NewLevelRecordAnd3StarsRecord,
            };
        }

        if stars > self.level_stars(level) {
            self.store.set_int(&stars_key(level), i64::from(stars));
        }

        log::info!(
            "Level {} completed: {} stars in {:.2}s ({:?})",
            level,
            stars,
            time,
            result
        );
        result
    }
}
