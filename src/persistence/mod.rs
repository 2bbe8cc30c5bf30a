//! Flat key/value save store
//!
//! Features:
//! - Typed getters with caller-supplied defaults
//! - Versioned JSON envelope
//! - Atomic save (write to `.tmp`, then rename over the save)

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Envelope version written by this build
pub const STORE_VERSION: u32 = 1;

/// A single stored value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    version: u32,
    entries: BTreeMap<String, Value>,
}

/// Persistent flat key/value store (records, settings)
#[derive(Debug, Clone, Default)]
pub struct KeyValueStore {
    path: Option<PathBuf>,
    entries: BTreeMap<String, Value>,
}

impl KeyValueStore {
    /// Store that lives only in memory; `save` is a no-op
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open the store at `path`. A missing file yields an empty store.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(json) => {
                let envelope: Envelope = serde_json::from_str(&json)
                    .map_err(|e| Error::json(path.display().to_string(), e))?;
                if envelope.version != STORE_VERSION {
                    return Err(Error::UnsupportedStoreVersion {
                        found: envelope.version,
                    });
                }
                log::info!("Loaded {} entries from {}", envelope.entries.len(), path.display());
                envelope.entries
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No save store at {}, starting fresh", path.display());
                BTreeMap::new()
            }
            Err(e) => return Err(Error::io(path, e)),
        };

        Ok(Self {
            path: Some(path),
            entries,
        })
    }

    /// Write the store back to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let envelope = Envelope {
            version: STORE_VERSION,
            entries: self.entries.clone(),
        };
        let json = serde_json::to_string_pretty(&envelope)
            .map_err(|e| Error::json("save store", e))?;

        let tmp = path.with_extension("tmp");
        fs::write(&tmp, json).map_err(|e| Error::io(&tmp, e))?;
        fs::rename(&tmp, path).map_err(|e| Error::io(path, e))?;

        log::debug!("Save store written ({} entries)", self.entries.len());
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.remove(key)
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.entries.get(key) {
            Some(Value::Bool(v)) => *v,
            Some(Value::Int(v)) => *v != 0,
            _ => default,
        }
    }

    pub fn get_int(&self, key: &str, default: i64) -> i64 {
        match self.entries.get(key) {
            Some(Value::Int(v)) => *v,
            _ => default,
        }
    }

    /// Integers are accepted for float keys (JSON does not keep `1.0` apart from `1`)
    pub fn get_float(&self, key: &str, default: f32) -> f32 {
        match self.entries.get(key) {
            Some(Value::Float(v)) => *v as f32,
            Some(Value::Int(v)) => *v as f32,
            _ => default,
        }
    }

    pub fn get_str<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        match self.entries.get(key) {
            Some(Value::Str(v)) => v,
            _ => default,
        }
    }

    pub fn set_bool(&mut self, key: &str, value: bool) {
        self.entries.insert(key.to_string(), Value::Bool(value));
    }

    pub fn set_int(&mut self, key: &str, value: i64) {
        self.entries.insert(key.to_string(), Value::Int(value));
    }

    pub fn set_float(&mut self, key: &str, value: f32) {
        self.entries
            .insert(key.to_string(), Value::Float(f64::from(value)));
    }

    pub fn set_str(&mut self, key: &str, value: &str) {
        self.entries
            .insert(key.to_string(), Value::Str(value.to_string()));
    }
}
