//! Crate error type
//!
//! Loading a level, a catalogue or the save store can fail; the simulation itself cannot.

use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum Error {
    Io { path: PathBuf, source: std::io::Error },
    Json { context: String, source: serde_json::Error },
    InvalidCatalogueFormat { found: String },
    UnsupportedCatalogueVersion { major: u32, minor: u32 },
    LevelOutOfRange { level: u16, count: u16 },
    MissingRobot,
    DuplicateRobot,
    DuplicateName { name: String },
    InvalidSize { name: String },
    InvalidShield,
    InvalidLaserSpeed { name: String },
    TooManyLevels { count: usize },
    UnsupportedStoreVersion { found: u32 },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Json {
            context: context.into(),
            source,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "i/o error on {}: {source}", path.display()),
            Self::Json { context, source } => write!(f, "invalid json in {context}: {source}"),
            Self::InvalidCatalogueFormat { found } => {
                write!(f, "level catalogue format must be \"levels\", found \"{found}\"")
            }
            Self::UnsupportedCatalogueVersion { major, minor } => {
                write!(f, "unsupported level catalogue version: {major}.{minor}")
            }
            Self::LevelOutOfRange { level, count } => {
                write!(f, "level {level} out of range (1..={count})")
            }
            Self::MissingRobot => write!(f, "level map has no robot"),
            Self::DuplicateRobot => write!(f, "level map has more than one robot"),
            Self::DuplicateName { name } => write!(f, "duplicate object name: {name}"),
            Self::InvalidSize { name } => write!(f, "object {name} has a non-positive size"),
            Self::InvalidShield => write!(f, "robot shield must be positive"),
            Self::InvalidLaserSpeed { name } => {
                write!(f, "laser {name} needs a finite, positive speed")
            }
            Self::TooManyLevels { count } => {
                write!(f, "level catalogue has {count} levels, at most {} allowed", u16::MAX)
            }
            Self::UnsupportedStoreVersion { found } => {
                write!(f, "unsupported save store version: {found}")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
            _ => None,
        }
    }
}
