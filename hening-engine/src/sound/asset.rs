//! Sound catalog entries

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Catalog name of the silent option offered in every category
pub const NO_SOUND: &str = "No Sound";

/// Catalog category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundCategory {
    /// One-shot sounds fired at bell offsets
    Bell,
    /// Looping background sounds
    Ambiance,
}

impl SoundCategory {
    /// Whether assets of this category loop unless configured otherwise
    pub fn loops_by_default(self) -> bool {
        matches!(self, SoundCategory::Ambiance)
    }
}

impl std::fmt::Display for SoundCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SoundCategory::Bell => write!(f, "bell"),
            SoundCategory::Ambiance => write!(f, "ambiance"),
        }
    }
}

/// Immutable catalog entry, defined at process start.
///
/// `source` is `None` for the "No Sound" entries; such entries resolve to a
/// nil handle without touching the audio backend. Relative sources are
/// resolved against the configured assets root by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoundAsset {
    pub name: String,
    pub category: SoundCategory,
    pub looping: bool,
    pub source: Option<PathBuf>,
}

impl SoundAsset {
    pub fn new(name: impl Into<String>, category: SoundCategory, source: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            category,
            looping: category.loops_by_default(),
            source: Some(source.into()),
        }
    }

    /// Silent entry for a category
    pub fn silent(category: SoundCategory) -> Self {
        Self {
            name: NO_SOUND.to_string(),
            category,
            looping: category.loops_by_default(),
            source: None,
        }
    }

    pub fn is_silent(&self) -> bool {
        self.source.is_none()
    }
}

/// Built-in catalog: three bells and three ambiances plus a silent option each
pub fn default_catalog() -> Vec<SoundAsset> {
    vec![
        SoundAsset::silent(SoundCategory::Bell),
        SoundAsset::new("Aura Chime", SoundCategory::Bell, "bell/bell1.mp3"),
        SoundAsset::new("Zen Whisper", SoundCategory::Bell, "bell/bell2.mp3"),
        SoundAsset::new("Celestial Ring", SoundCategory::Bell, "bell/bell3.mp3"),
        SoundAsset::silent(SoundCategory::Ambiance),
        SoundAsset::new("Rain", SoundCategory::Ambiance, "ambience/rain.mp3"),
        SoundAsset::new("Campfire", SoundCategory::Ambiance, "ambience/campfire.mp3"),
        SoundAsset::new("Wind Chimes", SoundCategory::Ambiance, "ambience/windChimes.mp3"),
    ]
}
