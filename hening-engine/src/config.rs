//! Configuration for the hening engine
//!
//! # Settings Sources Priority
//!
//! 1. Command-line arguments (`--assets`, `--lead-in`, ...), with `HENING_*` environment fallbacks
//! 2. TOML configuration file (`--config`, `HENING_CONFIG`, then the platform locations)
//! 3. Built-in defaults (code constants)
//!
//! ```toml
//! assets_root = "/usr/share/hening/assets"
//! lead_in_seconds = 5
//! output = "device"
//!
//! [logging]
//! level = "debug"
//!
//! [[sound]]
//! name = "Temple Bowl"
//! category = "bell"
//! file = "bell/bowl.flac"
//! ```

use crate::audio::OutputKind;
use crate::error::{Error, Result};
use crate::session::{SessionSettings, DEFAULT_LEAD_IN_SECONDS};
use crate::sound::{default_catalog, SoundAsset, SoundCategory, NO_SOUND};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "HENING_CONFIG";

/// Engine configuration loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Folder that relative sound files are resolved against
    ///
    /// Defaults to the platform data folder when not given here or on the command line.
    #[serde(default)]
    pub assets_root: Option<PathBuf>,

    /// Preparation countdown before the timed session (0 starts immediately)
    #[serde(default = "default_lead_in_seconds")]
    pub lead_in_seconds: u64,

    /// Session tick period in milliseconds
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// How long a selection preview plays before stopping on its own
    #[serde(default = "default_preview_seconds")]
    pub preview_seconds: u64,

    /// Longest a single sound may take to load before it is treated as failed
    #[serde(default = "default_load_timeout_ms")]
    pub load_timeout_ms: u64,

    /// Where mixed audio goes
    #[serde(default = "default_output")]
    pub output: OutputKind,

    /// Output device name (device output only; default device when absent)
    #[serde(default)]
    pub device: Option<String>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Sound catalog; the built-in catalog is used when empty
    #[serde(default, rename = "sound")]
    pub sounds: Vec<SoundEntry>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl LoggingConfig {
    /// `EnvFilter` directives applying the level to both workspace crates
    pub fn filter_directives(&self) -> String {
        format!("hening_engine={0},hening_common={0}", self.level)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// One `[[sound]]` catalog entry
#[derive(Debug, Clone, Deserialize)]
pub struct SoundEntry {
    pub name: String,
    pub category: SoundCategory,
    /// Omitted for a silent entry
    #[serde(default)]
    pub file: Option<PathBuf>,
    /// Overrides the category default (bells one-shot, ambiance looping)
    #[serde(default, rename = "loop")]
    pub looping: Option<bool>,
}

fn default_lead_in_seconds() -> u64 {
    DEFAULT_LEAD_IN_SECONDS
}

fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_preview_seconds() -> u64 {
    10
}

fn default_load_timeout_ms() -> u64 {
    30_000
}

fn default_output() -> OutputKind {
    if cfg!(feature = "device-output") {
        OutputKind::Device
    } else {
        OutputKind::Null
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            assets_root: None,
            lead_in_seconds: default_lead_in_seconds(),
            tick_interval_ms: default_tick_interval_ms(),
            preview_seconds: default_preview_seconds(),
            load_timeout_ms: default_load_timeout_ms(),
            output: default_output(),
            device: None,
            logging: LoggingConfig::default(),
            sounds: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Load from the resolved config file, or built-in defaults when there is none
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        match hening_common::config::resolve_config_path(cli_path, CONFIG_ENV_VAR)? {
            Some(path) => {
                info!("Loading configuration from {}", path.display());
                let content = std::fs::read_to_string(&path)?;
                Self::from_toml_str(&content)
            }
            None => {
                info!("No config file found, using built-in defaults");
                Ok(Self::default())
            }
        }
    }

    /// Parse and validate TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tick_interval_ms == 0 {
            return Err(Error::Config("tick_interval_ms must be greater than 0".to_string()));
        }
        if self.preview_seconds == 0 {
            return Err(Error::Config("preview_seconds must be greater than 0".to_string()));
        }
        if self.load_timeout_ms == 0 {
            return Err(Error::Config("load_timeout_ms must be greater than 0".to_string()));
        }

        let mut seen = HashSet::new();
        for entry in &self.sounds {
            if entry.name.trim().is_empty() {
                return Err(Error::Config("sound entry with an empty name".to_string()));
            }
            if !seen.insert((entry.category, entry.name.as_str())) {
                return Err(Error::Config(format!(
                    "duplicate {} '{}' in sound catalog",
                    entry.category, entry.name
                )));
            }
        }
        Ok(())
    }

    /// Catalog to load into the sound pool.
    ///
    /// A configured catalog always offers "No Sound" in both categories.
    pub fn catalog(&self) -> Vec<SoundAsset> {
        if self.sounds.is_empty() {
            return default_catalog();
        }

        let mut catalog = Vec::with_capacity(self.sounds.len() + 2);
        for category in [SoundCategory::Bell, SoundCategory::Ambiance] {
            let has_silent = self
                .sounds
                .iter()
                .any(|entry| entry.category == category && entry.name == NO_SOUND);
            if !has_silent {
                catalog.push(SoundAsset::silent(category));
            }
        }

        catalog.extend(self.sounds.iter().map(|entry| {
            let mut asset = match &entry.file {
                Some(file) => SoundAsset::new(entry.name.clone(), entry.category, file.clone()),
                None => SoundAsset {
                    name: entry.name.clone(),
                    ..SoundAsset::silent(entry.category)
                },
            };
            if let Some(looping) = entry.looping {
                asset.looping = looping;
            }
            asset
        }));
        catalog
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            lead_in_seconds: self.lead_in_seconds,
            tick_interval: Duration::from_millis(self.tick_interval_ms),
        }
    }

    pub fn preview_duration(&self) -> Duration {
        Duration::from_secs(self.preview_seconds)
    }

    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }

    /// Assets root: command line, then config file, then the platform default
    pub fn resolve_assets_root(&self, cli_arg: Option<&Path>) -> PathBuf {
        cli_arg
            .map(Path::to_path_buf)
            .or_else(|| self.assets_root.clone())
            .unwrap_or_else(hening_common::config::default_assets_root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();

        assert_eq!(config.lead_in_seconds, 5);
        assert_eq!(config.tick_interval_ms, 1000);
        assert_eq!(config.preview_seconds, 10);
        assert_eq!(config.load_timeout(), Duration::from_secs(30));
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.catalog(), default_catalog());
        assert_eq!(config.session_settings(), SessionSettings::default());
    }

    #[test]
    fn test_parse_full_config() {
        let config = EngineConfig::from_toml_str(
            r#"
            assets_root = "/srv/hening"
            lead_in_seconds = 0
            tick_interval_ms = 250
            preview_seconds = 3
            output = "null"

            [logging]
            level = "debug"

            [[sound]]
            name = "Temple Bowl"
            category = "bell"
            file = "bell/bowl.flac"

            [[sound]]
            name = "Stream"
            category = "ambiance"
            file = "ambience/stream.ogg"
            loop = false
            "#,
        )
        .unwrap();

        assert_eq!(config.assets_root, Some(PathBuf::from("/srv/hening")));
        assert_eq!(config.output, OutputKind::Null);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(
            config.session_settings(),
            SessionSettings {
                lead_in_seconds: 0,
                tick_interval: Duration::from_millis(250),
            }
        );
        assert_eq!(config.preview_duration(), Duration::from_secs(3));

        let catalog = config.catalog();
        assert_eq!(catalog.len(), 4);
        assert!(catalog
            .iter()
            .any(|a| a.name == NO_SOUND && a.category == SoundCategory::Bell && a.is_silent()));
        let stream = catalog.iter().find(|a| a.name == "Stream").unwrap();
        assert!(!stream.looping);
        assert_eq!(stream.source, Some(PathBuf::from("ambience/stream.ogg")));
    }

    #[test]
    fn test_load_timeout_configurable() {
        let config = EngineConfig::from_toml_str("load_timeout_ms = 1500").unwrap();
        assert_eq!(config.load_timeout(), Duration::from_millis(1500));

        let err = EngineConfig::from_toml_str("load_timeout_ms = 0").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_log_filter_covers_both_crates() {
        let config = EngineConfig::from_toml_str("[logging]\nlevel = \"debug\"").unwrap();
        assert_eq!(
            config.logging.filter_directives(),
            "hening_engine=debug,hening_common=debug"
        );
    }

    #[test]
    fn test_zero_tick_interval_rejected() {
        let err = EngineConfig::from_toml_str("tick_interval_ms = 0").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_duplicate_sound_names_rejected() {
        let err = EngineConfig::from_toml_str(
            r#"
            [[sound]]
            name = "Rain"
            category = "ambiance"
            file = "a.mp3"

            [[sound]]
            name = "Rain"
            category = "ambiance"
            file = "b.mp3"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_same_name_in_both_categories_allowed() {
        let config = EngineConfig::from_toml_str(
            r#"
            [[sound]]
            name = "Gong"
            category = "bell"
            file = "gong.wav"

            [[sound]]
            name = "Gong"
            category = "ambiance"
            file = "gong-loop.wav"
            "#,
        );
        assert!(config.is_ok());
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = EngineConfig::from_toml_str("lead_in_seconds = \"soon\"").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_load_from_explicit_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "lead_in_seconds = 2").unwrap();

        let config = EngineConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.lead_in_seconds, 2);
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let result = EngineConfig::load(Some(Path::new("/nonexistent/hening.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_assets_root_priority() {
        let config = EngineConfig {
            assets_root: Some(PathBuf::from("/from/config")),
            ..EngineConfig::default()
        };

        assert_eq!(
            config.resolve_assets_root(Some(Path::new("/from/cli"))),
            PathBuf::from("/from/cli")
        );
        assert_eq!(config.resolve_assets_root(None), PathBuf::from("/from/config"));
        assert!(EngineConfig::default()
            .resolve_assets_root(None)
            .ends_with("assets"));
    }
}
