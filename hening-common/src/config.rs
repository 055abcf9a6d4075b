//! Configuration file discovery and default folder resolution

use crate::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Application directory name used under the platform config/data folders
pub const APP_DIR: &str = "hening";

/// Configuration file name
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Resolve which configuration file to load.
///
/// Priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. Platform config file (`~/.config/hening/config.toml`, then `/etc/hening/config.toml` on Linux)
///
/// Returns `Ok(None)` when no file exists anywhere; the caller falls back to built-in defaults.
/// An explicitly requested file (argument or environment) that does not exist is an error.
pub fn resolve_config_path(cli_arg: Option<&Path>, env_var_name: &str) -> Result<Option<PathBuf>> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return require_existing(path.to_path_buf()).map(Some);
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.is_empty() {
            return require_existing(PathBuf::from(path)).map(Some);
        }
    }

    // Priority 3: Platform config file
    Ok(find_platform_config())
}

fn require_existing(path: PathBuf) -> Result<PathBuf> {
    if path.exists() {
        Ok(path)
    } else {
        Err(Error::Config(format!("Config file not found: {}", path.display())))
    }
}

/// Look for a config file in the platform locations
fn find_platform_config() -> Option<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(dir) = dirs::config_dir() {
        candidates.push(dir.join(APP_DIR).join(CONFIG_FILE_NAME));
    }
    if cfg!(target_os = "linux") {
        candidates.push(PathBuf::from("/etc").join(APP_DIR).join(CONFIG_FILE_NAME));
    }

    for candidate in candidates {
        if candidate.exists() {
            debug!("Using config file {}", candidate.display());
            return Some(candidate);
        }
        debug!("No config file at {}", candidate.display());
    }
    None
}

/// Get OS-dependent default folder holding the audio assets
pub fn default_assets_root() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/hening/assets (or /usr/share/hening/assets system-wide)
        dirs::data_local_dir()
            .map(|d| d.join(APP_DIR).join("assets"))
            .unwrap_or_else(|| PathBuf::from("/usr/share/hening/assets"))
    } else if cfg!(target_os = "macos") || cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join(APP_DIR).join("assets"))
            .unwrap_or_else(|| PathBuf::from("./assets"))
    } else {
        PathBuf::from("./assets")
    }
}
