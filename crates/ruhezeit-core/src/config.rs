use anyhow::{Context, Result};
use ruhezeit_ai::ProviderConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::session_controller::FocusDefaults;

/// Session length used when a request does not name one
pub const DEFAULT_FOCUS_MINUTES: u32 = 25;

/// Domains blocked when a request does not name any
pub const DEFAULT_BLOCK_LIST: [&str; 3] = ["twitter.com", "facebook.com", "reddit.com"];

/// Get the local data directory for ruhezeit.
///
/// # Errors
///
/// Returns an error if the local data directory cannot be determined.
pub fn get_data_dir() -> Result<PathBuf> {
    let mut path =
        dirs::data_local_dir().ok_or_else(|| anyhow::anyhow!("Failed to get local data dir"))?;
    path.push("ruhezeit");
    Ok(path)
}

/// Get the default settings file location.
///
/// # Errors
///
/// Returns an error if the local data directory cannot be determined.
pub fn default_config_path() -> Result<PathBuf> {
    Ok(get_data_dir()?.join("config.toml"))
}

/// User settings from `config.toml`; every field is optional
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub default_minutes: u32,
    pub block_list: Vec<String>,
    pub ai: ProviderConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_minutes: DEFAULT_FOCUS_MINUTES,
            block_list: DEFAULT_BLOCK_LIST.iter().map(ToString::to_string).collect(),
            ai: ProviderConfig::default(),
        }
    }
}

impl Settings {
    /// Load settings from `path`; a missing file yields the defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No settings file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid settings in {}", path.display()))
    }

    /// Parse settings from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid settings TOML
    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Defaults handed to the session controller
    #[must_use]
    pub fn focus_defaults(&self) -> FocusDefaults {
        FocusDefaults {
            minutes: if self.default_minutes == 0 {
                DEFAULT_FOCUS_MINUTES
            } else {
                self.default_minutes
            },
            block_list: self.block_list.clone(),
        }
    }
}
