use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::constants::{DEFAULT_CODEC, DEFAULT_QUALITY};

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("could not determine config directory")]
    NoConfigDir,
    #[error("failed to write settings to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize settings: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// User preferences remembered between captures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,
    #[serde(default)]
    pub player_path: Option<PathBuf>,
    #[serde(default)]
    pub last_output: Option<PathBuf>,
    #[serde(default = "default_codec")]
    pub codec: String,
    #[serde(default = "default_quality")]
    pub quality: u8,
    /// Display flags kept visible during capture on top of the catalog's.
    #[serde(default)]
    pub keep_visible: Vec<String>,
}

fn default_codec() -> String {
    DEFAULT_CODEC.to_string()
}

fn default_quality() -> u8 {
    DEFAULT_QUALITY
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            player_path: None,
            last_output: None,
            codec: default_codec(),
            quality: default_quality(),
            keep_visible: Vec::new(),
        }
    }
}

impl Settings {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("Playcast").join("settings.json"))
    }

    /// Loads from the user config dir, falling back to defaults when the
    /// file is missing or unreadable.
    pub fn load() -> Self {
        Self::config_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    pub fn load_from(path: &Path) -> Self {
        let loaded = fs::read_to_string(path)
            .ok()
            .and_then(|json| serde_json::from_str(&json).ok());
        match loaded {
            Some(settings) => settings,
            None => {
                log::debug!("Using default settings ({} not loaded)", path.display());
                Self::default()
            }
        }
    }

    pub fn save(&self) -> Result<(), SettingsError> {
        let path = Self::config_path().ok_or(SettingsError::NoConfigDir)?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        let write_err = |source| SettingsError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(SettingsError::Serialize)?;
        fs::write(path, json).map_err(write_err)
    }
}
