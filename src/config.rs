//! Configuration: loads optional ~/.shiftwave/config.yaml.
//!
//! Every field has a default, so a partial file (or no file at all) is valid.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::engine::MacroValues;
use crate::presets::{Preset, PresetBank};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot access config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Settings loaded from ~/.shiftwave/config.yaml.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Output sample rate in Hz.
    pub sample_rate: u32,
    /// Frames per device buffer; 0 lets the device choose.
    pub buffer_frames: u32,
    /// 1-based preset to start on.
    pub start_preset: usize,
    /// Initial tempo multiplier.
    pub tempo: f64,
    /// Initial pitch offset in semitones.
    pub pitch_semitones: f64,
    pub macros: MacroValues,
    /// Extra presets, appended after the built-ins.
    pub presets: Vec<Preset>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            buffer_frames: 512,
            start_preset: 1,
            tempo: 1.0,
            pitch_semitones: 0.0,
            macros: MacroValues::default(),
            presets: Vec::new(),
        }
    }
}

/// Default config file location.
pub fn default_config_path() -> PathBuf {
    let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(".shiftwave");
    path.push("config.yaml");
    path
}

impl Config {
    /// Load from `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from the default location, falling back to defaults on any error.
    pub fn load() -> Self {
        let path = default_config_path();
        match Self::load_from(&path) {
            Ok(config) => {
                info!(path = %path.display(), "loaded config");
                config
            }
            Err(e) => {
                warn!("{e}; using defaults");
                Self::default()
            }
        }
    }

    pub fn parse(yaml: &str) -> Result<Self, serde_yaml::Error> {
        // An empty document deserializes as unit, not as an empty map.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml)
    }

    /// Write to `path`, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let yaml = serde_yaml::to_string(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, yaml).map_err(io_err)
    }

    /// Built-in presets followed by the configured ones.
    pub fn preset_bank(&self) -> PresetBank {
        PresetBank::with_user_presets(self.presets.iter().cloned())
    }
}
