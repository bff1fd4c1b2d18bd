//! Application configuration.
//!
//! Loaded from a JSON file; every field has a default so a partial (or missing)
//! file is fine. Engine timing is validated separately into [`EngineSettings`].

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};

use crate::engine::effects::EffectKind;
use crate::engine::soundpad::DEFAULT_VOLUME;
use crate::error::ConfigError;

pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;
pub const DEFAULT_BLOCK_SIZE: usize = 2048;
pub const DEFAULT_MONITOR_BLOCKS: usize = 10;
pub const MAX_BLOCK_SIZE: usize = 16_384;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub sample_rate: u32,
    pub block_size: usize,
    /// Capacity of the monitor queue, in blocks
    pub monitor_queue_blocks: usize,
    pub monitor_enabled: bool,
    /// Device name overrides; `None` lets the device resolver decide
    pub input_device: Option<String>,
    pub output_device: Option<String>,
    pub monitor_device: Option<String>,
    pub sounds_dir: PathBuf,
    pub soundpad_volume: f32,
    /// Unknown names fall back to `none` instead of failing the load
    #[serde(deserialize_with = "effect_by_name")]
    pub initial_effect: EffectKind,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            block_size: DEFAULT_BLOCK_SIZE,
            monitor_queue_blocks: DEFAULT_MONITOR_BLOCKS,
            monitor_enabled: true,
            input_device: None,
            output_device: None,
            monitor_device: None,
            sounds_dir: PathBuf::from("sounds"),
            soundpad_volume: DEFAULT_VOLUME,
            initial_effect: EffectKind::None,
        }
    }
}

impl AppConfig {
    /// Reads the config from `path`.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    /// Uses the explicit path if given, then the per-user config file, then defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match default_config_path() {
            Some(path) if path.exists() => {
                log::info!("Loading config from {}", path.display());
                Self::from_file(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    pub fn engine_settings(&self) -> Result<EngineSettings, ConfigError> {
        EngineSettings::new(self.sample_rate, self.block_size)
    }
}

fn effect_by_name<'de, D: Deserializer<'de>>(deserializer: D) -> Result<EffectKind, D::Error> {
    let name = String::deserialize(deserializer)?;
    let kind = EffectKind::from_name(&name);
    if kind.name() != name.trim().to_ascii_lowercase() {
        log::warn!("Unknown initial_effect '{}' in config, using '{}'", name, kind);
    }
    Ok(kind)
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("audiocart").join("config.json"))
}

/// Validated timing parameters for the audio engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    pub sample_rate: u32,
    pub block_size: usize,
}

impl EngineSettings {
    pub fn new(sample_rate: u32, block_size: usize) -> Result<Self, ConfigError> {
        if !(8_000..=192_000).contains(&sample_rate) {
            return Err(ConfigError::InvalidSampleRate(sample_rate));
        }
        if block_size == 0 || block_size > MAX_BLOCK_SIZE {
            return Err(ConfigError::InvalidBlockSize(block_size));
        }
        Ok(Self { sample_rate, block_size })
    }

    /// Duration of one block in milliseconds.
    pub fn block_ms(&self) -> f32 {
        self.block_size as f32 * 1000.0 / self.sample_rate as f32
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self { sample_rate: DEFAULT_SAMPLE_RATE, block_size: DEFAULT_BLOCK_SIZE }
    }
}
