use std::path::{Path, PathBuf};

use color_eyre::{
    Result,
    eyre::{Context, eyre},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub matching: MatchConfig,
    pub normalize: NormalizeConfig,
}

/// Bounds used when picking a search result for a song.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// At most how many seconds shorter than the song a result may be
    pub time_lower_bound: i64,
    /// At most how many seconds longer than the song a result may be
    pub time_upper_bound: i64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            time_lower_bound: -15,
            time_upper_bound: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    /// Normalization program, looked up on PATH
    pub program: String,
    /// Target RMS level in dB (ffmpeg-normalize defaults to -26)
    pub target_level_db: i32,
    /// The tool adds a dash after the prefix
    pub output_prefix: String,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            program: "ffmpeg-normalize".to_string(),
            target_level_db: -18,
            output_prefix: "normalized".to_string(),
        }
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Get the default config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|path| path.join("playlist-fetch").join("config.toml"))
    }

    /// Load the config from the default path, falling back to built-in defaults
    /// when no file has been created yet
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.is_file() => Self::from_file(&path),
            Some(path) => {
                log::debug!(
                    "No config file at {}, using defaults",
                    path.display()
                );
                Ok(Self::default())
            }
            None => {
                log::debug!("No config directory found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Write the default config to the default path, if it doesn't exist
    pub fn create_default() -> Result<PathBuf> {
        let path = Self::config_path().ok_or(eyre!("No config directory found"))?;
        Self::create_default_at(&path)?;
        Ok(path)
    }

    fn create_default_at(path: &Path) -> Result<()> {
        if path.exists() {
            log::info!("Config file already exists at {}", path.display());
            return Ok(());
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let contents =
            toml::to_string_pretty(&Self::default()).wrap_err("Failed to serialize config")?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }
}
