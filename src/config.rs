//! Configuration management for the voxpad application.
//!
//! This module provides functionality for loading and managing application
//! configuration, including virtual device settings, the transcription
//! filter vocabulary and keyword profile paths.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::words::DEFAULT_STATUS_WORDS;

/// Virtual device configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(test, derive(PartialEq))]
pub struct DeviceConfig {
    /// Device name advertised to the host
    pub name: String,
    /// Number of initialization attempts before giving up
    pub init_retries: u32,
    /// Seconds to wait between initialization attempts
    pub init_retry_secs: f64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: "voxpad virtual pad".to_string(),
            init_retries: 3,
            init_retry_secs: 2.0,
        }
    }
}

/// Transcription filter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(test, derive(PartialEq))]
pub struct WordsConfig {
    /// Engine status phrases stripped from the word stream
    pub status_words: Vec<String>,
}

impl Default for WordsConfig {
    fn default() -> Self {
        Self {
            status_words: DEFAULT_STATUS_WORDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Phrase matching configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(test, derive(PartialEq))]
pub struct PhraseConfig {
    /// How many recent words are kept for multi-word phrase matching
    pub depth: usize,
}

impl Default for PhraseConfig {
    fn default() -> Self {
        Self { depth: 3 }
    }
}

/// Keyword profile configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(test, derive(PartialEq))]
pub struct ProfileConfig {
    /// Keyword profile JSON used by the session mode
    pub path: Option<PathBuf>,
    /// Optional synonyms JSON expanding the profile vocabulary
    pub synonyms: Option<PathBuf>,
}

/// Main application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(test, derive(PartialEq))]
pub struct Config {
    /// Virtual device settings
    pub device: DeviceConfig,
    /// Transcription filter settings
    pub words: WordsConfig,
    /// Phrase matching settings
    pub phrases: PhraseConfig,
    /// Keyword profile paths
    pub profile: ProfileConfig,
}

impl Config {
    /// Gets the default configuration file path.
    fn default_config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .context("Cannot find config directory")
            .unwrap_or_else(|_| PathBuf::from("~/.config"));
        let mut path = config_dir;
        path.push("voxpad");
        path.push("config.toml");
        path
    }

    /// Loads configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Saves configuration to a TOML file.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Loads configuration from the default location, creating it if it
    /// doesn't exist.
    pub fn load_or_write_default(path: Option<&Path>) -> Result<Self> {
        let default_path = Self::default_config_path();
        let path = path.unwrap_or(&default_path);
        // If config exists, use it
        if path.exists() {
            return Self::from_file(path)
                .context(format!("Reading default config from {}", path.display()));
        }

        // If no config exists, create default config
        let config = Self::default();
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        config.save_to_file(path)?;
        Ok(config)
    }
}
