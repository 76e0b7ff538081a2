//! Configuration management for handbook

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::assistant::AssistantModel;
use crate::docs::store::DEFAULT_PRELOAD_DELAY;
use crate::theme::Theme;

/// Docs bundle used when nothing else is configured
const DEFAULT_DOCS_DIR: &str = "demos/handbook";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Selected theme name
    pub theme: String,

    /// Directory containing `handbook.json`
    pub docs_dir: PathBuf,

    /// Model used by the assistant panel
    pub model: AssistantModel,

    /// Delay before lazy sections are loaded in the background
    pub preload_delay_ms: u64,

    /// Vim mode enabled
    pub vim_mode: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: "Tokyo Night".to_string(),
            docs_dir: PathBuf::from(DEFAULT_DOCS_DIR),
            model: AssistantModel::default(),
            preload_delay_ms: DEFAULT_PRELOAD_DELAY.as_millis() as u64,
            vim_mode: true,
        }
    }
}

impl Config {
    /// Load configuration from disk, or create default if not exists
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config from {:?}", config_path))?;
            serde_json::from_str(&contents).with_context(|| "Failed to parse config.json")
        } else {
            let config = Self::default();
            config.save()?;
            Ok(config)
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {:?}", parent))?;
        }

        let contents =
            serde_json::to_string_pretty(self).with_context(|| "Failed to serialize config")?;

        std::fs::write(&config_path, contents)
            .with_context(|| format!("Failed to write config to {:?}", config_path))?;

        Ok(())
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("", "", "handbook").context("Failed to determine project directories")
    }

    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.json"))
    }

    /// Get the data directory path
    pub fn data_dir() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.data_dir().to_path_buf())
    }

    /// File the TUI writes its log to
    pub fn log_path() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join("handbook.log"))
    }

    pub fn preload_delay(&self) -> Duration {
        Duration::from_millis(self.preload_delay_ms)
    }

    /// Get the active theme
    pub fn active_theme(&self) -> Theme {
        Theme::by_name(&self.theme).unwrap_or_default()
    }
}
