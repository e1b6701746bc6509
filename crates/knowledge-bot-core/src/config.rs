use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, anyhow};

/// Environment variable holding the knowledge service base URL
pub const BASE_URL_ENV: &str = "KNOWLEDGE_BOT_API_URL";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub base_url: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    pub fn save_base_url(url: &str) -> Result<()> {
        Self::save_base_url_to(&Self::get_config_path()?, url)
    }

    /// Update only the base URL, keeping the file's other settings.
    /// An unreadable file is reported rather than overwritten.
    pub fn save_base_url_to(path: &Path, url: &str) -> Result<()> {
        let mut config = Self::load_from(path)
            .map_err(|e| anyhow!("Refusing to overwrite unreadable config {:?}: {}", path, e))?;
        config.base_url = Some(url.to_string());
        config.save_to(path)
    }

    /// Base URL to use: command-line flag, then environment, then config file
    pub fn resolve_base_url(&self, flag: Option<&str>) -> Option<String> {
        let env = std::env::var(BASE_URL_ENV).ok();
        pick_base_url(flag, env.as_deref(), self.base_url.as_deref())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("knowledge-bot").join("config.json"))
    }
}

fn pick_base_url(flag: Option<&str>, env: Option<&str>, file: Option<&str>) -> Option<String> {
    [flag, env, file]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|url| !url.is_empty())
        .map(str::to_string)
}
