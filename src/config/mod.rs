//! Configuration management.
//!
//! Configuration is read from `~/.config/newswire/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is
//! created. The API key can always be overridden with the `NEWSWIRE_API_KEY`
//! environment variable.

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::app::{NewswireError, Result};
use crate::feed::http::DEFAULT_BASE_URL;

pub const API_KEY_ENV: &str = "NEWSWIRE_API_KEY";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Feed provider API key.
    pub api_key: String,
    /// Feed provider base URL.
    pub base_url: String,
    /// Default category for fetch/resync runs.
    pub category: Option<String>,
    /// Default language for fetch/resync runs.
    pub language: Option<String>,
    /// Default page size for fetch/resync runs.
    pub page_size: u32,
    /// Minimum spacing between page fetches, in seconds.
    pub page_delay_secs: u64,
    /// Database path override. Defaults to the platform data directory.
    pub db_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            category: None,
            language: Some("en".to_string()),
            page_size: 10,
            page_delay_secs: 2,
            db_path: None,
        }
    }
}

impl Config {
    /// Load configuration from the default path, creating a commented
    /// default file when none exists. Missing fields use default values.
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)?;
        let config: Config = toml::from_str(&content).map_err(|e| {
            NewswireError::Config(format!("{}: {}", config_path.display(), e))
        })?;

        Ok(config)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| NewswireError::Config("Could not find config directory".into()))?;
        Ok(config_dir.join("newswire").join("config.toml"))
    }

    /// API key with the environment variable taking precedence.
    pub fn resolved_api_key(&self) -> String {
        std::env::var(API_KEY_ENV).unwrap_or_else(|_| self.api_key.clone())
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_secs(self.page_delay_secs)
    }

    fn create_default_config(path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = fs::File::create(path)?;
        file.write_all(Self::default_config_content().as_bytes())?;

        Ok(())
    }

    fn default_config_content() -> String {
        r#"# Newswire configuration
#
# api_key: feed provider API key. Can also be supplied via the
# NEWSWIRE_API_KEY environment variable, which takes precedence.

api_key = ""

# Feed provider base URL.
base_url = "https://gnews.io/api/v4"

# Defaults for fetch/resync runs. Categories follow the provider taxonomy
# (general, world, nation, business, technology, entertainment, sports,
# science, health).
# category = "general"
language = "en"
page_size = 10

# Minimum spacing between page fetches, in seconds.
page_delay_secs = 2

# Database path override. Defaults to the platform data directory.
# db_path = "/path/to/newswire.db"
"#
        .to_string()
    }
}
