use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::api::{DEFAULT_PER_PAGE, DEFAULT_SERVER_URL};
use crate::feed::FilterState;

/// Feed preferences remembered per user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    #[serde(default)]
    pub filters: FilterState,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_per_page() -> u32 {
    DEFAULT_PER_PAGE
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            filters: FilterState::default(),
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

/// Server configuration stored locally
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub server_url: String,
    pub last_updated: chrono::DateTime<chrono::Utc>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            last_updated: chrono::Utc::now(),
        }
    }
}

/// Configuration manager for the .prok directory
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: PathBuf,
}

impl ConfigManager {
    /// Create a config manager rooted at `~/.prok`
    pub fn new() -> Result<Self> {
        Self::at(Self::get_config_dir()?)
    }

    /// Create a config manager rooted at an explicit directory
    pub fn at(config_dir: impl Into<PathBuf>) -> Result<Self> {
        let config_dir = config_dir.into();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir).context("Failed to create .prok directory")?;
        }

        Ok(Self { config_dir })
    }

    fn get_config_dir() -> Result<PathBuf> {
        let home_dir = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home_dir.join(".prok"))
    }

    pub fn config_dir(&self) -> &PathBuf {
        &self.config_dir
    }

    /// Where the bearer token lives
    pub fn session_file(&self) -> PathBuf {
        self.config_dir.join("session")
    }

    fn get_preferences_file(&self, user_id: i64) -> PathBuf {
        self.config_dir.join(format!("prefs_{}.json", user_id))
    }

    /// Save user preferences
    pub fn save_preferences(&self, user_id: i64, prefs: &UserPreferences) -> Result<()> {
        let prefs_file = self.get_preferences_file(user_id);
        let json =
            serde_json::to_string_pretty(prefs).context("Failed to serialize preferences")?;

        fs::write(&prefs_file, json).context("Failed to write preferences file")?;
        log_debug!("Saved preferences for user {}", user_id);

        Ok(())
    }

    /// Load user preferences
    pub fn load_preferences(&self, user_id: i64) -> Result<Option<UserPreferences>> {
        let prefs_file = self.get_preferences_file(user_id);

        if !prefs_file.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&prefs_file).context("Failed to read preferences file")?;

        let prefs: UserPreferences =
            serde_json::from_str(&json).context("Failed to parse preferences")?;

        Ok(Some(prefs))
    }

    fn get_server_config_file(&self) -> PathBuf {
        self.config_dir.join("server_config.json")
    }

    /// Save server configuration
    pub fn save_server_config(&self, config: &ServerConfig) -> Result<()> {
        let config_file = self.get_server_config_file();
        let json =
            serde_json::to_string_pretty(config).context("Failed to serialize server config")?;

        fs::write(&config_file, json).context("Failed to write server config file")?;

        Ok(())
    }

    /// Load server configuration
    pub fn load_server_config(&self) -> Result<Option<ServerConfig>> {
        let config_file = self.get_server_config_file();

        if !config_file.exists() {
            return Ok(None);
        }

        let json =
            fs::read_to_string(&config_file).context("Failed to read server config file")?;

        let config: ServerConfig =
            serde_json::from_str(&json).context("Failed to parse server config")?;

        Ok(Some(config))
    }
}
