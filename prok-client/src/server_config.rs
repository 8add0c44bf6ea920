use crate::api::DEFAULT_SERVER_URL;
use crate::config::{ConfigManager, ServerConfig};
use anyhow::Result;

/// Environment variable that overrides the saved server URL
pub const SERVER_URL_ENV: &str = "PROK_SERVER_URL";

/// Server configuration utility for managing server URL settings
pub struct ServerConfigManager {
    config_manager: ConfigManager,
}

impl ServerConfigManager {
    pub fn new() -> Result<Self> {
        Ok(Self::with_config(ConfigManager::new()?))
    }

    pub fn with_config(config_manager: ConfigManager) -> Self {
        Self { config_manager }
    }

    /// Determine the server URL to use based on priority:
    /// 1. CLI argument (highest priority)
    /// 2. Environment variable PROK_SERVER_URL
    /// 3. Saved configuration file
    /// 4. Default local backend (lowest priority)
    pub fn determine_server_url(&self, cli_override: Option<String>) -> Result<String> {
        self.resolve(cli_override, std::env::var(SERVER_URL_ENV).ok())
    }

    fn resolve(&self, cli_override: Option<String>, env_url: Option<String>) -> Result<String> {
        if let Some(url) = cli_override.filter(|u| !u.trim().is_empty()) {
            return Ok(url);
        }

        if let Some(url) = env_url.filter(|u| !u.trim().is_empty()) {
            return Ok(url);
        }

        if let Some(config) = self.config_manager.load_server_config()? {
            return Ok(config.server_url);
        }

        Ok(DEFAULT_SERVER_URL.to_string())
    }

    /// Save server URL to configuration file
    pub fn save_server_url(&self, server_url: String) -> Result<()> {
        let config = ServerConfig {
            server_url,
            last_updated: chrono::Utc::now(),
        };
        self.config_manager.save_server_config(&config)
    }

    /// Get a display-friendly description of the current server configuration
    pub fn get_server_description(&self, current_url: &str) -> String {
        if current_url == DEFAULT_SERVER_URL {
            "Local Development Server (default)".to_string()
        } else if current_url.contains("localhost") || current_url.contains("127.0.0.1") {
            "Local Development Server (custom)".to_string()
        } else {
            "Custom Server".to_string()
        }
    }
}
