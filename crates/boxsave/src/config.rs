//! Configuration loading

use anyhow::{Context, Result};
use boxsave_client::{ServerConfig, Timeouts};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    #[serde(default)]
    pub cleanup: CleanupConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Box server configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerSection {
    /// Base URL of the box server
    #[serde(default)]
    pub url: Option<String>,
}

/// Network timeouts, in seconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    #[serde(default = "default_timeout_secs")]
    pub connect_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub read_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: default_timeout_secs(),
            read_secs: default_timeout_secs(),
            request_secs: default_timeout_secs(),
        }
    }
}

impl From<&TimeoutConfig> for Timeouts {
    fn from(config: &TimeoutConfig) -> Self {
        Timeouts {
            connect: Duration::from_secs(config.connect_secs),
            read: Duration::from_secs(config.read_secs),
            request: Duration::from_secs(config.request_secs),
        }
    }
}

/// Retention configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleanupConfig {
    /// Number of most recent versions to keep after a push
    #[serde(default)]
    pub keep: Option<usize>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &str) -> Result<Self> {
        let config_path = Path::new(path);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))?;

        info!("Loaded configuration from {}", path);
        Ok(config)
    }

    /// Resolve the box server settings, preferring an explicit URL
    pub fn server_config(&self, url_override: Option<&str>) -> ServerConfig {
        let base_url = url_override
            .or(self.server.url.as_deref())
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(str::to_string);

        ServerConfig {
            base_url,
            timeouts: Timeouts::from(&self.timeouts),
        }
    }
}
