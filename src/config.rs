//! Production configuration system
//!
//! Provides centralized configuration management with:
//! - Environment variable support
//! - Config file loading (optional)
//! - Runtime defaults
//! - Validation and type safety
//!
//! The loaded [`Config`] is passed explicitly to the commands that need it.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_API_BASE_URL: &str = "https://claude.ai/api";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging configuration
    pub logging: LoggingConfig,

    /// Polling and process-control timings
    pub monitor: MonitorConfig,

    /// Paths configuration
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub output: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub refresh_interval_secs: u64,
    pub request_timeout_secs: u64,
    pub startup_delay_ms: u64,
    pub stop_wait_ms: u64,
    pub api_base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub pid_file: PathBuf,
    pub session_file: PathBuf,
    pub status_file: PathBuf,
    pub log_directory: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "WARN".to_string(),
            format: "pretty".to_string(),
            output: "console".to_string(),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 30,
            request_timeout_secs: 10,
            startup_delay_ms: 100,
            stop_wait_ms: 500,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            pid_file: home.join(".claude-monitor-lite.pid"),
            session_file: home.join(".claude-monitor-lite.json"),
            status_file: home.join(".claude-monitor-lite.status.json"),
            log_directory: dirs::cache_dir()
                .unwrap_or_else(|| home.join(".cache"))
                .join("claude-monitor-lite")
                .join("logs"),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            monitor: MonitorConfig::default(),
            paths: PathsConfig::default(),
        }
    }
}

impl MonitorConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    /// Per-request timeout, never longer than one refresh interval
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.min(self.refresh_interval_secs))
    }

    pub fn startup_delay(&self) -> Duration {
        Duration::from_millis(self.startup_delay_ms)
    }

    pub fn stop_wait(&self) -> Duration {
        Duration::from_millis(self.stop_wait_ms)
    }
}

impl Config {
    /// Load configuration from environment, file, and defaults
    pub fn load() -> Result<Self> {
        let mut config = Config::default();

        // Try to load from config file if it exists
        let config_paths = [
            PathBuf::from("claude-monitor-lite.toml"),
            PathBuf::from(".claude-monitor-lite.toml"),
            dirs::config_dir()
                .map(|d| d.join("claude-monitor-lite").join("config.toml"))
                .unwrap_or_default(),
        ];

        for path in &config_paths {
            if path.is_file() {
                info!(config_file = %path.display(), "Loading configuration from file");
                config = Self::load_from_file(path)?;
                break;
            }
        }

        // Override with environment variables
        config.apply_env_overrides()?;

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        // Logging overrides
        if let Ok(val) = env::var("LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = env::var("LOG_FORMAT") {
            self.logging.format = val;
        }
        if let Ok(val) = env::var("LOG_OUTPUT") {
            self.logging.output = val;
        }

        // Monitor overrides
        if let Ok(val) = env::var("CLAUDE_MONITOR_REFRESH_SECS") {
            self.monitor.refresh_interval_secs = val
                .parse()
                .context("Invalid CLAUDE_MONITOR_REFRESH_SECS")?;
        }
        if let Ok(val) = env::var("CLAUDE_MONITOR_TIMEOUT_SECS") {
            self.monitor.request_timeout_secs = val
                .parse()
                .context("Invalid CLAUDE_MONITOR_TIMEOUT_SECS")?;
        }
        if let Ok(val) = env::var("CLAUDE_MONITOR_API_URL") {
            self.monitor.api_base_url = val;
        }

        // Path overrides
        if let Ok(val) = env::var("CLAUDE_MONITOR_PID_FILE") {
            self.paths.pid_file = PathBuf::from(val);
        }
        if let Ok(val) = env::var("CLAUDE_MONITOR_SESSION_FILE") {
            self.paths.session_file = PathBuf::from(val);
        }
        if let Ok(val) = env::var("CLAUDE_MONITOR_STATUS_FILE") {
            self.paths.status_file = PathBuf::from(val);
        }
        if let Ok(val) = env::var("CLAUDE_MONITOR_LOG_DIR") {
            self.paths.log_directory = PathBuf::from(val);
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.monitor.refresh_interval_secs == 0 {
            return Err(anyhow::anyhow!("Refresh interval must be at least 1 second"));
        }

        if self.monitor.request_timeout_secs == 0 {
            return Err(anyhow::anyhow!("Request timeout must be at least 1 second"));
        }

        if self.monitor.refresh_interval_secs < 10 {
            warn!(
                refresh_interval_secs = self.monitor.refresh_interval_secs,
                "Refresh interval is very short, the usage endpoint may rate limit"
            );
        }

        if self.monitor.api_base_url.trim().is_empty() {
            return Err(anyhow::anyhow!("API base URL cannot be empty"));
        }

        match self.logging.format.as_str() {
            "pretty" | "json" => {}
            other => return Err(anyhow::anyhow!("Unknown log format: {}", other)),
        }

        match self.logging.output.as_str() {
            "console" | "file" | "both" => {}
            other => return Err(anyhow::anyhow!("Unknown log output: {}", other)),
        }

        Ok(())
    }

    /// Save current configuration to file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        info!(path = %path.display(), "Configuration saved to file");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.logging.level, "WARN");
        assert_eq!(config.monitor.refresh_interval_secs, 30);
        assert_eq!(config.monitor.request_timeout(), Duration::from_secs(10));
        assert!(config
            .paths
            .pid_file
            .ends_with(".claude-monitor-lite.pid"));
    }

    #[test]
    fn test_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.monitor.refresh_interval_secs = 0;
        assert!(config.validate().is_err());

        config = Config::default();
        config.monitor.request_timeout_secs = 0;
        assert!(config.validate().is_err());

        config = Config::default();
        config.logging.format = "xml".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_request_timeout_clamped_to_interval() {
        let mut config = Config::default();
        config.monitor.refresh_interval_secs = 5;
        config.monitor.request_timeout_secs = 60;
        assert!(config.validate().is_ok());
        assert_eq!(config.monitor.request_timeout(), Duration::from_secs(5));
    }
}
