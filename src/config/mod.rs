// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Configuration module

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Application name
    pub app_name: String,

    /// Log level
    pub log_level: String,

    /// Use the simulated fleet instead of the live telemetry API
    pub demo_mode: bool,

    /// Monitor loop and alert retention
    pub monitor: MonitorConfig,

    /// Telemetry API connection
    pub telemetry: TelemetryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "FleetWatch".to_string(),
            log_level: "info".to_string(),
            demo_mode: false,
            monitor: MonitorConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Load or create default configuration
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            let config = Self::default();

            // Create parent directories
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            config.save(path)?;
            Ok(config)
        }
    }

    /// Overlay `GEOTAB_*` environment variables on the telemetry section.
    ///
    /// Credentials are never written back to the config file by this call.
    pub fn apply_env(&mut self) {
        let env = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());

        if let Some(username) = env("GEOTAB_USERNAME") {
            self.telemetry.username = Some(username);
        }
        if let Some(password) = env("GEOTAB_PASSWORD") {
            self.telemetry.password = Some(password);
        }
        if let Some(database) = env("GEOTAB_DATABASE") {
            self.telemetry.database = database;
        }
        if let Some(server) = env("GEOTAB_SERVER") {
            self.telemetry.server = server;
        }
    }

    /// Reject values the monitor cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.monitor.interval_secs == 0 {
            return Err(anyhow!("monitor.interval_secs must be greater than zero"));
        }
        if self.monitor.max_alerts == 0 {
            return Err(anyhow!("monitor.max_alerts must be greater than zero"));
        }
        if self.monitor.default_alert_limit == 0
            || self.monitor.default_alert_limit > self.monitor.max_alert_limit
        {
            return Err(anyhow!(
                "monitor.default_alert_limit must be between 1 and monitor.max_alert_limit"
            ));
        }
        if self.telemetry.server.trim().is_empty() {
            return Err(anyhow!("telemetry.server must not be empty"));
        }
        Ok(())
    }

    /// Get configuration directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("fleetwatch"))
            .unwrap_or_else(|| PathBuf::from("./config"))
    }

    /// Get default configuration path
    pub fn default_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }
}

/// Monitor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Seconds between background cycles
    pub interval_secs: u64,

    /// Hard cap on retained alerts
    pub max_alerts: usize,

    /// Alerts returned when the caller gives no limit
    pub default_alert_limit: usize,

    /// Upper bound on a single alert query
    pub max_alert_limit: usize,

    /// Capacity of the alert broadcast channel
    pub event_capacity: usize,
}

impl MonitorConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            max_alerts: 1000,
            default_alert_limit: 50,
            max_alert_limit: 200,
            event_capacity: 256,
        }
    }
}

/// Telemetry API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// API host, e.g. `my.geotab.com`
    pub server: String,

    /// Database (tenant) name
    pub database: String,

    pub username: Option<String>,

    #[serde(skip_serializing)]
    pub password: Option<String>,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,

    /// Re-authenticate after this many seconds
    pub session_ttl_secs: u64,
}

impl TelemetryConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            server: "my.geotab.com".to_string(),
            database: "demo_fleetpulse".to_string(),
            username: None,
            password: None,
            request_timeout_secs: 30,
            session_ttl_secs: 3600,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.monitor.interval(), Duration::from_secs(60));
        assert_eq!(config.monitor.max_alerts, 1000);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str("[monitor]\ninterval_secs = 5\n").unwrap();
        assert_eq!(config.monitor.interval_secs, 5);
        assert_eq!(config.monitor.max_alerts, 1000);
        assert_eq!(config.telemetry.server, "my.geotab.com");
    }

    #[test]
    fn test_password_is_not_saved() {
        let mut config = Config::default();
        config.telemetry.password = Some("hunter2".to_string());
        let text = toml::to_string_pretty(&config).unwrap();
        assert!(!text.contains("hunter2"));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut config = Config::default();
        config.monitor.interval_secs = 0;
        assert!(config.validate().is_err());
    }
}
