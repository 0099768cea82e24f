//! Configuration management for the territory server.
//!
//! This module handles loading and validation of the server configuration
//! from a TOML file. Every section except `[logging]` may be left out and falls
//! back to its defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use territory_core::{PolicyOverrides, TerritoryConfig};
use tracing::info;

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_snapshot_file() -> String {
    "world.json".to_string()
}

fn default_snapshot_interval() -> u64 {
    300
}

fn default_denial_cooldown() -> u64 {
    1500
}

fn default_stats_interval() -> u64 {
    60
}

fn default_queue_capacity() -> usize {
    1024
}

/// Application configuration loaded from TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Logging configuration settings
    pub logging: LoggingSettings,
    /// Claim limits and name rules
    #[serde(default)]
    pub territory: TerritoryConfig,
    /// Snapshot location and schedule
    #[serde(default)]
    pub persistence: PersistenceSettings,
    /// Player-facing message settings
    #[serde(default)]
    pub notifications: NotificationSettings,
    /// Tick task settings
    #[serde(default)]
    pub world: WorldSettings,
    /// Periodic statistics
    #[serde(default)]
    pub monitoring: MonitoringSettings,
    /// Replacement rows for the zone policy table
    #[serde(default)]
    pub policy: PolicyOverrides,
}

/// Logging system configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level filter (trace, debug, info, warn, error)
    pub level: String,
    /// Whether to output logs in JSON format
    pub json_format: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistenceSettings {
    /// Directory holding the snapshot file
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_snapshot_file")]
    pub snapshot_file: String,
    /// Seconds between periodic snapshots
    #[serde(default = "default_snapshot_interval")]
    pub snapshot_interval_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSettings {
    /// Minimum time between two identical denial messages to one player
    #[serde(default = "default_denial_cooldown")]
    pub denial_cooldown_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldSettings {
    /// Jobs that may wait for the tick task before callers are back-pressured
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoringSettings {
    /// Seconds between decision statistics reports
    #[serde(default = "default_stats_interval")]
    pub stats_interval_secs: u64,
}

impl Default for PersistenceSettings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            snapshot_file: default_snapshot_file(),
            snapshot_interval_secs: default_snapshot_interval(),
        }
    }
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            denial_cooldown_ms: default_denial_cooldown(),
        }
    }
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
        }
    }
}

impl Default for MonitoringSettings {
    fn default() -> Self {
        Self {
            stats_interval_secs: default_stats_interval(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            logging: LoggingSettings {
                level: "info".to_string(),
                json_format: false,
            },
            territory: TerritoryConfig::default(),
            persistence: PersistenceSettings::default(),
            notifications: NotificationSettings::default(),
            world: WorldSettings::default(),
            monitoring: MonitoringSettings::default(),
            policy: PolicyOverrides::default(),
        }
    }
}

impl PersistenceSettings {
    pub fn snapshot_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join(&self.snapshot_file)
    }

    pub fn snapshot_interval(&self) -> Duration {
        Duration::from_secs(self.snapshot_interval_secs)
    }
}

impl NotificationSettings {
    pub fn denial_cooldown(&self) -> Duration {
        Duration::from_millis(self.denial_cooldown_ms)
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file.
    ///
    /// If the file doesn't exist, writes the default configuration to `path`
    /// and returns it.
    pub async fn load_from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        if path.exists() {
            let content = tokio::fs::read_to_string(path).await?;
            let config: AppConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let default_config = AppConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)?;
            tokio::fs::write(path, toml_content).await?;
            info!("📝 Created default configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    /// Validates the configuration for consistency and correctness.
    pub fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(format!(
                "Invalid log level: {}. Must be one of: {valid_levels:?}",
                &self.logging.level
            ));
        }

        self.territory
            .validate()
            .map_err(|e| format!("Invalid territory settings: {e}"))?;

        if self.persistence.data_dir.is_empty() {
            return Err("persistence.data_dir cannot be empty".to_string());
        }
        if self.persistence.snapshot_file.is_empty() {
            return Err("persistence.snapshot_file cannot be empty".to_string());
        }
        if self.persistence.snapshot_interval_secs == 0 {
            return Err("persistence.snapshot_interval_secs must be greater than 0".to_string());
        }
        if self.world.queue_capacity == 0 {
            return Err("world.queue_capacity must be greater than 0".to_string());
        }
        if self.monitoring.stats_interval_secs == 0 {
            return Err("monitoring.stats_interval_secs must be greater than 0".to_string());
        }

        Ok(())
    }
}
