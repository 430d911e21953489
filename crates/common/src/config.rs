//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Avatar storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Notification sweep scheduling configuration.
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of this instance.
    pub url: String,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Avatar storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Base directory for uploaded files.
    #[serde(default = "default_storage_path")]
    pub path: String,
    /// Base URL under which uploaded files are served.
    #[serde(default = "default_storage_base_url")]
    pub base_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
            base_url: default_storage_base_url(),
        }
    }
}

/// Notification sweep scheduling configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Whether the daily sweeps run at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// IANA timezone name used for calendar-day windows (e.g. `America/Sao_Paulo`).
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Local wall-clock time of the due-soon sweep, `HH:MM`.
    #[serde(default = "default_due_soon_at")]
    pub due_soon_at: String,
    /// Local wall-clock time of the overdue sweep, `HH:MM`.
    #[serde(default = "default_overdue_at")]
    pub overdue_at: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timezone: default_timezone(),
            due_soon_at: default_due_soon_at(),
            overdue_at: default_overdue_at(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    100
}

const fn default_min_connections() -> u32 {
    5
}

fn default_storage_path() -> String {
    "./uploads".to_string()
}

fn default_storage_base_url() -> String {
    "/uploads".to_string()
}

const fn default_true() -> bool {
    true
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_due_soon_at() -> String {
    "09:00".to_string()
}

fn default_overdue_at() -> String {
    "10:00".to_string()
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `DEVTODO_ENV`)
    /// 3. Environment variables with `DEVTODO_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("DEVTODO_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("DEVTODO")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("DEVTODO")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheduler_defaults() {
        let scheduler = SchedulerConfig::default();
        assert!(scheduler.enabled);
        assert_eq!(scheduler.timezone, "UTC");
        assert_eq!(scheduler.due_soon_at, "09:00");
        assert_eq!(scheduler.overdue_at, "10:00");
    }

    #[test]
    fn test_storage_defaults() {
        let storage = StorageConfig::default();
        assert_eq!(storage.path, "./uploads");
        assert_eq!(storage.base_url, "/uploads");
    }
}
