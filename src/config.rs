//! Application configuration
//!
//! Loaded from a JSON file, then overridden from the environment. Every field
//! has a default, so a missing file or a partial one is fine.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::audit::AuditLogConfig;
use crate::metrics::history::{DEFAULT_CAPACITY, DEFAULT_RETENTION_DAYS};
use crate::metrics::{HistoryConfig, MonitorConfig, DEFAULT_INTERVAL_SECS};
use crate::types::LogLevel;

/// Env var naming the config file
pub const CONFIG_PATH_ENV: &str = "TELEMETRY_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "./config/config.json";

pub const PORT_ENV: &str = "TELEMETRY_PORT";
pub const LOG_DIR_ENV: &str = "TELEMETRY_LOG_DIR";
pub const LOG_LEVEL_ENV: &str = "TELEMETRY_LOG_LEVEL";
pub const DATA_FILE_ENV: &str = "TELEMETRY_DATA_FILE";
pub const INTERVAL_ENV: &str = "TELEMETRY_INTERVAL";

/// Console filter used when `RUST_LOG` is unset
///
/// The `audit` target carries the mirror of every persisted entry, including
/// DEBUG ones, so it is let through at every level.
pub const DEFAULT_LOG_FILTER: &str = "info,audit=trace";

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid log level: {0}")]
    InvalidLevel(String),

    #[error("invalid value for {name}: {value}")]
    InvalidEnv { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: "8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub dir: PathBuf,
    /// Minimum persisted level, matched case-insensitively
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./logs"),
            level: LogLevel::Info.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub data_file: PathBuf,
    /// Sampling period in seconds
    pub interval: u64,
    pub capacity: usize,
    pub retention_days: i64,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("./system/system_history.json"),
            interval: DEFAULT_INTERVAL_SECS,
            capacity: DEFAULT_CAPACITY,
            retention_days: DEFAULT_RETENTION_DAYS,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub log: LogConfig,
    pub system: SystemConfig,
}

impl AppConfig {
    /// Load from `TELEMETRY_CONFIG` (or the default path), then apply env
    /// overrides and validate
    pub fn load() -> ConfigResult<Self> {
        let path = env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = Self::from_file(path)?;
        config.apply_overrides(|name| env::var(name).ok())?;
        config.validate()
    }

    /// Read a JSON config file; a missing file yields defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "config file not found, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply overrides from a variable lookup (the process env in production)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup(PORT_ENV) {
            self.server.port = port;
        }
        if let Some(dir) = lookup(LOG_DIR_ENV) {
            self.log.dir = PathBuf::from(dir);
        }
        if let Some(level) = lookup(LOG_LEVEL_ENV) {
            self.log.level = level;
        }
        if let Some(file) = lookup(DATA_FILE_ENV) {
            self.system.data_file = PathBuf::from(file);
        }
        if let Some(interval) = lookup(INTERVAL_ENV) {
            self.system.interval = interval
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidEnv {
                    name: INTERVAL_ENV,
                    value: interval.clone(),
                })?;
        }
        Ok(())
    }

    /// Check the level and replace zero interval/capacity with defaults
    pub fn validate(mut self) -> ConfigResult<Self> {
        self.min_level()?;

        if self.system.interval == 0 {
            self.system.interval = DEFAULT_INTERVAL_SECS;
        }
        if self.system.capacity == 0 {
            self.system.capacity = DEFAULT_CAPACITY;
        }
        if self.system.retention_days <= 0 {
            self.system.retention_days = DEFAULT_RETENTION_DAYS;
        }

        Ok(self)
    }

    pub fn min_level(&self) -> ConfigResult<LogLevel> {
        self.log
            .level
            .parse()
            .map_err(|_| ConfigError::InvalidLevel(self.log.level.clone()))
    }

    /// Address the HTTP server binds to
    pub fn bind_addr(&self) -> String {
        format!("0.0.0.0:{}", self.server.port)
    }

    pub fn audit_config(&self) -> ConfigResult<AuditLogConfig> {
        Ok(AuditLogConfig::new(&self.log.dir).with_min_level(self.min_level()?))
    }

    pub fn monitor_config(&self) -> MonitorConfig {
        let history = HistoryConfig::new(&self.system.data_file)
            .with_capacity(self.system.capacity)
            .with_retention_days(self.system.retention_days);

        MonitorConfig::new(history).with_interval(Duration::from_secs(self.system.interval))
    }
}
