//! Ops Telemetry
//!
//! Operational telemetry for a small file-hosting server: an append-only,
//! day-partitioned audit log of user, file, system and access events, plus a
//! rolling history of host CPU, memory and disk utilization.
//!
//! # Modules
//!
//! - `types`: Core data structures (LogEntry, query params/results, DataPoint)
//! - `audit`: Audit log writer, queries, statistics and retention sweep
//! - `metrics`: Host probe, bounded history store and background sampling
//! - `config`: JSON + environment configuration
//! - `api`: Axum REST endpoints over both subsystems
//! - `utils`: Atomic file writes and time helpers
//!
//! # Example
//!
//! ```no_run
//! use ops_telemetry::{AuditLog, AuditLogConfig, LogQueryParams};
//!
//! let audit = AuditLog::new(AuditLogConfig::new("./logs"));
//! audit.log_user_operation("10.0.0.7", "curl/8.0", "login", "user admin").unwrap();
//!
//! let page = audit.query(&LogQueryParams::new().with_ip("10.0.0.7")).unwrap();
//! println!("{} matching entries", page.total);
//! ```

pub mod api;
pub mod audit;
pub mod config;
pub mod metrics;
pub mod types;
pub mod utils;

// Re-export commonly used items at crate root
pub use audit::{AuditError, AuditLog, AuditLogConfig, AuditResult};
pub use config::{AppConfig, ConfigError};
pub use metrics::{HistoryConfig, MetricsError, MonitorConfig, SystemMonitor, SystemProbe};
pub use types::{
    DataPoint, LogEntry, LogLevel, LogQueryParams, LogQueryResult, LogStats, LogType, SystemInfo,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
