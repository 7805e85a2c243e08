//! Host metrics types

use serde::{Deserialize, Serialize};

/// One sample of the history series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    /// Unix seconds
    pub timestamp: i64,
    /// CPU usage percent
    pub cpu: f64,
    /// Memory usage percent
    pub memory: f64,
    /// Root filesystem usage percent
    pub disk: f64,
}

impl DataPoint {
    pub fn new(timestamp: i64, cpu: f64, memory: f64, disk: f64) -> Self {
        Self {
            timestamp,
            cpu,
            memory,
            disk,
        }
    }

    /// Build a point from a full snapshot
    pub fn from_info(timestamp: i64, info: &SystemInfo) -> Self {
        Self::new(
            timestamp,
            info.cpu.usage_percent,
            info.memory.usage_percent,
            info.disk.usage_percent,
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CpuInfo {
    /// Logical core count
    pub cores: u32,
    pub usage_percent: f64,
    pub model_name: String,
}

/// Memory figures in bytes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryInfo {
    pub total: u64,
    pub available: u64,
    pub used: u64,
    pub usage_percent: f64,
}

/// Root filesystem figures in bytes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiskInfo {
    pub total: u64,
    pub free: u64,
    pub used: u64,
    pub usage_percent: f64,
}

/// Full host snapshot returned by `SystemMonitor::sample`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemInfo {
    pub cpu: CpuInfo,
    pub memory: MemoryInfo,
    pub disk: DiskInfo,
    pub os: String,
    pub hostname: String,
    /// Local wall time, `YYYY-MM-DD HH:MM:SS`
    pub time: String,
}

/// Percentage of `part` in `total`, 0 when `total` is 0
pub fn percent(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}
