//! Host introspection
//!
//! `SystemProbe` is the seam between the sampler and the operating system.
//! `SysinfoProbe` is the real implementation; tests plug in fixed values.

use std::path::{Path, PathBuf};

use chrono::Local;
use sysinfo::{Disks, System};

use crate::types::{percent, CpuInfo, DiskInfo, MemoryInfo, SystemInfo};
use crate::utils::time::format_display;

/// Source of host resource snapshots
pub trait SystemProbe: Send {
    /// Capture the current CPU, memory and disk state
    fn snapshot(&mut self) -> SystemInfo;
}

/// `SystemProbe` backed by the `sysinfo` crate
///
/// CPU usage is measured between two refreshes, so the value reported by a
/// snapshot covers the time since the previous one. The very first snapshot
/// after construction may read 0.
pub struct SysinfoProbe {
    system: System,
    disks: Disks,
    root: PathBuf,
}

impl SysinfoProbe {
    /// Probe reporting disk usage of the root filesystem
    pub fn new() -> Self {
        Self::with_root("/")
    }

    /// Probe reporting disk usage of the filesystem holding `root`
    pub fn with_root<P: AsRef<Path>>(root: P) -> Self {
        let mut system = System::new();
        system.refresh_cpu();
        system.refresh_memory();

        Self {
            system,
            disks: Disks::new_with_refreshed_list(),
            root: root.as_ref().to_path_buf(),
        }
    }

    fn cpu(&mut self) -> CpuInfo {
        self.system.refresh_cpu();

        let cpus = self.system.cpus();
        let model_name = cpus
            .first()
            .map(|c| c.brand().trim().to_string())
            .unwrap_or_default();

        CpuInfo {
            cores: cpus.len() as u32,
            usage_percent: f64::from(self.system.global_cpu_info().cpu_usage()),
            model_name,
        }
    }

    fn memory(&mut self) -> MemoryInfo {
        self.system.refresh_memory();

        let total = self.system.total_memory();
        let used = self.system.used_memory();

        MemoryInfo {
            total,
            available: self.system.available_memory(),
            used,
            usage_percent: percent(used, total),
        }
    }

    fn disk(&mut self) -> DiskInfo {
        self.disks.refresh();

        // Deepest mount point containing the root path
        let disk = self
            .disks
            .iter()
            .filter(|d| self.root.starts_with(d.mount_point()))
            .max_by_key(|d| d.mount_point().components().count());

        match disk {
            Some(disk) => {
                let total = disk.total_space();
                let free = disk.available_space();
                let used = total.saturating_sub(free);
                DiskInfo {
                    total,
                    free,
                    used,
                    usage_percent: percent(used, total),
                }
            }
            None => {
                tracing::warn!(root = %self.root.display(), "no filesystem found for disk metrics");
                DiskInfo::default()
            }
        }
    }
}

impl Default for SysinfoProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemProbe for SysinfoProbe {
    fn snapshot(&mut self) -> SystemInfo {
        SystemInfo {
            cpu: self.cpu(),
            memory: self.memory(),
            disk: self.disk(),
            os: std::env::consts::OS.to_string(),
            hostname: System::host_name().unwrap_or_default(),
            time: format_display(&Local::now()),
        }
    }
}
