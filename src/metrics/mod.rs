//! Host Metrics - periodic sampling into a bounded history
//!
//! - `probe`: reads CPU, memory and disk figures from the OS
//! - `history`: capacity-bounded series persisted as a JSON array
//! - `sampler`: the sampling and daily trim background tasks
//!
//! `SystemMonitor` ties them together and owns the task handles' lifecycle
//! through a `watch` shutdown channel.

mod error;

pub mod history;
pub mod probe;
pub mod sampler;

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::types::{DataPoint, SystemInfo};
use crate::utils::time::current_timestamp;

pub use error::{MetricsError, MetricsResult};
pub use history::{clamp_hours, HistoryConfig, HistoryStore};
pub use probe::{SysinfoProbe, SystemProbe};
pub use sampler::SharedProbe;

/// Default sampling period in seconds
pub const DEFAULT_INTERVAL_SECS: u64 = 60;

/// Local hour at which the daily history trim runs
pub const DEFAULT_TRIM_HOUR: u32 = 1;

/// Configuration for the SystemMonitor
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub interval: Duration,
    pub trim_hour: u32,
    pub history: HistoryConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_INTERVAL_SECS),
            trim_hour: DEFAULT_TRIM_HOUR,
            history: HistoryConfig::default(),
        }
    }
}

impl MonitorConfig {
    pub fn new(history: HistoryConfig) -> Self {
        Self {
            history,
            ..Default::default()
        }
    }

    /// Set the sampling period; zero falls back to the default
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = if interval.is_zero() {
            Duration::from_secs(DEFAULT_INTERVAL_SECS)
        } else {
            interval
        };
        self
    }
}

/// Handles of the running background tasks
pub struct MonitorTasks {
    pub sampler: JoinHandle<()>,
    pub retention: JoinHandle<()>,
}

impl MonitorTasks {
    /// Wait for both tasks to finish
    pub async fn join(self) {
        if let Err(e) = self.sampler.await {
            tracing::error!(error = %e, "metrics sampler panicked");
        }
        if let Err(e) = self.retention.await {
            tracing::error!(error = %e, "metrics retention task panicked");
        }
    }
}

/// The host metrics service
pub struct SystemMonitor {
    config: MonitorConfig,
    probe: SharedProbe,
    history: Arc<HistoryStore>,
}

impl SystemMonitor {
    /// Monitor backed by `sysinfo`, seeded from the configured data file
    pub fn new(config: MonitorConfig) -> Self {
        Self::with_probe(config, SysinfoProbe::new())
    }

    /// Monitor with a custom probe
    pub fn with_probe<P: SystemProbe + 'static>(config: MonitorConfig, probe: P) -> Self {
        let history = Arc::new(HistoryStore::open(config.history.clone()));
        let probe: Box<dyn SystemProbe> = Box::new(probe);

        Self {
            config,
            probe: Arc::new(Mutex::new(probe)),
            history,
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn history_store(&self) -> &Arc<HistoryStore> {
        &self.history
    }

    /// Current host snapshot; blocks while the probe refreshes
    pub fn sample(&self) -> SystemInfo {
        self.probe.lock().snapshot()
    }

    /// Points from the last `hours`, clamped to `[1, 168]`
    pub fn history(&self, hours: i64) -> Vec<DataPoint> {
        self.history.history_at(hours, current_timestamp())
    }

    /// Spawn the sampler and the retention task on the current runtime
    pub fn start(&self, shutdown: watch::Receiver<bool>) -> MonitorTasks {
        let sampler = tokio::spawn(sampler::run_sampler(
            Arc::clone(&self.probe),
            Arc::clone(&self.history),
            self.config.interval,
            shutdown.clone(),
        ));
        let retention = tokio::spawn(sampler::run_retention(
            Arc::clone(&self.history),
            self.config.trim_hour,
            shutdown,
        ));

        MonitorTasks { sampler, retention }
    }
}
