//! Bounded, persisted series of metric samples

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::{Mutex, RwLock};

use super::error::MetricsResult;
use crate::types::DataPoint;
use crate::utils::atomic::{atomic_write_json, cleanup_temp_file};

/// Seven days of one-minute samples
pub const DEFAULT_CAPACITY: usize = 10080;

/// Points older than this are dropped by the daily trim
pub const DEFAULT_RETENTION_DAYS: i64 = 7;

/// Bounds applied to a `history(hours)` request
pub const MIN_HISTORY_HOURS: i64 = 1;
pub const MAX_HISTORY_HOURS: i64 = 168;

const SECS_PER_HOUR: i64 = 3600;
const SECS_PER_DAY: i64 = 86_400;

/// Clamp a requested window to `[1, 168]` hours
pub fn clamp_hours(hours: i64) -> i64 {
    hours.clamp(MIN_HISTORY_HOURS, MAX_HISTORY_HOURS)
}

/// Configuration for the HistoryStore
#[derive(Debug, Clone)]
pub struct HistoryConfig {
    /// Maximum number of retained points
    pub capacity: usize,
    /// Age limit enforced by `trim_expired`
    pub retention_days: i64,
    /// JSON file the series is persisted to; `None` keeps it in memory only
    pub data_file: Option<PathBuf>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            retention_days: DEFAULT_RETENTION_DAYS,
            data_file: None,
        }
    }
}

impl HistoryConfig {
    /// Create config persisting to `data_file`
    pub fn new<P: Into<PathBuf>>(data_file: P) -> Self {
        Self {
            data_file: Some(data_file.into()),
            ..Default::default()
        }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    pub fn with_retention_days(mut self, days: i64) -> Self {
        self.retention_days = days.max(1);
        self
    }

    fn retention_secs(&self) -> i64 {
        self.retention_days.saturating_mul(SECS_PER_DAY)
    }
}

/// Sliding window of samples, oldest first; the oldest are dropped past capacity
///
/// Readers take the shared lock and get copies. Persistence snapshots under
/// the shared lock and writes outside it; `persist_lock` keeps concurrent
/// writers of the file in order.
pub struct HistoryStore {
    config: HistoryConfig,
    points: RwLock<Vec<DataPoint>>,
    persist_lock: Mutex<()>,
}

impl HistoryStore {
    /// Empty store; nothing is read from disk
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            config,
            points: RwLock::new(Vec::new()),
            persist_lock: Mutex::new(()),
        }
    }

    /// Store seeded from the persistence file
    ///
    /// A missing or unparsable file yields an empty store.
    pub fn open(config: HistoryConfig) -> Self {
        let mut points = match &config.data_file {
            Some(path) => load_points(path),
            None => Vec::new(),
        };
        truncate_front(&mut points, config.capacity);

        Self {
            points: RwLock::new(points),
            ..Self::new(config)
        }
    }

    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.points.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.read().is_empty()
    }

    /// Add a point, evict the oldest beyond capacity, then persist
    pub fn append(&self, point: DataPoint) -> MetricsResult<()> {
        {
            let mut points = self.points.write();
            points.push(point);
            truncate_front(&mut points, self.config.capacity);
        }

        self.persist()
    }

    /// Drop points with `timestamp < cutoff`; persists only when something went
    pub fn trim_older_than(&self, cutoff: i64) -> MetricsResult<usize> {
        let removed = {
            let mut points = self.points.write();
            let before = points.len();
            points.retain(|p| p.timestamp >= cutoff);
            before - points.len()
        };

        if removed > 0 {
            tracing::info!(removed, cutoff, "trimmed expired metric points");
            self.persist()?;
        }

        Ok(removed)
    }

    /// Drop points older than the retention window as of `now` (unix seconds)
    pub fn trim_expired(&self, now: i64) -> MetricsResult<usize> {
        self.trim_older_than(now.saturating_sub(self.config.retention_secs()))
    }

    /// Copy of every point with `timestamp >= from`
    pub fn since(&self, from: i64) -> Vec<DataPoint> {
        self.points
            .read()
            .iter()
            .filter(|p| p.timestamp >= from)
            .copied()
            .collect()
    }

    /// Points from the last `hours` (clamped) as of `now`
    pub fn history_at(&self, hours: i64, now: i64) -> Vec<DataPoint> {
        self.since(now.saturating_sub(clamp_hours(hours) * SECS_PER_HOUR))
    }

    /// Copy of the whole series
    pub fn snapshot(&self) -> Vec<DataPoint> {
        self.points.read().clone()
    }

    /// Write the series to the data file, if one is configured
    pub fn persist(&self) -> MetricsResult<()> {
        let Some(path) = &self.config.data_file else {
            return Ok(());
        };

        let _guard = self.persist_lock.lock();
        let points = self.snapshot();
        atomic_write_json(path, &points)?;

        tracing::trace!(path = %path.display(), points = points.len(), "persisted metrics history");
        Ok(())
    }
}

fn truncate_front(points: &mut Vec<DataPoint>, capacity: usize) {
    if points.len() > capacity {
        let excess = points.len() - capacity;
        points.drain(..excess);
    }
}

fn load_points(path: &Path) -> Vec<DataPoint> {
    match cleanup_temp_file(path) {
        Ok(true) => tracing::warn!(path = %path.display(), "removed stale history temp file"),
        Ok(false) => {}
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to remove history temp file")
        }
    }

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read metrics history, starting empty"
            );
            return Vec::new();
        }
    };

    match serde_json::from_str::<Vec<DataPoint>>(&content) {
        Ok(points) => {
            tracing::info!(path = %path.display(), points = points.len(), "loaded metrics history");
            points
        }
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "unparsable metrics history, starting empty"
            );
            Vec::new()
        }
    }
}
