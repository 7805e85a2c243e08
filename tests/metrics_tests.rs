//! Metrics Integration Tests
//!
//! Tests for the metrics history flow including:
//! - Capacity bounds and retention trimming
//! - Persistence across monitor restarts
//! - Wiring from application configuration

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::watch;

use ops_telemetry::config::AppConfig;
use ops_telemetry::metrics::{
    HistoryConfig, HistoryStore, MonitorConfig, SystemMonitor, SystemProbe,
};
use ops_telemetry::types::{CpuInfo, DataPoint, SystemInfo};
use ops_telemetry::utils::current_timestamp;

static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

fn test_data_dir() -> PathBuf {
    let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    PathBuf::from(format!(
        "target/test_metrics_{}_{}",
        std::process::id(),
        id
    ))
}

fn cleanup_dir(path: &Path) {
    let _ = fs::remove_dir_all(path);
}

/// Probe whose CPU reading climbs by one on every snapshot
struct CountingProbe(f64);

impl SystemProbe for CountingProbe {
    fn snapshot(&mut self) -> SystemInfo {
        self.0 += 1.0;
        SystemInfo {
            cpu: CpuInfo {
                cores: 2,
                usage_percent: self.0,
                model_name: "counting".to_string(),
            },
            ..Default::default()
        }
    }
}

#[test]
fn test_capacity_bound_holds() {
    let dir = test_data_dir();
    let store = HistoryStore::open(HistoryConfig::new(dir.join("history.json")).with_capacity(3));

    for ts in 1..=5 {
        store.append(DataPoint::new(ts, 0.0, 0.0, 0.0)).unwrap();
        assert!(store.len() <= 3);
    }

    let stamps: Vec<i64> = store.snapshot().iter().map(|p| p.timestamp).collect();
    assert_eq!(stamps, vec![3, 4, 5]);

    cleanup_dir(&dir);
}

#[test]
fn test_history_survives_restart() {
    let dir = test_data_dir();
    let config = MonitorConfig::new(HistoryConfig::new(dir.join("system").join("history.json")));
    let now = current_timestamp();

    {
        let monitor = SystemMonitor::with_probe(config.clone(), CountingProbe(0.0));
        let store = monitor.history_store();
        store.append(DataPoint::new(now - 600, 5.0, 6.0, 7.0)).unwrap();
        store.append(DataPoint::new(now - 60, 8.0, 9.0, 10.0)).unwrap();
    }

    let monitor = SystemMonitor::with_probe(config, CountingProbe(0.0));
    let points = monitor.history(1);

    assert_eq!(points.len(), 2);
    assert_eq!(points[1], DataPoint::new(now - 60, 8.0, 9.0, 10.0));

    cleanup_dir(&dir);
}

#[test]
fn test_trim_leaves_nothing_outside_window() {
    let dir = test_data_dir();
    let store =
        HistoryStore::open(HistoryConfig::new(dir.join("history.json")).with_retention_days(7));
    let now = current_timestamp();

    for days_ago in [10, 8, 6, 1, 0] {
        store
            .append(DataPoint::new(now - days_ago * 86_400, 0.0, 0.0, 0.0))
            .unwrap();
    }

    assert_eq!(store.trim_expired(now).unwrap(), 2);
    assert!(store.snapshot().iter().all(|p| p.timestamp >= now - 7 * 86_400));

    // The trimmed series is what a fresh store loads
    let reloaded = HistoryStore::open(HistoryConfig::new(dir.join("history.json")));
    assert_eq!(reloaded.len(), 3);

    cleanup_dir(&dir);
}

#[tokio::test]
async fn test_monitor_samples_in_background() {
    let dir = test_data_dir();
    let config = MonitorConfig::new(HistoryConfig::new(dir.join("history.json")))
        .with_interval(Duration::from_millis(25));
    let monitor = SystemMonitor::with_probe(config, CountingProbe(0.0));

    let (tx, rx) = watch::channel(false);
    let tasks = monitor.start(rx);
    tokio::time::sleep(Duration::from_millis(200)).await;
    tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(2), tasks.join())
        .await
        .unwrap();

    let points = monitor.history(1);
    assert!(points.len() >= 2);
    // Readings are taken in order
    assert!(points.windows(2).all(|w| w[0].cpu < w[1].cpu));

    let stopped_at = points.len();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(monitor.history(1).len(), stopped_at);

    cleanup_dir(&dir);
}

#[test]
fn test_config_drives_monitor() {
    let dir = test_data_dir();
    fs::create_dir_all(&dir).unwrap();
    let config_path = dir.join("config.json");
    fs::write(
        &config_path,
        format!(
            r#"{{"system": {{"data_file": "{}", "interval": 0, "capacity": 2}}}}"#,
            dir.join("history.json").display()
        ),
    )
    .unwrap();

    let config = AppConfig::from_file(&config_path).unwrap().validate().unwrap();
    let monitor_config = config.monitor_config();

    assert_eq!(monitor_config.interval, Duration::from_secs(60));
    assert_eq!(monitor_config.history.capacity, 2);

    let monitor = SystemMonitor::with_probe(monitor_config, CountingProbe(0.0));
    let now = current_timestamp();
    for offset in 0..4 {
        monitor
            .history_store()
            .append(DataPoint::new(now - 10 + offset, 0.0, 0.0, 0.0))
            .unwrap();
    }
    assert_eq!(monitor.history(1).len(), 2);
    assert!(dir.join("history.json").exists());

    cleanup_dir(&dir);
}
