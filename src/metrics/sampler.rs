//! Background tasks feeding and trimming the history
//!
//! Both loops stop as soon as the shutdown channel flips to `true` or its
//! sender is dropped.

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use super::error::MetricsResult;
use super::history::HistoryStore;
use super::probe::SystemProbe;
use crate::types::DataPoint;
use crate::utils::time::{current_timestamp, next_daily_run};

/// Probe shared between the sampler and on-demand snapshots
pub type SharedProbe = Arc<Mutex<Box<dyn SystemProbe>>>;

/// Take one sample and append it to the history
///
/// Runs the probe and the file write on the blocking pool.
pub async fn sample_once(
    probe: SharedProbe,
    history: Arc<HistoryStore>,
) -> MetricsResult<DataPoint> {
    tokio::task::spawn_blocking(move || -> MetricsResult<DataPoint> {
        let info = probe.lock().snapshot();
        let point = DataPoint::from_info(current_timestamp(), &info);
        history.append(point)?;
        Ok(point)
    })
    .await?
}

/// Trim expired points as of the current time
pub async fn trim_once(history: Arc<HistoryStore>) -> MetricsResult<usize> {
    tokio::task::spawn_blocking(move || history.trim_expired(current_timestamp())).await?
}

/// Sample every `period` until shutdown
///
/// The first sample is taken one full period after start.
pub async fn run_sampler(
    probe: SharedProbe,
    history: Arc<HistoryStore>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    // interval() panics on a zero period
    let period = period.max(Duration::from_millis(1));
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::info!(interval_secs = period.as_secs(), "metrics sampler started");

    loop {
        if *shutdown.borrow() {
            break;
        }

        tokio::select! {
            _ = ticker.tick() => {
                match sample_once(Arc::clone(&probe), Arc::clone(&history)).await {
                    Ok(point) => tracing::debug!(
                        cpu = point.cpu,
                        memory = point.memory,
                        disk = point.disk,
                        "metrics sampled"
                    ),
                    Err(e) => tracing::warn!(error = %e, "metrics sample failed"),
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    tracing::info!("metrics sampler stopped");
}

/// Trim once now, then daily at `hour`:00 local time until shutdown
pub async fn run_retention(
    history: Arc<HistoryStore>,
    hour: u32,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        if *shutdown.borrow() {
            break;
        }

        if let Err(e) = trim_once(Arc::clone(&history)).await {
            tracing::warn!(error = %e, "metrics retention trim failed");
        }

        let now = Local::now();
        let next = next_daily_run(now, hour);
        let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
        tracing::debug!(next_run = %next, "next metrics retention trim scheduled");

        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    tracing::info!("metrics retention task stopped");
}
