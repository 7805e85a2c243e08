//! Host metrics endpoints

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use super::ApiError;
use crate::api::state::AppState;
use crate::metrics::clamp_hours;
use crate::types::{DataPoint, SystemInfo};

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub hours: Option<String>,
}

impl HistoryQuery {
    /// Requested window; missing or unparsable means 1, then clamped
    pub fn hours(&self) -> i64 {
        let hours = self
            .hours
            .as_deref()
            .and_then(|h| h.trim().parse().ok())
            .unwrap_or(1);
        clamp_hours(hours)
    }
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub data: Vec<DataPoint>,
    pub hours: i64,
}

/// GET /api/system/info
pub async fn system_info(State(state): State<Arc<AppState>>) -> Result<Json<SystemInfo>, ApiError> {
    let monitor = Arc::clone(&state.monitor);

    tokio::task::spawn_blocking(move || monitor.sample())
        .await
        .map(Json)
        .map_err(|e| {
            tracing::error!(error = %e, "system snapshot task failed");
            ApiError::internal(format!("system snapshot failed: {}", e))
        })
}

/// GET /api/system/history
pub async fn system_history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> Json<HistoryResponse> {
    let hours = query.hours();

    Json(HistoryResponse {
        data: state.monitor.history(hours),
        hours,
    })
}
