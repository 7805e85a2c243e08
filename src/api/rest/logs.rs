//! Audit log endpoints

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};

use super::{run_blocking, ApiError, ApiResponse, ClientInfo};
use crate::api::state::AppState;
use crate::audit::DEFAULT_RETENTION_DAYS;
use crate::types::{LogQueryParams, LogQueryResult, LogStats};

/// Accepted `start_date` / `end_date` format, local time
pub const QUERY_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Raw query string for `GET /api/log/list`
///
/// Everything arrives as text so that a malformed value degrades to its
/// default instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct ListLogsQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub level: Option<String>,
    #[serde(rename = "type")]
    pub log_type: Option<String>,
    pub ip: Option<String>,
    pub action: Option<String>,
    pub file: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

impl ListLogsQuery {
    pub fn into_params(self) -> LogQueryParams {
        LogQueryParams {
            start_date: self.start_date.as_deref().and_then(parse_local_datetime),
            end_date: self.end_date.as_deref().and_then(parse_local_datetime),
            level: self.level.unwrap_or_default(),
            log_type: self.log_type.unwrap_or_default(),
            ip: self.ip.unwrap_or_default(),
            action: self.action.unwrap_or_default(),
            file: self.file.unwrap_or_default(),
            page: parse_int(self.page.as_deref()).unwrap_or(0),
            page_size: parse_int(self.page_size.as_deref()).unwrap_or(0),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ClearLogsQuery {
    pub days: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ClearLogsData {
    pub deleted_count: u64,
}

/// Parse `YYYY-MM-DDTHH:MM:SS` as local wall time
pub fn parse_local_datetime(value: &str) -> Option<DateTime<Local>> {
    let naive = NaiveDateTime::parse_from_str(value.trim(), QUERY_DATE_FORMAT).ok()?;
    Local.from_local_datetime(&naive).earliest()
}

fn parse_int(value: Option<&str>) -> Option<i64> {
    value.and_then(|v| v.trim().parse().ok())
}

/// GET /api/log/list
pub async fn list_logs(
    State(state): State<Arc<AppState>>,
    client: ClientInfo,
    Query(query): Query<ListLogsQuery>,
) -> Result<Json<ApiResponse<LogQueryResult>>, ApiError> {
    state.record_access(&client, "query logs", "list audit log entries");

    let params = query.into_params();
    let audit = Arc::clone(&state.audit);

    run_blocking(move || audit.query(&params))
        .await
        .map(|result| Json(ApiResponse::ok(result)))
        .map_err(|e| state.fail(&client, "query logs failed", &e))
}

/// GET /api/log/stats
pub async fn log_stats(
    State(state): State<Arc<AppState>>,
    client: ClientInfo,
) -> Result<Json<ApiResponse<LogStats>>, ApiError> {
    state.record_access(&client, "log stats", "read audit log statistics");

    let audit = Arc::clone(&state.audit);

    run_blocking(move || audit.stats())
        .await
        .map(|stats| Json(ApiResponse::ok(stats)))
        .map_err(|e| state.fail(&client, "log stats failed", &e))
}

/// DELETE /api/log/clear
pub async fn clear_logs(
    State(state): State<Arc<AppState>>,
    client: ClientInfo,
    Query(query): Query<ClearLogsQuery>,
) -> Result<Json<ApiResponse<ClearLogsData>>, ApiError> {
    state.record_access(&client, "clear old logs", "delete expired day files");

    let days = parse_int(query.days.as_deref()).unwrap_or(DEFAULT_RETENTION_DAYS);
    let audit = Arc::clone(&state.audit);

    let deleted_count = run_blocking(move || audit.sweep(days))
        .await
        .map_err(|e| state.fail(&client, "clear old logs failed", &e))?;

    let message = format!("deleted {} old log files", deleted_count);
    state.record_system(&client, "clear old logs", &message);

    Ok(Json(ApiResponse::with_message(
        ClearLogsData { deleted_count },
        message,
    )))
}
