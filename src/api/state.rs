//! Shared application state

use std::sync::Arc;

use super::rest::{ApiError, ClientInfo};
use crate::audit::AuditLog;
use crate::metrics::SystemMonitor;

/// State handed to every handler
pub struct AppState {
    pub audit: Arc<AuditLog>,
    pub monitor: Arc<SystemMonitor>,
}

impl AppState {
    pub fn new(audit: Arc<AuditLog>, monitor: Arc<SystemMonitor>) -> Self {
        Self { audit, monitor }
    }

    /// Record an ACCESS entry; a failed write is only traced
    pub fn record_access(&self, client: &ClientInfo, action: &str, details: &str) {
        if let Err(e) = self
            .audit
            .log_access(&client.ip, &client.user_agent, action, details)
        {
            tracing::warn!(error = %e, action, "failed to record access entry");
        }
    }

    /// Record a SYSTEM entry; a failed write is only traced
    pub fn record_system(&self, client: &ClientInfo, action: &str, details: &str) {
        if let Err(e) = self
            .audit
            .log_system_operation(&client.ip, &client.user_agent, action, details)
        {
            tracing::warn!(error = %e, action, "failed to record system entry");
        }
    }

    /// Record an ERROR entry for a failed request and build its response
    pub fn fail(&self, client: &ClientInfo, action: &str, error: &str) -> ApiError {
        let message = format!("{}: {}", action, error);
        tracing::error!(action, error, "request failed");

        if let Err(e) = self
            .audit
            .log_error(&client.ip, &client.user_agent, action, &message)
        {
            tracing::warn!(error = %e, action, "failed to record error entry");
        }

        ApiError::internal(message)
    }
}
