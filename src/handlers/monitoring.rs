//! Monitoring lifecycle handlers

use axum::{extract::State, Json};
use serde::Serialize;

use crate::{AppState, AppResult, AppError};
use crate::dashboard::{ApplyOutcome, MonitoringStatus};

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub changed: bool,
    pub message: &'static str,
    pub status: MonitoringStatus,
}

#[derive(Debug, Serialize)]
pub struct RetryResponse {
    pub outcome: &'static str,
    pub added: usize,
    pub status: MonitoringStatus,
}

/// Current monitoring status
pub async fn status(State(state): State<AppState>) -> Json<MonitoringStatus> {
    Json(state.dashboard.status())
}

/// Start monitoring
pub async fn start(State(state): State<AppState>) -> Json<ToggleResponse> {
    let changed = state.dashboard.start();

    Json(ToggleResponse {
        changed,
        message: if changed {
            "Detection system is now active"
        } else {
            "Monitoring already active"
        },
        status: state.dashboard.status(),
    })
}

/// Stop monitoring
pub async fn stop(State(state): State<AppState>) -> Json<ToggleResponse> {
    let changed = state.dashboard.stop();

    Json(ToggleResponse {
        changed,
        message: if changed {
            "Detection system has been paused"
        } else {
            "Monitoring already stopped"
        },
        status: state.dashboard.status(),
    })
}

/// Poll again right now (the "Retry" button when offline)
pub async fn retry(State(state): State<AppState>) -> AppResult<Json<RetryResponse>> {
    let outcome = state.dashboard
        .retry()
        .await
        .ok_or_else(|| AppError::Conflict("Monitoring is not active".to_string()))?;

    let (outcome, added) = match outcome {
        ApplyOutcome::Applied { added } => ("applied", added),
        ApplyOutcome::Failed => ("failed", 0),
        ApplyOutcome::Discarded => ("discarded", 0),
    };

    Ok(Json(RetryResponse {
        outcome,
        added,
        status: state.dashboard.status(),
    }))
}
