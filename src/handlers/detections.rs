//! Detection list handlers

use axum::{extract::{State, Path}, Json};

use crate::{AppState, AppResult, AppError};
use crate::models::DetectionRecord;

/// List all detections, newest first
pub async fn list(State(state): State<AppState>) -> Json<Vec<DetectionRecord>> {
    Json(state.dashboard.records())
}

/// Get single detection
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<DetectionRecord>> {
    let record = state.dashboard
        .records()
        .into_iter()
        .find(|r| r.id == id)
        .ok_or_else(|| AppError::NotFound("Detection not found".to_string()))?;

    Ok(Json(record))
}
