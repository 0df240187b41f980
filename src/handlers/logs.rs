//! Violation log handlers

use axum::{
    extract::{State, Query},
    http::header,
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::{AppState, AppResult, AppError};
use crate::logic::logs::{self, LogFilter, LogView};

/// Filtered log table
pub async fn list(
    State(state): State<AppState>,
    Query(filter): Query<LogFilter>,
) -> AppResult<Json<LogView>> {
    filter.validate()?;
    Ok(Json(logs::log_view(&state.dashboard.records(), &filter)))
}

/// Download the filtered log as CSV
pub async fn export(
    State(state): State<AppState>,
    Query(filter): Query<LogFilter>,
) -> AppResult<impl IntoResponse> {
    filter.validate()?;

    let records = logs::filter(&state.dashboard.records(), &filter);
    let body = logs::export_csv(&records)
        .map_err(|e| AppError::InternalError(format!("CSV export failed: {}", e)))?;

    let filename = logs::export_filename(chrono::Utc::now().date_naive());
    tracing::info!("Exporting {} detections to {}", records.len(), filename);

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", filename)),
        ],
        body,
    ))
}
